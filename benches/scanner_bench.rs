//! Annex B 扫描与解码泵性能基准测试.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use liu::codec::decoders::LoopbackDecoder;
use liu::codec::render::CollectingRenderTarget;
use liu::codec::{CodecConfig, CodecId, DecoderConfig};
use liu::format::annexb::next_unit;
use liu::format::{AnnexBSource, ByteSource};
use liu::{DecodePump, PumpConfig};

/// 构造 SPS + PPS + 若干切片的码流, 切片负载不含 0x00
fn make_stream(slices: usize, slice_len: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(slices * (slice_len + 5) + 32);
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x01, 0x67, 0x64, 0x00, 0x15]);
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x01, 0x68, 0xEB, 0xE3, 0xCB]);
    for i in 0..slices {
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x01]);
        data.push(if i == 0 { 0x65 } else { 0x41 });
        data.push(0x88);
        data.extend((0..slice_len).map(|j| ((i + j) % 255 + 1) as u8));
    }
    data
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("annexb_scan");
    for &slice_len in &[256usize, 4096, 65536] {
        let data = make_stream(64, slice_len);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(slice_len), &data, |b, data| {
            b.iter(|| {
                let mut src = ByteSource::from_bytes(data.clone());
                let mut units = 0usize;
                while let Some(range) = next_unit(&mut src) {
                    units += black_box(range).length as usize;
                }
                units
            });
        });
    }
    group.finish();
}

fn bench_pump_unpaced(c: &mut Criterion) {
    let data = make_stream(250, 2048);
    let config = DecoderConfig::new(
        CodecId::H264,
        320,
        560,
        CodecConfig::from_hex("00 00 00 01 67 64 00 15", "00 00 00 01 68 EB E3 CB")
            .expect("配置数据应合法"),
    );
    c.bench_function("pump_loopback_250_frames", |b| {
        b.iter(|| {
            let source = AnnexBSource::new(ByteSource::from_bytes(data.clone()));
            let decoder = LoopbackDecoder::new(CollectingRenderTarget::new());
            let mut pump =
                DecodePump::new(source, decoder, PumpConfig::elementary_stream().with_pacing(false));
            black_box(pump.run(&config).expect("解码泵应正常结束"))
        });
    });
}

criterion_group!(benches, bench_scan, bench_pump_unpaced);
criterion_main!(benches);
