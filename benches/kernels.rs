//! Per-frame conversion throughput for every runnable strategy at 1080p.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use packed_transcode::adapter::{converter_for, PackedFrameConverter};
use packed_transcode::format::{ConversionPair, SourceFormat};
use packed_transcode::frame::{FrameBuffers, PackedFrame};
use packed_transcode::synth::{synthesize, Pattern};
use packed_transcode::Strategy;

const WIDTH: usize = 1920;
const HEIGHT: usize = 1080;

fn bench_format(c: &mut Criterion, format: SourceFormat) {
    let data = synthesize(format, WIDTH, HEIGHT, Pattern::Random(1)).unwrap();
    let frame = PackedFrame::new(&data, format, WIDTH, HEIGHT).unwrap();
    let mut buffers = FrameBuffers::new(format.planar(), WIDTH, HEIGHT, 0).unwrap();

    let mut group = c.benchmark_group(format!("{}_1080p", format.name()));
    group.throughput(Throughput::Bytes(data.len() as u64));
    for &strategy in Strategy::for_format(format) {
        let Ok(converter) = converter_for(ConversionPair::native(format), strategy) else {
            continue;
        };
        group.bench_function(BenchmarkId::from_parameter(strategy.name()), |b| {
            b.iter(|| {
                let mut planes = buffers.planes().unwrap();
                converter.convert(&frame, &mut planes, 0).unwrap();
            })
        });
    }
    group.finish();
}

fn conversion_benchmarks(c: &mut Criterion) {
    for &format in SourceFormat::all() {
        bench_format(c, format);
    }
}

criterion_group!(benches, conversion_benchmarks);
criterion_main!(benches);
