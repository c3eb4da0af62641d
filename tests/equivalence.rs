//! Every accelerated strategy must produce the scalar kernel's bytes exactly.

use packed_transcode::adapter::{converter_for, PackedFrameConverter};
use packed_transcode::format::{ConversionPair, SourceFormat};
use packed_transcode::frame::{
    FrameAccess, FrameBuffers, FrameDescriptor, MemoryFrame, PackedFrame, PlaneSet,
};
use packed_transcode::geometry::{min_row_bytes, plane_layout, source_stride};
use packed_transcode::synth::{expected_sample, synthesize, Pattern};
use packed_transcode::{ConvertError, FormatAdapter, Strategy};
use proptest::prelude::*;

const SENTINEL: u8 = 0xA5;
const CANARY: u8 = 0xEE;
const CANARY_BYTES: usize = 64;

/// Converters for every strategy of `format` the running CPU can execute.
fn runnable(format: SourceFormat) -> Vec<FormatAdapter> {
    Strategy::for_format(format)
        .iter()
        .filter_map(|&strategy| match converter_for(ConversionPair::native(format), strategy) {
            Ok(converter) => Some(converter),
            Err(ConvertError::CpuUnsupported { .. }) => None,
            Err(e) => panic!("{format} {strategy}: {e}"),
        })
        .collect()
}

fn convert_padded(
    converter: &FormatAdapter,
    frame: &PackedFrame<'_>,
    pad: usize,
) -> FrameBuffers {
    let mut buffers =
        FrameBuffers::new(converter.pair().destination(), frame.width(), frame.height(), pad).unwrap();
    buffers.fill(SENTINEL);
    let mut planes = buffers.planes().unwrap();
    converter.convert(frame, &mut planes, pad).unwrap();
    buffers
}

fn assert_padding_untouched(buffers: &FrameBuffers) {
    for (index, plane) in buffers.layout().planes().iter().enumerate() {
        for row in buffers.plane(index).chunks(plane.stride) {
            assert!(
                row[plane.row_bytes..].iter().all(|&b| b == SENTINEL),
                "padding of plane {} written",
                plane.kind.name()
            );
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(96))]

    #[test]
    fn accelerated_strategies_match_scalar(
        format_index in 0usize..6,
        width in 1usize..200,
        height in 1usize..4,
        pad in 0usize..9,
        seed in any::<u64>(),
    ) {
        let format = SourceFormat::all()[format_index];
        let data = synthesize(format, width, height, Pattern::Random(seed)).unwrap();
        let frame = PackedFrame::new(&data, format, width, height).unwrap();

        let scalar = converter_for(ConversionPair::native(format), Strategy::Scalar).unwrap();
        let expected = convert_padded(&scalar, &frame, pad);
        assert_padding_untouched(&expected);

        for converter in runnable(format) {
            let actual = convert_padded(&converter, &frame, pad);
            for index in 0..expected.layout().planes().len() {
                prop_assert_eq!(
                    actual.plane(index),
                    expected.plane(index),
                    "{} {} plane {}",
                    format,
                    converter.strategy(),
                    index
                );
            }
        }
    }
}

/// Widths one pixel group short of a whole aligned row, plus a few odd ones.
fn partial_batch_widths(format: SourceFormat) -> Vec<usize> {
    let aligned = format.row_alignment() / format.group_bytes() * format.group_pixels();
    let short = |units: usize| units * aligned - format.group_pixels();
    let mut widths = vec![1, 2, 5, 7, short(1), short(2), short(5), 1914, 1919];
    widths.retain(|&w| w > 0);
    widths.sort_unstable();
    widths.dedup();
    widths
}

#[test]
fn partial_batch_widths_are_one_group_short() {
    assert!(partial_batch_widths(SourceFormat::V210).contains(&42));
    assert!(partial_batch_widths(SourceFormat::Rgb10Be).contains(&60));
    assert!(partial_batch_widths(SourceFormat::Rgb10Le).contains(&60));
    assert!(partial_batch_widths(SourceFormat::Uyvy).contains(&6));
    assert!(partial_batch_widths(SourceFormat::Vyuy).contains(&6));
    assert!(partial_batch_widths(SourceFormat::Uyvy16).contains(&14));
}

#[test]
fn canaries_survive_partial_batches() {
    for &format in SourceFormat::all() {
        for width in partial_batch_widths(format) {
            let data = synthesize(format, width, 2, Pattern::Random(width as u64)).unwrap();
            let frame = PackedFrame::new(&data, format, width, 2).unwrap();
            let layout = plane_layout(format.planar(), width, 2, 0).unwrap();

            for converter in runnable(format) {
                let mut bufs: Vec<Vec<u8>> = layout
                    .planes()
                    .iter()
                    .map(|p| vec![CANARY; p.size() + CANARY_BYTES])
                    .collect();
                let sizes: Vec<usize> = layout.sizes().collect();
                {
                    let mut planes = PlaneSet::from_slices(
                        bufs.iter_mut().zip(&sizes).map(|(buf, &size)| &mut buf[..size]),
                    )
                    .unwrap();
                    converter.convert(&frame, &mut planes, 0).unwrap();
                }
                for (buf, &size) in bufs.iter().zip(&sizes) {
                    assert!(
                        buf[size..].iter().all(|&b| b == CANARY),
                        "{format} {} width {width} wrote past its plane",
                        converter.strategy()
                    );
                }
            }
        }
    }
}

/// Re-lays an aligned frame at `stride`, filling each row's extra tail with junk.
fn restride(format: SourceFormat, width: usize, height: usize, data: &[u8], stride: usize) -> Vec<u8> {
    let aligned = source_stride(format, width).unwrap();
    let row_bytes = min_row_bytes(format, width);
    let mut wide = vec![0u8; stride * height];
    for (dst, src) in wide.chunks_mut(stride).zip(data.chunks(aligned)) {
        dst[..row_bytes].copy_from_slice(&src[..row_bytes]);
        dst[row_bytes..].fill(0xC3);
    }
    wide
}

#[test]
fn wider_source_stride_converts_like_aligned() {
    let cases = [
        (SourceFormat::V210, 42),
        (SourceFormat::V210, 1920),
        (SourceFormat::Rgb10Be, 60),
        (SourceFormat::Rgb10Le, 70),
        (SourceFormat::Uyvy, 33),
        (SourceFormat::Uyvy16, 14),
    ];
    for (format, width) in cases {
        let height = 3;
        let data = synthesize(format, width, height, Pattern::Random(width as u64)).unwrap();
        let frame = PackedFrame::new(&data, format, width, height).unwrap();
        let stride = frame.stride() + format.row_alignment();
        let descriptor = FrameDescriptor {
            format,
            width,
            height,
            stride: Some(stride),
        };
        let mut source =
            MemoryFrame::from_bytes(restride(format, width, height, &data, stride), descriptor);

        for converter in runnable(format) {
            let expected = convert_padded(&converter, &frame, 0);
            let access = FrameAccess::begin(&mut source).unwrap();
            let wide = access.frame().unwrap();
            assert_eq!(wide.stride(), stride);
            let actual = convert_padded(&converter, &wide, 0);
            for index in 0..expected.layout().planes().len() {
                assert_eq!(
                    actual.plane(index),
                    expected.plane(index),
                    "{format} {} width {width} plane {index}",
                    converter.strategy()
                );
            }
        }
    }
}

#[test]
fn full_scale_samples() {
    let formats = [
        SourceFormat::V210,
        SourceFormat::Rgb10Be,
        SourceFormat::Rgb10Le,
        SourceFormat::Uyvy16,
    ];
    for format in formats {
        for value in [0u16, 1, 0x155, 0x200, 0x3FF] {
            let (width, height) = (70, 2);
            let data = synthesize(format, width, height, Pattern::Constant(value)).unwrap();
            let frame = PackedFrame::new(&data, format, width, height).unwrap();
            let layout = plane_layout(format.planar(), width, height, 0).unwrap();
            let want = expected_sample(format, value);

            for converter in runnable(format) {
                let mut planes16: Vec<Vec<u16>> =
                    layout.sizes().map(|size| vec![0xDEAD; size / 2]).collect();
                {
                    let mut planes = PlaneSet::from_slices(
                        planes16
                            .iter_mut()
                            .map(|p| bytemuck::cast_slice_mut::<u16, u8>(&mut p[..])),
                    )
                    .unwrap();
                    converter.convert(&frame, &mut planes, 0).unwrap();
                }
                for plane in &planes16 {
                    assert!(
                        plane.iter().all(|&s| s == u16::from_le(want)),
                        "{format} {} value {value:#x}",
                        converter.strategy()
                    );
                }
            }
        }
    }
}

#[test]
fn ten_bit_maximum_becomes_ffc0() {
    assert_eq!(expected_sample(SourceFormat::V210, 0x3FF), 0xFFC0);
    let data = synthesize(SourceFormat::V210, 48, 1, Pattern::Constant(0x3FF)).unwrap();
    let frame = PackedFrame::new(&data, SourceFormat::V210, 48, 1).unwrap();
    for converter in runnable(SourceFormat::V210) {
        let buffers = convert_padded(&converter, &frame, 0);
        for index in 0..2 {
            assert!(buffers
                .plane(index)
                .chunks_exact(2)
                .all(|s| s == [0xC0, 0xFF]));
        }
    }
}

#[test]
fn padded_rows_land_at_stride_offsets() {
    let (width, height, pad) = (10, 3, 6);
    let data = synthesize(SourceFormat::Uyvy, width, height, Pattern::Constant(0x80)).unwrap();
    let frame = PackedFrame::new(&data, SourceFormat::Uyvy, width, height).unwrap();

    for converter in runnable(SourceFormat::Uyvy) {
        let buffers = convert_padded(&converter, &frame, pad);
        let luma = buffers.plane(0);
        assert_eq!(luma.len(), (width + pad) * height);
        for row in luma.chunks(width + pad) {
            assert!(row[..width].iter().all(|&b| b == 0x80));
            assert!(row[width..].iter().all(|&b| b == SENTINEL));
        }
        let chroma_stride = (width + pad).div_ceil(2);
        for index in 1..3 {
            for row in buffers.plane(index).chunks(chroma_stride) {
                assert!(row[..width / 2].iter().all(|&b| b == 0x80));
                assert!(row[width / 2..].iter().all(|&b| b == SENTINEL));
            }
        }
        assert_padding_untouched(&buffers);
    }
}
