//! Per-format adapters binding a conversion pair to a row kernel.
//!
//! The adapter validates the destination against the geometry for the
//! requested padding before touching anything, then walks the frame row by
//! row, handing each kernel a destination row cut to its genuine samples so
//! padding bytes are never written.

use tracing::debug;

use crate::cpu::features;
use crate::error::{ConvertError, Result};
use crate::format::{ConversionPair, SourceFormat};
use crate::frame::{DestinationBuffer, PackedFrame, PlaneSet};
use crate::geometry::{self, Capacity, MAX_PLANES};
use crate::kernels::{self, RowKernel};
use crate::strategy::Strategy;

/// Decodes packed frames of one conversion pair with one strategy.
pub trait PackedFrameConverter {
    fn pair(&self) -> ConversionPair;

    fn strategy(&self) -> Strategy;

    /// Converts `frame` into `planes`, leaving `pixels_to_pad` untouched
    /// pixels at the end of every destination row.
    ///
    /// Nothing is written unless every plane is large enough.
    fn convert(
        &self,
        frame: &PackedFrame<'_>,
        planes: &mut PlaneSet<'_>,
        pixels_to_pad: usize,
    ) -> Result<()>;
}

/// Kernel-backed converter produced by [`converter_for`].
#[derive(Debug, Clone, Copy)]
pub struct FormatAdapter {
    pair: ConversionPair,
    strategy: Strategy,
    kernel: RowKernel,
}

/// Looks up the converter for `pair` using `strategy`.
///
/// Fails when the format does not implement the strategy or when the CPU
/// lacks the instruction set it needs.
pub fn converter_for(pair: ConversionPair, strategy: Strategy) -> Result<FormatAdapter> {
    let format = pair.source();
    if !strategy.is_available_for(format) {
        return Err(ConvertError::UnsupportedStrategy { format, strategy });
    }
    let isa = strategy.required_isa();
    if !features().supports(isa) {
        return Err(ConvertError::CpuUnsupported { strategy, isa });
    }
    let kernel = kernels::lookup(format, strategy)
        .ok_or(ConvertError::UnsupportedStrategy { format, strategy })?;
    debug!(pair = %pair, strategy = %strategy, "Converter selected");
    Ok(FormatAdapter {
        pair,
        strategy,
        kernel,
    })
}

/// The fastest converter the running CPU supports for `source`.
pub fn preferred_converter(source: SourceFormat) -> Result<FormatAdapter> {
    converter_for(ConversionPair::native(source), Strategy::preferred(source))
}

impl PackedFrameConverter for FormatAdapter {
    fn pair(&self) -> ConversionPair {
        self.pair
    }

    fn strategy(&self) -> Strategy {
        self.strategy
    }

    fn convert(
        &self,
        frame: &PackedFrame<'_>,
        planes: &mut PlaneSet<'_>,
        pixels_to_pad: usize,
    ) -> Result<()> {
        if frame.format() != self.pair.source() {
            return Err(ConvertError::FormatMismatch {
                expected: self.pair.source(),
                actual: frame.format(),
            });
        }
        let width = frame.width();
        let layout = geometry::plane_layout(
            self.pair.destination(),
            width,
            frame.height(),
            pixels_to_pad,
        )?;
        let geometry = layout.planes();
        if planes.len() != geometry.len() {
            return Err(ConvertError::PlaneCount {
                expected: geometry.len(),
                actual: planes.len(),
            });
        }
        for (actual, plane) in planes.sizes().zip(geometry) {
            if actual < plane.size() {
                return Err(ConvertError::BufferTooSmall {
                    plane: plane.kind.name(),
                    required: plane.size(),
                    actual,
                });
            }
        }

        let targets = planes.as_mut_slice();
        for (r, src) in frame.rows().enumerate() {
            let mut rows: [&mut [u8]; MAX_PLANES] = [&mut [], &mut [], &mut []];
            for ((row, target), plane) in rows.iter_mut().zip(targets.iter_mut()).zip(geometry) {
                let start = r * plane.stride;
                *row = &mut target[start..start + plane.row_bytes];
            }
            // SAFETY: converter_for only hands out kernels whose instruction
            // set runtime detection reported.
            let written = unsafe { self.kernel.run(src, &mut rows[..geometry.len()], width) };
            if !written {
                return Err(ConvertError::PlaneCount {
                    expected: self.kernel.plane_count(),
                    actual: geometry.len(),
                });
            }
        }
        Ok(())
    }
}

/// One-shot conversion of `frame` into `planes` with `strategy`.
pub fn convert(
    strategy: Strategy,
    frame: &PackedFrame<'_>,
    planes: &mut PlaneSet<'_>,
    pixels_to_pad: usize,
) -> Result<()> {
    converter_for(ConversionPair::native(frame.format()), strategy)?.convert(
        frame,
        planes,
        pixels_to_pad,
    )
}

/// Converts into a provider's buffer, negotiating padding from its capacity.
///
/// Returns how the capacity was interpreted.
pub fn convert_into(
    converter: &dyn PackedFrameConverter,
    frame: &PackedFrame<'_>,
    destination: &mut dyn DestinationBuffer,
) -> Result<Capacity> {
    let planar = converter.pair().destination();
    let capacity = geometry::check_capacity(
        planar,
        frame.width(),
        frame.height(),
        destination.capacity(),
        destination.declared_row_width(),
    )?;
    let layout = geometry::plane_layout(planar, frame.width(), frame.height(), capacity.pad())?;
    let mut planes = PlaneSet::split(destination.bytes_mut(), &layout)?;
    converter.convert(frame, &mut planes, capacity.pad())?;
    Ok(capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::PlanarFormat;
    use crate::frame::FrameBuffers;

    fn v210_frame(width: usize, height: usize) -> Vec<u8> {
        let stride = geometry::source_stride(SourceFormat::V210, width).unwrap();
        let word = (0x100u32 | (0x200 << 10) | (0x300 << 20)).to_le_bytes();
        let mut data = vec![0u8; stride * height];
        for row in data.chunks_mut(stride) {
            for w in row.chunks_exact_mut(4) {
                w.copy_from_slice(&word);
            }
        }
        data
    }

    #[test]
    fn test_converter_for_rejects_unknown_strategy() {
        let pair = ConversionPair::native(SourceFormat::Uyvy);
        assert!(matches!(
            converter_for(pair, Strategy::Pack),
            Err(ConvertError::UnsupportedStrategy { .. })
        ));
    }

    #[test]
    fn test_scalar_always_available() {
        for format in SourceFormat::all() {
            let converter = converter_for(ConversionPair::native(*format), Strategy::Scalar).unwrap();
            assert_eq!(converter.strategy(), Strategy::Scalar);
        }
    }

    #[test]
    fn test_preferred_converter_runs() {
        for format in SourceFormat::all() {
            assert!(preferred_converter(*format).is_ok());
        }
    }

    #[test]
    fn test_format_mismatch() {
        let data = vec![0u8; 16 * 2];
        let frame = PackedFrame::new(&data, SourceFormat::Uyvy, 2, 2).unwrap();
        let converter = converter_for(ConversionPair::native(SourceFormat::Vyuy), Strategy::Scalar).unwrap();
        let mut buffers = FrameBuffers::new(PlanarFormat::I422, 2, 2, 0).unwrap();
        let mut planes = buffers.planes().unwrap();
        assert!(matches!(
            converter.convert(&frame, &mut planes, 0),
            Err(ConvertError::FormatMismatch { .. })
        ));
    }

    #[test]
    fn test_too_small_plane_is_untouched() {
        let data = v210_frame(12, 2);
        let frame = PackedFrame::new(&data, SourceFormat::V210, 12, 2).unwrap();
        let mut y = vec![0xAAu8; 48];
        let mut uv = vec![0xAAu8; 47];
        let mut planes = PlaneSet::from_slices([&mut y[..], &mut uv[..]]).unwrap();
        let err = convert(Strategy::Scalar, &frame, &mut planes, 0).unwrap_err();
        assert_eq!(
            err,
            ConvertError::BufferTooSmall {
                plane: "uv",
                required: 48,
                actual: 47
            }
        );
        assert!(y.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_wrong_plane_count() {
        let data = v210_frame(6, 1);
        let frame = PackedFrame::new(&data, SourceFormat::V210, 6, 1).unwrap();
        let mut y = vec![0u8; 12];
        let mut planes = PlaneSet::from_slices([&mut y[..]]).unwrap();
        assert!(matches!(
            convert(Strategy::Scalar, &frame, &mut planes, 0),
            Err(ConvertError::PlaneCount { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_convert_into_negotiates_padding() {
        let data = v210_frame(6, 2);
        let frame = PackedFrame::new(&data, SourceFormat::V210, 6, 2).unwrap();
        let converter = converter_for(ConversionPair::native(SourceFormat::V210), Strategy::Scalar).unwrap();

        let mut exact = vec![0u8; 2 * 12 * 2];
        assert_eq!(convert_into(&converter, &frame, &mut exact).unwrap(), Capacity::Exact);

        let mut padded = FrameBuffers::new(PlanarFormat::P210, 6, 2, 2).unwrap();
        padded.fill(0xEE);
        assert_eq!(
            convert_into(&converter, &frame, &mut padded).unwrap(),
            Capacity::PaddingPossible { pad: 2 }
        );
        let y = padded.plane(0);
        assert_eq!(&y[0..2], &(0x200u16 << 6).to_le_bytes());
        assert!(y[12..16].iter().all(|&b| b == 0xEE));

        let mut short = vec![0u8; 10];
        assert!(matches!(
            convert_into(&converter, &frame, &mut short),
            Err(ConvertError::BufferTooSmall { .. })
        ));
    }
}
