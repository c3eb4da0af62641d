//! Row stride and plane size arithmetic.
//!
//! Everything here is a pure function of width, height, format and padding.
//! Source strides round the width up to a whole pixel group, convert it to
//! bytes and round that up to the format's row alignment. Destination planes
//! are tightly packed; padding requested by a consumer widens the stride of
//! each plane but never the bytes written per row.

use crate::error::{ConvertError, Result};
use crate::format::{PlanarFormat, SourceFormat};

/// Maximum number of planes any destination layout uses.
pub const MAX_PLANES: usize = 3;

/// Validates signed dimensions coming from a caller and converts them.
///
/// Zero, negative and unrepresentable values are rejected with
/// [`ConvertError::InvalidDimensions`].
pub fn validate_dimensions(width: i64, height: i64) -> Result<(usize, usize)> {
    let invalid = || ConvertError::InvalidDimensions { width, height };
    if width <= 0 || height <= 0 {
        return Err(invalid());
    }
    let w = usize::try_from(width).map_err(|_| invalid())?;
    let h = usize::try_from(height).map_err(|_| invalid())?;
    Ok((w, h))
}

fn check_nonzero(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(invalid(width, height));
    }
    Ok(())
}

pub(crate) fn invalid(width: usize, height: usize) -> ConvertError {
    ConvertError::InvalidDimensions {
        width: i64::try_from(width).unwrap_or(i64::MAX),
        height: i64::try_from(height).unwrap_or(i64::MAX),
    }
}

/// Bytes covering `width` pixels in whole groups, before alignment.
pub fn min_row_bytes(format: SourceFormat, width: usize) -> usize {
    width.div_ceil(format.group_pixels()) * format.group_bytes()
}

/// Required source row stride for `width` pixels of `format`.
pub fn source_stride(format: SourceFormat, width: usize) -> Result<usize> {
    check_nonzero(width, 1)?;
    let groups = width.div_ceil(format.group_pixels());
    let bytes = groups
        .checked_mul(format.group_bytes())
        .ok_or_else(|| invalid(width, 1))?;
    let align = format.row_alignment();
    bytes
        .checked_next_multiple_of(align)
        .ok_or_else(|| invalid(width, 1))
}

/// Bytes of one whole source frame: stride times height.
pub fn source_frame_size(format: SourceFormat, width: usize, height: usize) -> Result<usize> {
    check_nonzero(width, height)?;
    source_stride(format, width)?
        .checked_mul(height)
        .ok_or_else(|| invalid(width, height))
}

/// Role of a destination plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaneKind {
    #[default]
    Luma,
    /// Interleaved U and V
    Chroma,
    U,
    V,
    /// Interleaved R, G and B
    Rgb,
}

impl PlaneKind {
    pub fn name(&self) -> &'static str {
        match self {
            PlaneKind::Luma => "y",
            PlaneKind::Chroma => "uv",
            PlaneKind::U => "u",
            PlaneKind::V => "v",
            PlaneKind::Rgb => "rgb",
        }
    }
}

/// Geometry of one destination plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaneGeometry {
    pub kind: PlaneKind,
    /// Byte distance between row starts, including padding
    pub stride: usize,
    /// Bytes of genuine samples per row
    pub row_bytes: usize,
    pub rows: usize,
}

impl PlaneGeometry {
    /// Total bytes the plane occupies.
    pub fn size(&self) -> usize {
        self.stride * self.rows
    }
}

/// Geometry of every plane of a destination frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneLayout {
    format: PlanarFormat,
    planes: [PlaneGeometry; MAX_PLANES],
    count: usize,
}

impl PlaneLayout {
    pub fn format(&self) -> PlanarFormat {
        self.format
    }

    pub fn planes(&self) -> &[PlaneGeometry] {
        &self.planes[..self.count]
    }

    /// Bytes per plane, in plane order.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.planes().iter().map(PlaneGeometry::size)
    }

    /// Bytes of all planes laid out back to back.
    pub fn total_size(&self) -> usize {
        self.sizes().sum()
    }
}

/// Computes per-plane strides and sizes for `destination`.
///
/// `pad` is the number of extra pixels per row requested by the consumer.
pub fn plane_layout(
    destination: PlanarFormat,
    width: usize,
    height: usize,
    pad: usize,
) -> Result<PlaneLayout> {
    check_nonzero(width, height)?;
    let padded = width.checked_add(pad).ok_or_else(|| invalid(width, height))?;
    // Six bytes per pixel (rgb48) bounds every plane below.
    padded
        .checked_add(1)
        .and_then(|b| b.checked_mul(6))
        .and_then(|b| b.checked_mul(height))
        .ok_or_else(|| invalid(width, height))?;

    let plane = |kind, stride, row_bytes| PlaneGeometry {
        kind,
        stride,
        row_bytes,
        rows: height,
    };

    let mut planes = [PlaneGeometry::default(); MAX_PLANES];
    let count = match destination {
        PlanarFormat::P210 | PlanarFormat::P216 => {
            planes[0] = plane(PlaneKind::Luma, 2 * padded, 2 * width);
            planes[1] = plane(
                PlaneKind::Chroma,
                4 * padded.div_ceil(2),
                4 * width.div_ceil(2),
            );
            2
        }
        PlanarFormat::Rgb48 => {
            planes[0] = plane(PlaneKind::Rgb, 6 * padded, 6 * width);
            1
        }
        PlanarFormat::I422 => {
            planes[0] = plane(PlaneKind::Luma, padded, width);
            planes[1] = plane(PlaneKind::U, padded.div_ceil(2), width.div_ceil(2));
            planes[2] = plane(PlaneKind::V, padded.div_ceil(2), width.div_ceil(2));
            3
        }
    };

    Ok(PlaneLayout {
        format: destination,
        planes,
        count,
    })
}

/// Bytes per destination plane without padding.
pub fn plane_sizes(destination: PlanarFormat, width: usize, height: usize) -> Result<Vec<usize>> {
    Ok(plane_layout(destination, width, height, 0)?.sizes().collect())
}

/// Outcome of comparing a provider's capacity against what a frame needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// Capacity matches the tightly packed frame.
    Exact,
    /// Capacity exceeds the frame; rows may carry `pad` extra pixels.
    PaddingPossible { pad: usize },
}

impl Capacity {
    pub fn pad(&self) -> usize {
        match self {
            Capacity::Exact => 0,
            Capacity::PaddingPossible { pad } => *pad,
        }
    }
}

/// Negotiates destination padding against a provider's capacity.
///
/// `declared_row_width` is the row width in pixels the renderer asked for,
/// if it declared one. Without it a larger buffer is accepted with no
/// padding.
pub fn check_capacity(
    destination: PlanarFormat,
    width: usize,
    height: usize,
    capacity: usize,
    declared_row_width: Option<usize>,
) -> Result<Capacity> {
    let required = plane_layout(destination, width, height, 0)?.total_size();
    if capacity < required {
        return Err(ConvertError::BufferTooSmall {
            plane: "frame",
            required,
            actual: capacity,
        });
    }
    let pad = declared_row_width.map_or(0, |row| row.saturating_sub(width));
    if pad > 0 {
        let padded = plane_layout(destination, width, height, pad)?.total_size();
        if capacity < padded {
            return Err(ConvertError::BufferTooSmall {
                plane: "frame",
                required: padded,
                actual: capacity,
            });
        }
    }
    if capacity == required {
        Ok(Capacity::Exact)
    } else {
        Ok(Capacity::PaddingPossible { pad })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v210_strides() {
        assert_eq!(source_stride(SourceFormat::V210, 1280).unwrap(), 3456);
        assert_eq!(source_stride(SourceFormat::V210, 1920).unwrap(), 5120);
        assert_eq!(source_stride(SourceFormat::V210, 3840).unwrap(), 10240);
        assert_eq!(source_stride(SourceFormat::V210, 720).unwrap(), 1920);
        assert_eq!(source_stride(SourceFormat::V210, 1).unwrap(), 128);
    }

    #[test]
    fn test_rgb10_strides() {
        for format in [SourceFormat::Rgb10Be, SourceFormat::Rgb10Le] {
            assert_eq!(source_stride(format, 1280).unwrap(), 5120);
            assert_eq!(source_stride(format, 1920).unwrap(), 7680);
            assert_eq!(source_stride(format, 3840).unwrap(), 15360);
            assert_eq!(source_stride(format, 720).unwrap(), 3072);
            assert_eq!(source_stride(format, 1).unwrap(), 256);
        }
    }

    #[test]
    fn test_422_strides() {
        assert_eq!(source_stride(SourceFormat::Uyvy, 1920).unwrap(), 3840);
        assert_eq!(source_stride(SourceFormat::Vyuy, 3840).unwrap(), 7680);
        assert_eq!(source_stride(SourceFormat::Uyvy, 1).unwrap(), 16);
        assert_eq!(source_stride(SourceFormat::Uyvy16, 1920).unwrap(), 7680);
        assert_eq!(source_stride(SourceFormat::Uyvy16, 3840).unwrap(), 15360);
        assert_eq!(source_stride(SourceFormat::Uyvy16, 1).unwrap(), 64);
    }

    #[test]
    fn test_min_row_bytes() {
        assert_eq!(min_row_bytes(SourceFormat::V210, 1920), 5120);
        assert_eq!(min_row_bytes(SourceFormat::V210, 1280), 3424);
        assert_eq!(min_row_bytes(SourceFormat::Uyvy, 3), 8);
    }

    #[test]
    fn test_frame_size() {
        assert_eq!(
            source_frame_size(SourceFormat::V210, 1920, 1080).unwrap(),
            5120 * 1080
        );
        assert_eq!(
            source_frame_size(SourceFormat::Rgb10Be, 3840, 2160).unwrap(),
            15360 * 2160
        );
    }

    #[test]
    fn test_plane_sizes_1080p() {
        assert_eq!(
            plane_sizes(PlanarFormat::P210, 1920, 1080).unwrap(),
            vec![4_147_200, 4_147_200]
        );
        assert_eq!(
            plane_sizes(PlanarFormat::Rgb48, 1920, 1080).unwrap(),
            vec![12_441_600]
        );
        assert_eq!(
            plane_sizes(PlanarFormat::I422, 1920, 1080).unwrap(),
            vec![2_073_600, 1_036_800, 1_036_800]
        );
        assert_eq!(
            plane_sizes(PlanarFormat::P216, 1920, 1080).unwrap(),
            vec![4_147_200, 4_147_200]
        );
    }

    #[test]
    fn test_plane_sizes_2160p() {
        assert_eq!(
            plane_sizes(PlanarFormat::P210, 3840, 2160).unwrap(),
            vec![16_588_800, 16_588_800]
        );
        assert_eq!(
            plane_sizes(PlanarFormat::I422, 3840, 2160).unwrap(),
            vec![8_294_400, 4_147_200, 4_147_200]
        );
    }

    #[test]
    fn test_odd_width_chroma_rounds_up() {
        let layout = plane_layout(PlanarFormat::P210, 5, 2, 0).unwrap();
        assert_eq!(layout.planes()[0].row_bytes, 10);
        assert_eq!(layout.planes()[1].row_bytes, 12);
        let layout = plane_layout(PlanarFormat::I422, 5, 2, 0).unwrap();
        assert_eq!(layout.planes()[1].row_bytes, 3);
    }

    #[test]
    fn test_padding_widens_stride_only() {
        let layout = plane_layout(PlanarFormat::P210, 1920, 1080, 64).unwrap();
        let y = layout.planes()[0];
        assert_eq!(y.stride, 2 * 1984);
        assert_eq!(y.row_bytes, 2 * 1920);
        assert_eq!(y.kind.name(), "y");
        assert_eq!(layout.planes()[1].kind.name(), "uv");
    }

    #[test]
    fn test_invalid_dimensions() {
        assert!(matches!(
            validate_dimensions(0, 1080),
            Err(ConvertError::InvalidDimensions { width: 0, .. })
        ));
        assert!(validate_dimensions(1920, -1).is_err());
        assert_eq!(validate_dimensions(1920, 1080).unwrap(), (1920, 1080));
        assert!(source_stride(SourceFormat::V210, 0).is_err());
        assert!(plane_layout(PlanarFormat::I422, 16, 0, 0).is_err());
        assert!(source_stride(SourceFormat::Uyvy16, usize::MAX).is_err());
    }

    #[test]
    fn test_capacity_negotiation() {
        let exact = 4_147_200 * 2;
        assert_eq!(
            check_capacity(PlanarFormat::P210, 1920, 1080, exact, None).unwrap(),
            Capacity::Exact
        );
        assert!(matches!(
            check_capacity(PlanarFormat::P210, 1920, 1080, exact - 1, None),
            Err(ConvertError::BufferTooSmall { .. })
        ));
        assert_eq!(
            check_capacity(PlanarFormat::P210, 1920, 1080, exact + 100, None).unwrap(),
            Capacity::PaddingPossible { pad: 0 }
        );
        let padded = plane_layout(PlanarFormat::P210, 1920, 1080, 128)
            .unwrap()
            .total_size();
        assert_eq!(
            check_capacity(PlanarFormat::P210, 1920, 1080, padded, Some(2048)).unwrap(),
            Capacity::PaddingPossible { pad: 128 }
        );
        assert!(check_capacity(PlanarFormat::P210, 1920, 1080, padded - 1, Some(2048)).is_err());
    }
}
