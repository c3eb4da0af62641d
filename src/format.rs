//! Source and destination pixel format definitions.
//!
//! A [`SourceFormat`] names a packed capture layout; a [`PlanarFormat`] names
//! the planar or semi-planar layout a consumer expects. Each source format
//! converts to exactly one destination format, see [`ConversionPair`].

use std::fmt;
use std::str::FromStr;

use crate::error::{ConvertError, Result};

/// Packed pixel formats emitted by capture hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// 10-bit RGB, three fields per big-endian 32-bit word
    Rgb10Be,
    /// 10-bit 4:2:2, six pixels per 16-byte group
    V210,
    /// 8-bit 4:2:2 in U Y V Y order
    Uyvy,
    /// 16-bit 4:2:2 in U Y V Y order, little-endian samples
    Uyvy16,
    /// 10-bit RGB, three fields per little-endian 32-bit word
    Rgb10Le,
    /// 8-bit 4:2:2 in V Y U Y order
    Vyuy,
}

impl SourceFormat {
    /// Short name, also used as the benchmark file extension.
    pub fn name(&self) -> &'static str {
        match self {
            SourceFormat::Rgb10Be => "r10b",
            SourceFormat::V210 => "v210",
            SourceFormat::Uyvy => "uyvy",
            SourceFormat::Uyvy16 => "uyvy16",
            SourceFormat::Rgb10Le => "r10l",
            SourceFormat::Vyuy => "vyuy",
        }
    }

    /// Returns a human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            SourceFormat::Rgb10Be => "10-bit RGB (big-endian)",
            SourceFormat::V210 => "10-bit 4:2:2 (v210)",
            SourceFormat::Uyvy => "8-bit 4:2:2 (UYVY)",
            SourceFormat::Uyvy16 => "16-bit 4:2:2 (UYVY)",
            SourceFormat::Rgb10Le => "10-bit RGB (little-endian)",
            SourceFormat::Vyuy => "8-bit 4:2:2 (VYUY)",
        }
    }

    /// Numeric id used by the benchmark command line.
    pub fn id(&self) -> u32 {
        match self {
            SourceFormat::Rgb10Be => 0,
            SourceFormat::V210 => 1,
            SourceFormat::Uyvy => 2,
            SourceFormat::Uyvy16 => 3,
            SourceFormat::Rgb10Le => 4,
            SourceFormat::Vyuy => 5,
        }
    }

    /// Looks up a format by its command line id.
    pub fn from_id(id: u32) -> Option<SourceFormat> {
        Self::all().iter().copied().find(|f| f.id() == id)
    }

    /// Pixels encoded by one packing unit.
    pub fn group_pixels(&self) -> usize {
        match self {
            SourceFormat::V210 => 6,
            SourceFormat::Rgb10Be | SourceFormat::Rgb10Le => 4,
            SourceFormat::Uyvy | SourceFormat::Vyuy | SourceFormat::Uyvy16 => 2,
        }
    }

    /// Bytes occupied by one packing unit.
    pub fn group_bytes(&self) -> usize {
        match self {
            SourceFormat::V210 | SourceFormat::Rgb10Be | SourceFormat::Rgb10Le => 16,
            SourceFormat::Uyvy | SourceFormat::Vyuy => 4,
            SourceFormat::Uyvy16 => 8,
        }
    }

    /// Row byte alignment required by the capture hardware.
    pub fn row_alignment(&self) -> usize {
        match self {
            SourceFormat::V210 => 128,
            SourceFormat::Rgb10Be | SourceFormat::Rgb10Le => 256,
            SourceFormat::Uyvy | SourceFormat::Vyuy => 16,
            SourceFormat::Uyvy16 => 64,
        }
    }

    /// The planar layout this format decodes into.
    pub fn planar(&self) -> PlanarFormat {
        match self {
            SourceFormat::V210 => PlanarFormat::P210,
            SourceFormat::Rgb10Be | SourceFormat::Rgb10Le => PlanarFormat::Rgb48,
            SourceFormat::Uyvy | SourceFormat::Vyuy => PlanarFormat::I422,
            SourceFormat::Uyvy16 => PlanarFormat::P216,
        }
    }

    /// All source formats, in id order.
    pub fn all() -> &'static [SourceFormat] {
        &[
            SourceFormat::Rgb10Be,
            SourceFormat::V210,
            SourceFormat::Uyvy,
            SourceFormat::Uyvy16,
            SourceFormat::Rgb10Le,
            SourceFormat::Vyuy,
        ]
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceFormat {
    type Err = String;

    /// Accepts either the numeric id or the short name.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<u32>() {
            return SourceFormat::from_id(id).ok_or_else(|| format!("unknown format id {id}"));
        }
        SourceFormat::all()
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown format '{s}'"))
    }
}

/// Planar and semi-planar destination layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanarFormat {
    /// 16-bit luma plane plus interleaved 16-bit UV plane at half width
    P210,
    /// Single plane of interleaved 16-bit R, G, B
    Rgb48,
    /// 8-bit luma plane plus separate half-width U and V planes
    I422,
    /// 16-bit luma plane plus interleaved 16-bit UV plane, straight copy
    P216,
}

impl PlanarFormat {
    /// Short name.
    pub fn name(&self) -> &'static str {
        match self {
            PlanarFormat::P210 => "p210",
            PlanarFormat::Rgb48 => "rgb48",
            PlanarFormat::I422 => "i422",
            PlanarFormat::P216 => "p216",
        }
    }

    /// Number of destination planes.
    pub fn plane_count(&self) -> usize {
        match self {
            PlanarFormat::P210 | PlanarFormat::P216 => 2,
            PlanarFormat::Rgb48 => 1,
            PlanarFormat::I422 => 3,
        }
    }

    /// Bytes per stored sample.
    pub fn sample_bytes(&self) -> usize {
        match self {
            PlanarFormat::I422 => 1,
            _ => 2,
        }
    }

    /// All destination formats.
    pub fn all() -> &'static [PlanarFormat] {
        &[
            PlanarFormat::P210,
            PlanarFormat::Rgb48,
            PlanarFormat::I422,
            PlanarFormat::P216,
        ]
    }
}

impl fmt::Display for PlanarFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resolved (source, destination) pair handed over by format negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConversionPair {
    source: SourceFormat,
    destination: PlanarFormat,
}

impl ConversionPair {
    /// Validates that `source` decodes into `destination`.
    pub fn new(source: SourceFormat, destination: PlanarFormat) -> Result<Self> {
        if source.planar() != destination {
            return Err(ConvertError::UnsupportedPair {
                source_format: source,
                destination,
            });
        }
        Ok(Self {
            source,
            destination,
        })
    }

    /// The pair for a source format's native destination.
    pub fn native(source: SourceFormat) -> Self {
        Self {
            source,
            destination: source.planar(),
        }
    }

    pub fn source(&self) -> SourceFormat {
        self.source
    }

    pub fn destination(&self) -> PlanarFormat {
        self.destination
    }
}

impl fmt::Display for ConversionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}
