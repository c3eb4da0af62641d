//! Synthetic packed frames for tests, benchmarks and the `generate` command.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::format::SourceFormat;
use crate::geometry;

/// Content of generated frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Every sample slot holds this value, truncated to the format's depth
    Constant(u16),
    /// Seeded random bytes, row padding included
    Random(u64),
}

/// Produces successive frames of one geometry.
pub struct Synthesizer {
    format: SourceFormat,
    width: usize,
    height: usize,
    stride: usize,
    pattern: Pattern,
    rng: StdRng,
}

impl Synthesizer {
    pub fn new(format: SourceFormat, width: usize, height: usize, pattern: Pattern) -> Result<Self> {
        let stride = geometry::source_stride(format, width)?;
        geometry::source_frame_size(format, width, height)?;
        let seed = match pattern {
            Pattern::Random(seed) => seed,
            Pattern::Constant(_) => 0,
        };
        Ok(Self {
            format,
            width,
            height,
            stride,
            pattern,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn frame_size(&self) -> usize {
        self.stride * self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Generates the next frame. Random patterns advance between frames.
    pub fn next_frame(&mut self) -> Vec<u8> {
        let mut frame = vec![0u8; self.frame_size()];
        match self.pattern {
            Pattern::Random(_) => self.rng.fill(&mut frame[..]),
            Pattern::Constant(value) => {
                let unit = constant_unit(self.format, value);
                let row_bytes = geometry::min_row_bytes(self.format, self.width);
                for row in frame.chunks_mut(self.stride) {
                    for slot in row[..row_bytes].chunks_exact_mut(unit.len()) {
                        slot.copy_from_slice(&unit);
                    }
                }
            }
        }
        frame
    }
}

/// Smallest repeating byte pattern with `value` in every sample slot.
fn constant_unit(format: SourceFormat, value: u16) -> Vec<u8> {
    let ten = u32::from(value & 0x3FF);
    match format {
        SourceFormat::V210 => (ten | (ten << 10) | (ten << 20)).to_le_bytes().to_vec(),
        SourceFormat::Rgb10Le => ((ten << 22) | (ten << 12) | (ten << 2)).to_le_bytes().to_vec(),
        SourceFormat::Rgb10Be => ((ten << 22) | (ten << 12) | (ten << 2)).to_be_bytes().to_vec(),
        SourceFormat::Uyvy | SourceFormat::Vyuy => vec![value as u8],
        SourceFormat::Uyvy16 => value.to_le_bytes().to_vec(),
    }
}

/// The destination sample a constant frame of `value` decodes to.
pub fn expected_sample(format: SourceFormat, value: u16) -> u16 {
    match format {
        SourceFormat::V210 | SourceFormat::Rgb10Be | SourceFormat::Rgb10Le => (value & 0x3FF) << 6,
        SourceFormat::Uyvy | SourceFormat::Vyuy => value & 0xFF,
        SourceFormat::Uyvy16 => value,
    }
}

/// One frame of `pattern` at the format's aligned stride.
pub fn synthesize(
    format: SourceFormat,
    width: usize,
    height: usize,
    pattern: Pattern,
) -> Result<Vec<u8>> {
    Ok(Synthesizer::new(format, width, height, pattern)?.next_frame())
}
