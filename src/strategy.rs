//! Conversion strategy identifiers.
//!
//! A [`Strategy`] names one kernel implementation. Each source format
//! declares the strategies it supports; the command line addresses them by
//! their index in that per-format list.

use std::fmt;
use std::str::FromStr;

use crate::cpu::{features, CpuFeatures, Isa};
use crate::format::SourceFormat;

/// Kernel implementation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Reference kernel without vector instructions
    Scalar,
    /// Per-lane extraction inside vector registers
    Naive,
    /// Extract fields, narrow to 16 bits, then reorder
    Pack,
    /// Extract fields and reorder straight from 32-bit lanes
    NoPack,
    /// Byte shuffle plus multiply and mask
    Shuffle,
    /// Shuffle plus multiply on 256-bit registers with cross-lane permutes
    Permute,
    /// Pack on 256-bit registers
    PackAvx2,
}

const V210_STRATEGIES: &[Strategy] = &[
    Strategy::Scalar,
    Strategy::Naive,
    Strategy::Pack,
    Strategy::NoPack,
    Strategy::Shuffle,
    Strategy::Permute,
    Strategy::PackAvx2,
];

const SHUFFLE_STRATEGIES: &[Strategy] = &[Strategy::Scalar, Strategy::Shuffle];

/// Fastest first.
const PREFERENCE: &[Strategy] = &[
    Strategy::PackAvx2,
    Strategy::Permute,
    Strategy::Pack,
    Strategy::Shuffle,
    Strategy::NoPack,
    Strategy::Naive,
    Strategy::Scalar,
];

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Scalar => "scalar",
            Strategy::Naive => "naive",
            Strategy::Pack => "pack",
            Strategy::NoPack => "nopack",
            Strategy::Shuffle => "shuffle",
            Strategy::Permute => "permute",
            Strategy::PackAvx2 => "pack-avx2",
        }
    }

    /// Instruction set the kernel is compiled for.
    pub fn required_isa(&self) -> Isa {
        match self {
            Strategy::Scalar => Isa::Portable,
            Strategy::Naive | Strategy::Pack => Isa::Sse41,
            Strategy::NoPack | Strategy::Shuffle => Isa::Ssse3,
            Strategy::Permute | Strategy::PackAvx2 => Isa::Avx2,
        }
    }

    /// Strategies implemented for `format`, in command line index order.
    pub fn for_format(format: SourceFormat) -> &'static [Strategy] {
        match format {
            SourceFormat::V210 => V210_STRATEGIES,
            _ => SHUFFLE_STRATEGIES,
        }
    }

    /// Resolves a per-format strategy index.
    pub fn from_index(format: SourceFormat, index: usize) -> Option<Strategy> {
        Self::for_format(format).get(index).copied()
    }

    /// Index of this strategy in `format`'s list.
    pub fn index_for(&self, format: SourceFormat) -> Option<usize> {
        Self::for_format(format).iter().position(|s| s == self)
    }

    /// Whether `format` implements this strategy.
    pub fn is_available_for(&self, format: SourceFormat) -> bool {
        self.index_for(format).is_some()
    }

    /// Fastest strategy for `format` that `cpu` can run.
    pub fn preferred_with(format: SourceFormat, cpu: CpuFeatures) -> Strategy {
        PREFERENCE
            .iter()
            .copied()
            .find(|s| s.is_available_for(format) && cpu.supports(s.required_isa()))
            .unwrap_or(Strategy::Scalar)
    }

    /// Fastest strategy for `format` on the running CPU.
    pub fn preferred(format: SourceFormat) -> Strategy {
        Self::preferred_with(format, features())
    }

    /// Parses a per-format index, a strategy name or `auto`.
    pub fn parse_for(format: SourceFormat, s: &str) -> Result<Strategy, String> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::preferred(format));
        }
        if let Ok(index) = s.parse::<usize>() {
            return Self::from_index(format, index).ok_or_else(|| {
                format!(
                    "mode {index} out of range for {format} (0..{})",
                    Self::for_format(format).len()
                )
            });
        }
        let strategy: Strategy = s.parse()?;
        if !strategy.is_available_for(format) {
            return Err(format!("strategy {strategy} is not implemented for {format}"));
        }
        Ok(strategy)
    }

    pub fn all() -> &'static [Strategy] {
        V210_STRATEGIES
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Strategy::all()
            .iter()
            .copied()
            .find(|st| st.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown strategy '{}'", s.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_format_indices() {
        assert_eq!(Strategy::from_index(SourceFormat::V210, 0), Some(Strategy::Scalar));
        assert_eq!(Strategy::from_index(SourceFormat::V210, 4), Some(Strategy::Shuffle));
        assert_eq!(Strategy::from_index(SourceFormat::Rgb10Be, 1), Some(Strategy::Shuffle));
        assert_eq!(Strategy::from_index(SourceFormat::Rgb10Be, 2), None);
        assert_eq!(Strategy::Shuffle.index_for(SourceFormat::Uyvy), Some(1));
    }

    #[test]
    fn test_parse_for() {
        assert_eq!(Strategy::parse_for(SourceFormat::V210, "pack"), Ok(Strategy::Pack));
        assert_eq!(Strategy::parse_for(SourceFormat::V210, "6"), Ok(Strategy::PackAvx2));
        assert!(Strategy::parse_for(SourceFormat::Uyvy, "pack").is_err());
        assert!(Strategy::parse_for(SourceFormat::Uyvy, "7").is_err());
        assert!(Strategy::parse_for(SourceFormat::Uyvy, "fastest").is_err());
    }

    #[test]
    fn test_preferred_without_vector_units() {
        let none = CpuFeatures::default();
        for format in SourceFormat::all() {
            assert_eq!(Strategy::preferred_with(*format, none), Strategy::Scalar);
        }
    }

    #[test]
    fn test_preferred_with_ssse3_only() {
        let cpu = CpuFeatures {
            ssse3: true,
            sse41: false,
            avx2: false,
        };
        assert_eq!(Strategy::preferred_with(SourceFormat::V210, cpu), Strategy::Shuffle);
        assert_eq!(Strategy::preferred_with(SourceFormat::Uyvy16, cpu), Strategy::Shuffle);
    }

    #[test]
    fn test_preferred_with_avx2() {
        let cpu = CpuFeatures {
            ssse3: true,
            sse41: true,
            avx2: true,
        };
        assert_eq!(Strategy::preferred_with(SourceFormat::V210, cpu), Strategy::PackAvx2);
        assert_eq!(Strategy::preferred_with(SourceFormat::Rgb10Le, cpu), Strategy::Shuffle);
    }

    #[test]
    fn test_required_isa() {
        assert_eq!(Strategy::Scalar.required_isa(), Isa::Portable);
        assert_eq!(Strategy::Naive.required_isa(), Isa::Sse41);
        assert_eq!(Strategy::Permute.required_isa(), Isa::Avx2);
    }
}
