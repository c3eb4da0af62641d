//! Error types for the conversion core.

use thiserror::Error;

use crate::cpu::Isa;
use crate::format::{PlanarFormat, SourceFormat};
use crate::strategy::Strategy;

/// Errors raised by geometry, adapters and frame views.
///
/// Every variant is reported before any destination byte is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("invalid dimensions {width}x{height}: width and height must be positive")]
    InvalidDimensions { width: i64, height: i64 },

    #[error("destination {plane} plane holds {actual} bytes, {required} required")]
    BufferTooSmall {
        plane: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("source frame holds {actual} bytes, {required} required")]
    SourceTooSmall { required: usize, actual: usize },

    #[error("{format} row stride {stride} is below the {minimum} byte minimum")]
    StrideTooSmall {
        format: SourceFormat,
        stride: usize,
        minimum: usize,
    },

    #[error("{format} row stride {stride} is not a multiple of {alignment} bytes")]
    StrideMisaligned {
        format: SourceFormat,
        stride: usize,
        alignment: usize,
    },

    #[error("no conversion from {source_format} to {destination}")]
    UnsupportedPair {
        source_format: SourceFormat,
        destination: PlanarFormat,
    },

    #[error("converter expects {expected} frames, got {actual}")]
    FormatMismatch {
        expected: SourceFormat,
        actual: SourceFormat,
    },

    #[error("strategy {strategy} is not available for {format}")]
    UnsupportedStrategy {
        format: SourceFormat,
        strategy: Strategy,
    },

    #[error("strategy {strategy} needs {isa}, which this CPU does not support")]
    CpuUnsupported { strategy: Strategy, isa: Isa },

    #[error("expected {expected} destination planes, got {actual}")]
    PlaneCount { expected: usize, actual: usize },

    #[error("frame source access failed: {0}")]
    SourceAccess(String),
}

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, ConvertError>;
