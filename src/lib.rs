//! Packed Transcode Library
//!
//! Decodes packed broadcast video frames (v210, 10-bit RGB, 8- and 16-bit
//! UYVY/VYUY) into planar layouts with scalar reference kernels and
//! SSE/AVX2 accelerated variants chosen at runtime.

pub mod adapter;
pub mod bench;
pub mod cli;
pub mod cpu;
pub mod error;
pub mod format;
pub mod frame;
pub mod geometry;
pub mod kernels;
pub mod settings;
pub mod strategy;
pub mod synth;
pub mod telemetry;

pub use adapter::{convert, convert_into, converter_for, preferred_converter, FormatAdapter, PackedFrameConverter};
pub use bench::{BenchError, BenchOptions, BenchmarkSpec, BenchmarkSummary};
pub use cpu::{CpuFeatures, Isa};
pub use error::{ConvertError, Result};
pub use format::{ConversionPair, PlanarFormat, SourceFormat};
pub use frame::{DestinationBuffer, FrameAccess, FrameBuffers, FrameSource, MemoryFrame, PackedFrame, PlaneSet};
pub use geometry::{Capacity, PlaneKind, PlaneLayout};
pub use settings::{BenchSettings, SettingsError};
pub use strategy::Strategy;
pub use synth::Pattern;
