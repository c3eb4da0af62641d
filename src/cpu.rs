//! Runtime CPU capability detection.
//!
//! Detection runs once per process; every later query reads the cached
//! result. On targets other than x86_64 every vector feature reports absent
//! and only the scalar kernels are selectable.

use std::fmt;
use std::sync::OnceLock;

/// Instruction set a kernel requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Isa {
    /// Plain Rust, always available
    Portable,
    Ssse3,
    Sse41,
    Avx2,
}

impl Isa {
    pub fn name(&self) -> &'static str {
        match self {
            Isa::Portable => "portable",
            Isa::Ssse3 => "SSSE3",
            Isa::Sse41 => "SSE4.1",
            Isa::Avx2 => "AVX2",
        }
    }
}

impl fmt::Display for Isa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Vector extensions detected on this machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuFeatures {
    pub ssse3: bool,
    pub sse41: bool,
    pub avx2: bool,
}

impl CpuFeatures {
    /// Detects the running CPU's features.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            Self {
                ssse3: is_x86_feature_detected!("ssse3"),
                sse41: is_x86_feature_detected!("sse4.1"),
                avx2: is_x86_feature_detected!("avx2"),
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        {
            Self::default()
        }
    }

    /// Whether kernels built for `isa` can run here.
    pub fn supports(&self, isa: Isa) -> bool {
        match isa {
            Isa::Portable => true,
            Isa::Ssse3 => self.ssse3,
            Isa::Sse41 => self.sse41 && self.ssse3,
            Isa::Avx2 => self.avx2,
        }
    }
}

static FEATURES: OnceLock<CpuFeatures> = OnceLock::new();

/// Cached capabilities of the running CPU.
pub fn features() -> CpuFeatures {
    *FEATURES.get_or_init(|| {
        let detected = CpuFeatures::detect();
        tracing::debug!(
            ssse3 = detected.ssse3,
            sse41 = detected.sse41,
            avx2 = detected.avx2,
            "CPU features detected"
        );
        detected
    })
}
