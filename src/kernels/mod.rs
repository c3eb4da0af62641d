//! Row kernels and the registry that binds them to formats and strategies.
//!
//! A row kernel decodes one source row into one row of each destination
//! plane. Vector kernels process whole batches straight from the caller's
//! slices and route the trailing partial batch of every row through a
//! [`TailScratch`], copying back only the bytes the true width implies.

use crate::format::SourceFormat;
use crate::strategy::Strategy;

/// Bytes of source one vector batch can consume at most.
pub const TAIL_SOURCE_BYTES: usize = 64;
/// Bytes one vector batch writes to a single plane at most.
pub const TAIL_PLANE_BYTES: usize = 48;

/// Fixed-size staging area for a row's final partial batch.
///
/// The source tail is copied in and zero-extended; the batch runs entirely
/// inside the scratch; only the genuine bytes are copied out.
pub struct TailScratch {
    pub src: [u8; TAIL_SOURCE_BYTES],
    pub planes: [[u8; TAIL_PLANE_BYTES]; 3],
}

impl Default for TailScratch {
    fn default() -> Self {
        Self {
            src: [0; TAIL_SOURCE_BYTES],
            planes: [[0; TAIL_PLANE_BYTES]; 3],
        }
    }
}

impl TailScratch {
    /// Copies up to [`TAIL_SOURCE_BYTES`] of `tail` into the source area.
    pub fn load(&mut self, tail: &[u8]) {
        let n = tail.len().min(TAIL_SOURCE_BYTES);
        self.src[..n].copy_from_slice(&tail[..n]);
    }

    /// Copies the first `dst.len()` bytes of `plane` out.
    pub fn flush(&self, plane: usize, dst: &mut [u8]) {
        let n = dst.len();
        dst.copy_from_slice(&self.planes[plane][..n]);
    }
}

/// Generates a row function around a batch function.
///
/// The batch function takes a source pointer and one destination pointer per
/// plane and must read `source` bytes and write the listed bytes per plane.
#[allow(unused_macros)]
macro_rules! row_kernel {
    (
        $(#[$attr:meta])*
        $name:ident => $batch:ident,
        pixels: $px:literal,
        source: $sb:literal,
        planes: [$($plane:ident @ $slot:literal : $pb:literal),+ $(,)?]
    ) => {
        $(#[$attr])*
        pub(crate) unsafe fn $name(src: &[u8], $($plane: &mut [u8],)+ width: usize) {
            let full = width / $px;
            for i in 0..full {
                let source = &src[i * $sb..(i + 1) * $sb];
                $batch(
                    source.as_ptr(),
                    $($plane[i * $pb..(i + 1) * $pb].as_mut_ptr(),)+
                );
            }
            if full * $px < width {
                let mut scratch = $crate::kernels::TailScratch::default();
                scratch.load(&src[full * $sb..]);
                $batch(
                    scratch.src.as_ptr(),
                    $(scratch.planes[$slot].as_mut_ptr(),)+
                );
                $(scratch.flush($slot, &mut $plane[full * $pb..]);)+
            }
        }
    };
}

pub mod scalar;

#[cfg(target_arch = "x86_64")]
pub(crate) mod packed_simd;
#[cfg(target_arch = "x86_64")]
pub(crate) mod v210_avx2;
#[cfg(target_arch = "x86_64")]
pub(crate) mod v210_sse;

/// Luma plus interleaved chroma row function.
pub type LumaChromaFn = unsafe fn(&[u8], &mut [u8], &mut [u8], usize);
/// Luma plus separate U and V row function.
pub type ThreePlaneFn = unsafe fn(&[u8], &mut [u8], &mut [u8], &mut [u8], usize);
/// Single interleaved plane row function.
pub type InterleavedFn = unsafe fn(&[u8], &mut [u8], usize);

/// A row function, tagged by destination plane shape.
///
/// # Safety
///
/// Calling the wrapped function requires the CPU to support the instruction
/// set of the strategy it was looked up for. Slice lengths are bounds
/// checked: the source row must hold the format's minimum row bytes and each
/// destination row exactly the plane's `row_bytes`.
#[derive(Clone, Copy)]
pub enum RowKernel {
    LumaChroma(LumaChromaFn),
    ThreePlane(ThreePlaneFn),
    Interleaved(InterleavedFn),
}

impl RowKernel {
    /// Number of destination planes the kernel writes.
    pub fn plane_count(&self) -> usize {
        match self {
            RowKernel::LumaChroma(_) => 2,
            RowKernel::ThreePlane(_) => 3,
            RowKernel::Interleaved(_) => 1,
        }
    }

    /// Decodes one row. Returns false if `planes` has the wrong plane count.
    ///
    /// # Safety
    ///
    /// The CPU must support the instruction set the kernel was built for.
    pub unsafe fn run(&self, src: &[u8], planes: &mut [&mut [u8]], width: usize) -> bool {
        match (self, planes) {
            (RowKernel::LumaChroma(row), [y, uv]) => row(src, y, uv, width),
            (RowKernel::ThreePlane(row), [y, u, v]) => row(src, y, u, v, width),
            (RowKernel::Interleaved(row), [rgb]) => row(src, rgb, width),
            _ => return false,
        }
        true
    }
}

impl std::fmt::Debug for RowKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shape = match self {
            RowKernel::LumaChroma(_) => "LumaChroma",
            RowKernel::ThreePlane(_) => "ThreePlane",
            RowKernel::Interleaved(_) => "Interleaved",
        };
        f.write_str(shape)
    }
}

/// Finds the row kernel for `format` under `strategy`.
///
/// Returns `None` when the pair has no implementation compiled for this
/// target. CPU support is not checked here.
pub fn lookup(format: SourceFormat, strategy: Strategy) -> Option<RowKernel> {
    use RowKernel::{Interleaved, LumaChroma, ThreePlane};
    use SourceFormat::*;

    let kernel = match (format, strategy) {
        (V210, Strategy::Scalar) => LumaChroma(scalar::v210_row),
        (Rgb10Be, Strategy::Scalar) => Interleaved(scalar::r10b_row),
        (Rgb10Le, Strategy::Scalar) => Interleaved(scalar::r10l_row),
        (Uyvy, Strategy::Scalar) => ThreePlane(scalar::uyvy_row),
        (Vyuy, Strategy::Scalar) => ThreePlane(scalar::vyuy_row),
        (Uyvy16, Strategy::Scalar) => LumaChroma(scalar::uyvy16_row),

        #[cfg(target_arch = "x86_64")]
        (V210, Strategy::Naive) => LumaChroma(v210_sse::naive_row),
        #[cfg(target_arch = "x86_64")]
        (V210, Strategy::Pack) => LumaChroma(v210_sse::pack_row),
        #[cfg(target_arch = "x86_64")]
        (V210, Strategy::NoPack) => LumaChroma(v210_sse::nopack_row),
        #[cfg(target_arch = "x86_64")]
        (V210, Strategy::Shuffle) => LumaChroma(v210_sse::shuffle_row),
        #[cfg(target_arch = "x86_64")]
        (V210, Strategy::Permute) => LumaChroma(v210_avx2::permute_row),
        #[cfg(target_arch = "x86_64")]
        (V210, Strategy::PackAvx2) => LumaChroma(v210_avx2::pack_row),
        #[cfg(target_arch = "x86_64")]
        (Rgb10Be, Strategy::Shuffle) => Interleaved(packed_simd::r10b_row),
        #[cfg(target_arch = "x86_64")]
        (Rgb10Le, Strategy::Shuffle) => Interleaved(packed_simd::r10l_row),
        #[cfg(target_arch = "x86_64")]
        (Uyvy, Strategy::Shuffle) => ThreePlane(packed_simd::uyvy_row),
        #[cfg(target_arch = "x86_64")]
        (Vyuy, Strategy::Shuffle) => ThreePlane(packed_simd::vyuy_row),
        #[cfg(target_arch = "x86_64")]
        (Uyvy16, Strategy::Shuffle) => LumaChroma(packed_simd::uyvy16_row),

        _ => return None,
    };
    Some(kernel)
}

/// Builds a 16-byte `pshufb` control gathering eight 16-bit values.
///
/// Entry `k` is the byte offset of the low byte of output word `k`, or -1
/// to zero the word.
#[allow(dead_code)]
pub(crate) const fn gather_words(starts: [i8; 8]) -> [i8; 16] {
    let mut mask = [-1i8; 16];
    let mut k = 0;
    while k < 8 {
        if starts[k] >= 0 {
            mask[2 * k] = starts[k];
            mask[2 * k + 1] = starts[k] + 1;
        }
        k += 1;
    }
    mask
}

#[cfg(test)]
pub(crate) mod testing {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::cpu::features;
    use crate::geometry::{min_row_bytes, plane_layout, PlaneLayout};

    const CANARY: usize = 16;

    fn run(kernel: RowKernel, src: &[u8], bufs: &mut [Vec<u8>], layout: &PlaneLayout, width: usize) {
        let mut rows: Vec<&mut [u8]> = bufs
            .iter_mut()
            .zip(layout.planes())
            .map(|(buf, plane)| &mut buf[..plane.row_bytes])
            .collect();
        assert!(unsafe { kernel.run(src, &mut rows, width) });
    }

    /// Compares one random row against the scalar kernel, canaries included.
    ///
    /// Silently passes when the CPU lacks the strategy's instruction set.
    pub fn assert_row_matches_scalar(format: SourceFormat, strategy: Strategy, width: usize) {
        if !features().supports(strategy.required_isa()) {
            return;
        }
        let kernel = lookup(format, strategy).expect("kernel registered");
        let reference = lookup(format, Strategy::Scalar).expect("scalar registered");

        let mut rng = StdRng::seed_from_u64(width as u64 ^ 0x5eed);
        let mut src = vec![0u8; min_row_bytes(format, width)];
        rng.fill(&mut src[..]);

        let layout = plane_layout(format.planar(), width, 1, 0).unwrap();
        let mut expected: Vec<Vec<u8>> = layout
            .planes()
            .iter()
            .map(|p| vec![0xEE; p.row_bytes + CANARY])
            .collect();
        let mut actual = expected.clone();

        run(reference, &src, &mut expected, &layout, width);
        run(kernel, &src, &mut actual, &layout, width);
        assert_eq!(actual, expected, "{format} {strategy} width {width}");
    }
}
