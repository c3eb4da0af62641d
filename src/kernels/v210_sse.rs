//! 128-bit v210 kernels.
//!
//! Every batch consumes four pixel groups (24 pixels, 64 source bytes) and
//! writes 48 bytes to each of the luma and chroma planes. Each group yields
//! six luma and six chroma words in the low 12 bytes of a register;
//! [`store_four_groups`] stitches four of those into three full registers.

use std::arch::x86_64::*;

use super::gather_words;
use super::scalar::{v210_field, V210_CHROMA, V210_LUMA};

/// Loads a 16-byte shuffle or multiplier table.
#[inline(always)]
pub(super) unsafe fn table<T>(values: &[T]) -> __m128i {
    debug_assert_eq!(std::mem::size_of_val(values), 16);
    _mm_loadu_si128(values.as_ptr().cast())
}

/// Splits a group into its three 10-bit field vectors, scaled into bits 15..6.
///
/// Lane `i` of field `f` holds field `f` of word `i`.
#[inline(always)]
unsafe fn fields(v: __m128i) -> [__m128i; 3] {
    let mask = _mm_set1_epi32(0xFFC0);
    [
        _mm_and_si128(_mm_slli_epi32::<6>(v), mask),
        _mm_and_si128(_mm_srli_epi32::<4>(v), mask),
        _mm_and_si128(_mm_srli_epi32::<14>(v), mask),
    ]
}

/// Writes four 12-byte group results as 48 contiguous bytes.
///
/// The top four bytes of every input register must be zero.
#[inline(always)]
unsafe fn store_four_groups(dst: *mut u8, g: [__m128i; 4]) {
    let out0 = _mm_or_si128(g[0], _mm_slli_si128::<12>(g[1]));
    let out1 = _mm_or_si128(_mm_srli_si128::<4>(g[1]), _mm_slli_si128::<8>(g[2]));
    let out2 = _mm_or_si128(_mm_srli_si128::<8>(g[2]), _mm_slli_si128::<4>(g[3]));
    _mm_storeu_si128(dst.cast(), out0);
    _mm_storeu_si128(dst.add(16).cast(), out1);
    _mm_storeu_si128(dst.add(32).cast(), out2);
}

macro_rules! four_group_batch {
    ($(#[$attr:meta])* $name:ident => $group:ident) => {
        $(#[$attr])*
        #[inline]
        unsafe fn $name(src: *const u8, y: *mut u8, uv: *mut u8) {
            let mut luma = [_mm_setzero_si128(); 4];
            let mut chroma = [_mm_setzero_si128(); 4];
            for g in 0..4 {
                let (l, c) = $group(_mm_loadu_si128(src.add(16 * g).cast()));
                luma[g] = l;
                chroma[g] = c;
            }
            store_four_groups(y, luma);
            store_four_groups(uv, chroma);
        }
    };
}

// naive: pull each word into a general register and rebuild.

#[target_feature(enable = "sse4.1")]
#[inline]
unsafe fn naive_group(v: __m128i) -> (__m128i, __m128i) {
    let words = [
        _mm_extract_epi32::<0>(v) as u32,
        _mm_extract_epi32::<1>(v) as u32,
        _mm_extract_epi32::<2>(v) as u32,
        _mm_extract_epi32::<3>(v) as u32,
    ];
    let y = V210_LUMA.map(|(word, field)| v210_field(words[word], field) as i16);
    let c = V210_CHROMA.map(|(word, field)| v210_field(words[word], field) as i16);
    (
        _mm_setr_epi16(y[0], y[1], y[2], y[3], y[4], y[5], 0, 0),
        _mm_setr_epi16(c[0], c[1], c[2], c[3], c[4], c[5], 0, 0),
    )
}

four_group_batch!(#[target_feature(enable = "sse4.1")] naive_batch => naive_group);

row_kernel! {
    #[target_feature(enable = "sse4.1")]
    naive_row => naive_batch,
    pixels: 24,
    source: 64,
    planes: [y @ 0: 48, uv @ 1: 48]
}

// pack: after packus the words are f0.0-3 in 0-3 and f1.0-3 in 4-7 of one
// register, f2.0-3 in 0-3 of the other.

pub(super) const PACK_Y_LOW: [i8; 16] = gather_words([8, 2, -1, 12, 6, -1, -1, -1]);
pub(super) const PACK_Y_HIGH: [i8; 16] = gather_words([-1, -1, 2, -1, -1, 6, -1, -1]);
pub(super) const PACK_C_LOW: [i8; 16] = gather_words([0, -1, 10, 4, -1, 14, -1, -1]);
pub(super) const PACK_C_HIGH: [i8; 16] = gather_words([-1, 0, -1, -1, 4, -1, -1, -1]);

#[target_feature(enable = "ssse3,sse4.1")]
#[inline]
unsafe fn pack_group(v: __m128i) -> (__m128i, __m128i) {
    let [f0, f1, f2] = fields(v);
    let p01 = _mm_packus_epi32(f0, f1);
    let p22 = _mm_packus_epi32(f2, f2);
    let y = _mm_or_si128(
        _mm_shuffle_epi8(p01, table(&PACK_Y_LOW)),
        _mm_shuffle_epi8(p22, table(&PACK_Y_HIGH)),
    );
    let c = _mm_or_si128(
        _mm_shuffle_epi8(p01, table(&PACK_C_LOW)),
        _mm_shuffle_epi8(p22, table(&PACK_C_HIGH)),
    );
    (y, c)
}

four_group_batch!(#[target_feature(enable = "ssse3,sse4.1")] pack_batch => pack_group);

row_kernel! {
    #[target_feature(enable = "ssse3,sse4.1")]
    pack_row => pack_batch,
    pixels: 24,
    source: 64,
    planes: [y @ 0: 48, uv @ 1: 48]
}

// nopack: gather the low half of each 32-bit lane directly.

const NOPACK_Y_F0: [i8; 16] = gather_words([-1, 4, -1, -1, 12, -1, -1, -1]);
const NOPACK_Y_F1: [i8; 16] = gather_words([0, -1, -1, 8, -1, -1, -1, -1]);
const NOPACK_Y_F2: [i8; 16] = gather_words([-1, -1, 4, -1, -1, 12, -1, -1]);
const NOPACK_C_F0: [i8; 16] = gather_words([0, -1, -1, 8, -1, -1, -1, -1]);
const NOPACK_C_F1: [i8; 16] = gather_words([-1, -1, 4, -1, -1, 12, -1, -1]);
const NOPACK_C_F2: [i8; 16] = gather_words([-1, 0, -1, -1, 8, -1, -1, -1]);

#[target_feature(enable = "ssse3")]
#[inline]
unsafe fn nopack_group(v: __m128i) -> (__m128i, __m128i) {
    let [f0, f1, f2] = fields(v);
    let y = _mm_or_si128(
        _mm_or_si128(
            _mm_shuffle_epi8(f0, table(&NOPACK_Y_F0)),
            _mm_shuffle_epi8(f1, table(&NOPACK_Y_F1)),
        ),
        _mm_shuffle_epi8(f2, table(&NOPACK_Y_F2)),
    );
    let c = _mm_or_si128(
        _mm_or_si128(
            _mm_shuffle_epi8(f0, table(&NOPACK_C_F0)),
            _mm_shuffle_epi8(f1, table(&NOPACK_C_F1)),
        ),
        _mm_shuffle_epi8(f2, table(&NOPACK_C_F2)),
    );
    (y, c)
}

four_group_batch!(#[target_feature(enable = "ssse3")] nopack_batch => nopack_group);

row_kernel! {
    #[target_feature(enable = "ssse3")]
    nopack_row => nopack_batch,
    pixels: 24,
    source: 64,
    planes: [y @ 0: 48, uv @ 1: 48]
}

// shuffle: move the two bytes holding each field into a 16-bit lane, then
// multiply so the field lands in bits 15..6. Fields at bit 0, 2 and 4 of
// their byte pair need x64, x16 and x4.

pub(super) const SHUFFLE_Y: [i8; 16] = gather_words([1, 4, 6, 9, 12, 14, -1, -1]);
pub(super) const SHUFFLE_Y_SCALE: [i16; 8] = [16, 64, 4, 16, 64, 4, 0, 0];
pub(super) const SHUFFLE_C: [i8; 16] = gather_words([0, 2, 5, 8, 10, 13, -1, -1]);
pub(super) const SHUFFLE_C_SCALE: [i16; 8] = [64, 4, 16, 64, 4, 16, 0, 0];

/// Mask keeping bits 15..6 of every 16-bit lane.
pub(super) const TOP_TEN_BITS: i16 = 0xFFC0u16 as i16;

#[target_feature(enable = "ssse3")]
#[inline]
unsafe fn shuffle_group(v: __m128i) -> (__m128i, __m128i) {
    let keep = _mm_set1_epi16(TOP_TEN_BITS);
    let y = _mm_mullo_epi16(_mm_shuffle_epi8(v, table(&SHUFFLE_Y)), table(&SHUFFLE_Y_SCALE));
    let c = _mm_mullo_epi16(_mm_shuffle_epi8(v, table(&SHUFFLE_C)), table(&SHUFFLE_C_SCALE));
    (_mm_and_si128(y, keep), _mm_and_si128(c, keep))
}

four_group_batch!(#[target_feature(enable = "ssse3")] shuffle_batch => shuffle_group);

row_kernel! {
    #[target_feature(enable = "ssse3")]
    shuffle_row => shuffle_batch,
    pixels: 24,
    source: 64,
    planes: [y @ 0: 48, uv @ 1: 48]
}
