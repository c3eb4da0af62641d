//! 256-bit v210 kernels.
//!
//! Each register holds two pixel groups, one per 128-bit lane, so the
//! in-lane shuffle tables of the 128-bit kernels apply unchanged. Two loads
//! make a batch of four groups, compacted with cross-lane permutes.

use std::arch::x86_64::*;

use super::v210_sse::{
    table, PACK_C_HIGH, PACK_C_LOW, PACK_Y_HIGH, PACK_Y_LOW, SHUFFLE_C, SHUFFLE_C_SCALE,
    SHUFFLE_Y, SHUFFLE_Y_SCALE, TOP_TEN_BITS,
};

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn broadcast<T>(values: &[T]) -> __m256i {
    _mm256_broadcastsi128_si256(table(values))
}

/// Writes the 12 live bytes of each 128-bit lane of `a` then `b`: 48 bytes.
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn store_four_groups(dst: *mut u8, a: __m256i, b: __m256i) {
    let a = _mm256_permutevar8x32_epi32(a, _mm256_setr_epi32(0, 1, 2, 4, 5, 6, 7, 7));
    let b_head = _mm256_permutevar8x32_epi32(b, _mm256_setr_epi32(0, 0, 0, 0, 0, 0, 0, 1));
    let b_tail = _mm256_permutevar8x32_epi32(b, _mm256_setr_epi32(2, 4, 5, 6, 0, 0, 0, 0));
    _mm256_storeu_si256(dst.cast(), _mm256_blend_epi32::<0b1100_0000>(a, b_head));
    _mm_storeu_si128(dst.add(32).cast(), _mm256_castsi256_si128(b_tail));
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn pack_pair(v: __m256i) -> (__m256i, __m256i) {
    let mask = _mm256_set1_epi32(0xFFC0);
    let f0 = _mm256_and_si256(_mm256_slli_epi32::<6>(v), mask);
    let f1 = _mm256_and_si256(_mm256_srli_epi32::<4>(v), mask);
    let f2 = _mm256_and_si256(_mm256_srli_epi32::<14>(v), mask);
    let p01 = _mm256_packus_epi32(f0, f1);
    let p22 = _mm256_packus_epi32(f2, f2);
    let y = _mm256_or_si256(
        _mm256_shuffle_epi8(p01, broadcast(&PACK_Y_LOW)),
        _mm256_shuffle_epi8(p22, broadcast(&PACK_Y_HIGH)),
    );
    let c = _mm256_or_si256(
        _mm256_shuffle_epi8(p01, broadcast(&PACK_C_LOW)),
        _mm256_shuffle_epi8(p22, broadcast(&PACK_C_HIGH)),
    );
    (y, c)
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn pack_batch(src: *const u8, y: *mut u8, uv: *mut u8) {
    let (y0, c0) = pack_pair(_mm256_loadu_si256(src.cast()));
    let (y1, c1) = pack_pair(_mm256_loadu_si256(src.add(32).cast()));
    store_four_groups(y, y0, y1);
    store_four_groups(uv, c0, c1);
}

row_kernel! {
    #[target_feature(enable = "avx2")]
    pack_row => pack_batch,
    pixels: 24,
    source: 64,
    planes: [y @ 0: 48, uv @ 1: 48]
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn permute_pair(v: __m256i) -> (__m256i, __m256i) {
    let keep = _mm256_set1_epi16(TOP_TEN_BITS);
    let y = _mm256_mullo_epi16(
        _mm256_shuffle_epi8(v, broadcast(&SHUFFLE_Y)),
        broadcast(&SHUFFLE_Y_SCALE),
    );
    let c = _mm256_mullo_epi16(
        _mm256_shuffle_epi8(v, broadcast(&SHUFFLE_C)),
        broadcast(&SHUFFLE_C_SCALE),
    );
    (_mm256_and_si256(y, keep), _mm256_and_si256(c, keep))
}

#[target_feature(enable = "avx2")]
#[inline]
unsafe fn permute_batch(src: *const u8, y: *mut u8, uv: *mut u8) {
    let (y0, c0) = permute_pair(_mm256_loadu_si256(src.cast()));
    let (y1, c1) = permute_pair(_mm256_loadu_si256(src.add(32).cast()));
    store_four_groups(y, y0, y1);
    store_four_groups(uv, c0, c1);
}

row_kernel! {
    #[target_feature(enable = "avx2")]
    permute_row => permute_batch,
    pixels: 24,
    source: 64,
    planes: [y @ 0: 48, uv @ 1: 48]
}
