//! Byte-shuffle kernels for 10-bit RGB and the 8- and 16-bit 4:2:2 formats.

use std::arch::x86_64::*;

use super::v210_sse::{table, TOP_TEN_BITS};

/// Shuffle and scale tables turning eight 10-bit RGB words into 24 samples.
///
/// Output register `r`, lane `l` carries sample `8r + l`, that is component
/// `(8r + l) % 3` of pixel `(8r + l) / 3`. Pixels 0-3 come from the first
/// load, 4-7 from the second.
struct RgbTables {
    first: [[i8; 16]; 3],
    second: [[i8; 16]; 3],
    scale: [[i16; 8]; 3],
}

const fn rgb_gather(register: usize, second: bool, big_endian: bool) -> [i8; 16] {
    let mut mask = [-1i8; 16];
    let mut lane = 0;
    while lane < 8 {
        let sample = 8 * register + lane;
        let pixel = sample / 3;
        if (pixel >= 4) == second {
            let base = 4 * (pixel % 4);
            // (low, high) byte of the 16 bits holding the component
            let (low, high) = match (big_endian, sample % 3) {
                (false, 0) => (2, 3),
                (false, 1) => (1, 2),
                (false, _) => (0, 1),
                (true, 0) => (1, 0),
                (true, 1) => (2, 1),
                (true, _) => (3, 2),
            };
            mask[2 * lane] = (base + low) as i8;
            mask[2 * lane + 1] = (base + high) as i8;
        }
        lane += 1;
    }
    mask
}

const fn rgb_scale(register: usize) -> [i16; 8] {
    // R sits at bit 6 of its byte pair, G at bit 4, B at bit 2.
    const FACTOR: [i16; 3] = [1, 4, 16];
    let mut scale = [0i16; 8];
    let mut lane = 0;
    while lane < 8 {
        scale[lane] = FACTOR[(8 * register + lane) % 3];
        lane += 1;
    }
    scale
}

const fn rgb_tables(big_endian: bool) -> RgbTables {
    RgbTables {
        first: [
            rgb_gather(0, false, big_endian),
            rgb_gather(1, false, big_endian),
            rgb_gather(2, false, big_endian),
        ],
        second: [
            rgb_gather(0, true, big_endian),
            rgb_gather(1, true, big_endian),
            rgb_gather(2, true, big_endian),
        ],
        scale: [rgb_scale(0), rgb_scale(1), rgb_scale(2)],
    }
}

const R10L: RgbTables = rgb_tables(false);
const R10B: RgbTables = rgb_tables(true);

#[target_feature(enable = "ssse3")]
#[inline]
unsafe fn rgb10_batch(src: *const u8, rgb: *mut u8, tables: &RgbTables) {
    let a = _mm_loadu_si128(src.cast());
    let b = _mm_loadu_si128(src.add(16).cast());
    let keep = _mm_set1_epi16(TOP_TEN_BITS);
    // Register 0 only sees pixels 0-2 and register 2 only pixels 5-7.
    let gathered = [
        _mm_shuffle_epi8(a, table(&tables.first[0])),
        _mm_or_si128(
            _mm_shuffle_epi8(a, table(&tables.first[1])),
            _mm_shuffle_epi8(b, table(&tables.second[1])),
        ),
        _mm_shuffle_epi8(b, table(&tables.second[2])),
    ];
    for (i, samples) in gathered.into_iter().enumerate() {
        let scaled = _mm_and_si128(_mm_mullo_epi16(samples, table(&tables.scale[i])), keep);
        _mm_storeu_si128(rgb.add(16 * i).cast(), scaled);
    }
}

#[target_feature(enable = "ssse3")]
#[inline]
unsafe fn r10l_batch(src: *const u8, rgb: *mut u8) {
    rgb10_batch(src, rgb, &R10L);
}

#[target_feature(enable = "ssse3")]
#[inline]
unsafe fn r10b_batch(src: *const u8, rgb: *mut u8) {
    rgb10_batch(src, rgb, &R10B);
}

row_kernel! {
    #[target_feature(enable = "ssse3")]
    r10l_row => r10l_batch,
    pixels: 8,
    source: 32,
    planes: [rgb @ 0: 48]
}

row_kernel! {
    #[target_feature(enable = "ssse3")]
    r10b_row => r10b_batch,
    pixels: 8,
    source: 32,
    planes: [rgb @ 0: 48]
}

// Eight luma bytes, then the four first-chroma bytes, then the four others.
const UYVY_SPLIT: [i8; 16] = [1, 3, 5, 7, 9, 11, 13, 15, 0, 4, 8, 12, 2, 6, 10, 14];
const VYUY_SPLIT: [i8; 16] = [1, 3, 5, 7, 9, 11, 13, 15, 2, 6, 10, 14, 0, 4, 8, 12];

#[target_feature(enable = "ssse3")]
#[inline]
unsafe fn yuv422_batch(src: *const u8, y: *mut u8, u: *mut u8, v: *mut u8, split: &[i8; 16]) {
    let control = table(split);
    let a = _mm_shuffle_epi8(_mm_loadu_si128(src.cast()), control);
    let b = _mm_shuffle_epi8(_mm_loadu_si128(src.add(16).cast()), control);
    _mm_storeu_si128(y.cast(), _mm_unpacklo_epi64(a, b));
    let chroma = _mm_unpackhi_epi32(a, b);
    _mm_storel_epi64(u.cast(), chroma);
    _mm_storel_epi64(v.cast(), _mm_unpackhi_epi64(chroma, chroma));
}

#[target_feature(enable = "ssse3")]
#[inline]
unsafe fn uyvy_batch(src: *const u8, y: *mut u8, u: *mut u8, v: *mut u8) {
    yuv422_batch(src, y, u, v, &UYVY_SPLIT);
}

#[target_feature(enable = "ssse3")]
#[inline]
unsafe fn vyuy_batch(src: *const u8, y: *mut u8, u: *mut u8, v: *mut u8) {
    yuv422_batch(src, y, u, v, &VYUY_SPLIT);
}

row_kernel! {
    #[target_feature(enable = "ssse3")]
    uyvy_row => uyvy_batch,
    pixels: 16,
    source: 32,
    planes: [y @ 0: 16, u @ 1: 8, v @ 2: 8]
}

row_kernel! {
    #[target_feature(enable = "ssse3")]
    vyuy_row => vyuy_batch,
    pixels: 16,
    source: 32,
    planes: [y @ 0: 16, u @ 1: 8, v @ 2: 8]
}

// Four 16-bit luma samples, then U V U V.
const UYVY16_SPLIT: [i8; 16] = [2, 3, 6, 7, 10, 11, 14, 15, 0, 1, 4, 5, 8, 9, 12, 13];

#[target_feature(enable = "ssse3")]
#[inline]
unsafe fn uyvy16_batch(src: *const u8, y: *mut u8, uv: *mut u8) {
    let control = table(&UYVY16_SPLIT);
    let a = _mm_shuffle_epi8(_mm_loadu_si128(src.cast()), control);
    let b = _mm_shuffle_epi8(_mm_loadu_si128(src.add(16).cast()), control);
    _mm_storeu_si128(y.cast(), _mm_unpacklo_epi64(a, b));
    _mm_storeu_si128(uv.cast(), _mm_unpackhi_epi64(a, b));
}

row_kernel! {
    #[target_feature(enable = "ssse3")]
    uyvy16_row => uyvy16_batch,
    pixels: 8,
    source: 32,
    planes: [y @ 0: 16, uv @ 1: 16]
}
