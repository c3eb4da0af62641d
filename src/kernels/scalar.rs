//! Reference row kernels.
//!
//! These are the correctness oracle for every vector kernel. Each function
//! decodes one source row into destination rows that are exactly as long as
//! the plane geometry's `row_bytes`; the source row must hold at least
//! `min_row_bytes` bytes.

/// (word, field) of Y0..Y5 inside a v210 group; fields sit at bits 0, 10, 20.
pub const V210_LUMA: [(usize, u32); 6] = [(0, 1), (1, 0), (1, 2), (2, 1), (3, 0), (3, 2)];

/// (word, field) of U0 V0 U1 V1 U2 V2 inside a v210 group.
pub const V210_CHROMA: [(usize, u32); 6] = [(0, 0), (0, 2), (1, 1), (2, 0), (2, 2), (3, 1)];

#[inline]
fn put_u16(dst: &mut [u8], index: usize, value: u16) {
    dst[2 * index..2 * index + 2].copy_from_slice(&value.to_le_bytes());
}

#[inline]
fn word_le(bytes: &[u8], index: usize) -> u32 {
    u32::from_le_bytes([
        bytes[4 * index],
        bytes[4 * index + 1],
        bytes[4 * index + 2],
        bytes[4 * index + 3],
    ])
}

#[inline]
fn word_be(bytes: &[u8], index: usize) -> u32 {
    u32::from_be_bytes([
        bytes[4 * index],
        bytes[4 * index + 1],
        bytes[4 * index + 2],
        bytes[4 * index + 3],
    ])
}

/// Extracts the 10-bit field `field` of `word` scaled into the top of 16 bits.
#[inline]
pub fn v210_field(word: u32, field: u32) -> u16 {
    (((word >> (10 * field)) & 0x3FF) << 6) as u16
}

/// v210 to 16-bit luma plus interleaved 16-bit chroma.
pub fn v210_row(src: &[u8], y: &mut [u8], uv: &mut [u8], width: usize) {
    let chroma_samples = 2 * width.div_ceil(2);
    for (g, group) in src.chunks_exact(16).take(width.div_ceil(6)).enumerate() {
        let words = [
            word_le(group, 0),
            word_le(group, 1),
            word_le(group, 2),
            word_le(group, 3),
        ];
        for (k, &(word, field)) in V210_LUMA.iter().enumerate() {
            let px = 6 * g + k;
            if px < width {
                put_u16(y, px, v210_field(words[word], field));
            }
        }
        for (k, &(word, field)) in V210_CHROMA.iter().enumerate() {
            let sample = 6 * g + k;
            if sample < chroma_samples {
                put_u16(uv, sample, v210_field(words[word], field));
            }
        }
    }
}

/// Splits a 10-bit RGB word into R, G, B scaled to 16 bits.
#[inline]
pub fn rgb10_components(word: u32) -> [u16; 3] {
    [
        (((word >> 22) & 0x3FF) << 6) as u16,
        (((word >> 12) & 0x3FF) << 6) as u16,
        (((word >> 2) & 0x3FF) << 6) as u16,
    ]
}

fn rgb10_row(src: &[u8], rgb: &mut [u8], width: usize, read: fn(&[u8], usize) -> u32) {
    for px in 0..width {
        for (c, value) in rgb10_components(read(src, px)).into_iter().enumerate() {
            put_u16(rgb, 3 * px + c, value);
        }
    }
}

/// Big-endian 10-bit RGB to interleaved 16-bit RGB.
pub fn r10b_row(src: &[u8], rgb: &mut [u8], width: usize) {
    rgb10_row(src, rgb, width, word_be);
}

/// Little-endian 10-bit RGB to interleaved 16-bit RGB.
pub fn r10l_row(src: &[u8], rgb: &mut [u8], width: usize) {
    rgb10_row(src, rgb, width, word_le);
}

/// 8-bit macropixel to planar 4:2:2. `u_first` selects UYVY over VYUY.
#[inline]
fn yuv422_8bit_row(
    src: &[u8],
    y: &mut [u8],
    u: &mut [u8],
    v: &mut [u8],
    width: usize,
    u_first: bool,
) {
    let (u_at, v_at) = if u_first { (0, 2) } else { (2, 0) };
    for (m, macropixel) in src.chunks_exact(4).take(width.div_ceil(2)).enumerate() {
        u[m] = macropixel[u_at];
        y[2 * m] = macropixel[1];
        v[m] = macropixel[v_at];
        if 2 * m + 1 < width {
            y[2 * m + 1] = macropixel[3];
        }
    }
}

pub fn uyvy_row(src: &[u8], y: &mut [u8], u: &mut [u8], v: &mut [u8], width: usize) {
    yuv422_8bit_row(src, y, u, v, width, true);
}

pub fn vyuy_row(src: &[u8], y: &mut [u8], u: &mut [u8], v: &mut [u8], width: usize) {
    yuv422_8bit_row(src, y, u, v, width, false);
}

/// 16-bit UYVY to 16-bit luma plus interleaved UV. Samples are copied unchanged.
pub fn uyvy16_row(src: &[u8], y: &mut [u8], uv: &mut [u8], width: usize) {
    for (m, macropixel) in src.chunks_exact(8).take(width.div_ceil(2)).enumerate() {
        uv[4 * m..4 * m + 2].copy_from_slice(&macropixel[0..2]);
        y[4 * m..4 * m + 2].copy_from_slice(&macropixel[2..4]);
        uv[4 * m + 2..4 * m + 4].copy_from_slice(&macropixel[4..6]);
        if 2 * m + 1 < width {
            y[4 * m + 2..4 * m + 4].copy_from_slice(&macropixel[6..8]);
        }
    }
}
