//! Frame views and the interfaces of the frame source and destination
//! buffer provider.
//!
//! [`PackedFrame`] is a validated read-only view of one packed frame.
//! [`PlaneSet`] holds the writable destination regions. The
//! [`FrameSource`] and [`DestinationBuffer`] traits describe the
//! collaborators that own that memory.

use crate::error::{ConvertError, Result};
use crate::format::{PlanarFormat, SourceFormat};
use crate::geometry::{self, PlaneLayout, MAX_PLANES};

/// Immutable view of one packed frame.
#[derive(Debug, Clone, Copy)]
pub struct PackedFrame<'a> {
    data: &'a [u8],
    format: SourceFormat,
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> PackedFrame<'a> {
    /// Creates a view using the format's aligned stride.
    pub fn new(data: &'a [u8], format: SourceFormat, width: usize, height: usize) -> Result<Self> {
        let stride = geometry::source_stride(format, width)?;
        Self::with_stride(data, format, width, height, stride)
    }

    /// Creates a view with an explicit row stride.
    ///
    /// The stride must cover the whole pixel groups of a row and be a
    /// multiple of the format's row alignment; `data` must hold
    /// `stride * height` bytes.
    pub fn with_stride(
        data: &'a [u8],
        format: SourceFormat,
        width: usize,
        height: usize,
        stride: usize,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(geometry::invalid(width, height));
        }
        let minimum = geometry::min_row_bytes(format, width);
        if stride < minimum {
            return Err(ConvertError::StrideTooSmall {
                format,
                stride,
                minimum,
            });
        }
        let alignment = format.row_alignment();
        if stride % alignment != 0 {
            return Err(ConvertError::StrideMisaligned {
                format,
                stride,
                alignment,
            });
        }
        let required = stride
            .checked_mul(height)
            .ok_or_else(|| geometry::invalid(width, height))?;
        if data.len() < required {
            return Err(ConvertError::SourceTooSmall {
                required,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            format,
            width,
            height,
            stride,
        })
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Source rows, each trimmed to the bytes its pixel groups occupy.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> {
        let row_bytes = geometry::min_row_bytes(self.format, self.width);
        self.data
            .chunks(self.stride)
            .take(self.height)
            .map(move |row| &row[..row_bytes])
    }
}

/// Writable destination planes, in plane order.
#[derive(Debug)]
pub struct PlaneSet<'a> {
    planes: [&'a mut [u8]; MAX_PLANES],
    count: usize,
}

impl<'a> PlaneSet<'a> {
    /// Wraps up to three caller-owned plane regions.
    pub fn from_slices(slices: impl IntoIterator<Item = &'a mut [u8]>) -> Result<Self> {
        let mut set = Self {
            planes: [&mut [], &mut [], &mut []],
            count: 0,
        };
        for slice in slices {
            if set.count == MAX_PLANES {
                return Err(ConvertError::PlaneCount {
                    expected: MAX_PLANES,
                    actual: MAX_PLANES + 1,
                });
            }
            set.planes[set.count] = slice;
            set.count += 1;
        }
        Ok(set)
    }

    /// Splits one contiguous buffer into the planes of `layout`.
    pub fn split(buffer: &'a mut [u8], layout: &PlaneLayout) -> Result<Self> {
        let mut rest = buffer;
        let mut slices = Vec::with_capacity(layout.planes().len());
        for plane in layout.planes() {
            if rest.len() < plane.size() {
                return Err(ConvertError::BufferTooSmall {
                    plane: plane.kind.name(),
                    required: plane.size(),
                    actual: rest.len(),
                });
            }
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(plane.size());
            slices.push(head);
            rest = tail;
        }
        Self::from_slices(slices)
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Byte length of each plane.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.planes[..self.count].iter().map(|p| p.len())
    }

    pub fn as_mut_slice(&mut self) -> &mut [&'a mut [u8]] {
        &mut self.planes[..self.count]
    }
}

/// Width, height and format of a frame offered by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDescriptor {
    pub format: SourceFormat,
    pub width: usize,
    pub height: usize,
    /// Row stride if the source does not use the format's aligned stride
    pub stride: Option<usize>,
}

/// A capture-side provider of packed frames.
///
/// The backing memory is only valid between `begin_access` and
/// `end_access`; [`FrameAccess`] brackets the two.
pub trait FrameSource {
    fn descriptor(&self) -> FrameDescriptor;

    fn begin_access(&mut self) -> Result<()>;

    /// Raw frame bytes. Only meaningful while access is open.
    fn bytes(&self) -> &[u8];

    fn end_access(&mut self);
}

/// Scoped access to a [`FrameSource`]; ends access when dropped.
pub struct FrameAccess<'s, S: FrameSource + ?Sized> {
    source: &'s mut S,
}

impl<'s, S: FrameSource + ?Sized> FrameAccess<'s, S> {
    pub fn begin(source: &'s mut S) -> Result<Self> {
        source.begin_access()?;
        Ok(Self { source })
    }

    /// Validated view of the frame, valid while the guard lives.
    pub fn frame(&self) -> Result<PackedFrame<'_>> {
        let descriptor = self.source.descriptor();
        let bytes = self.source.bytes();
        match descriptor.stride {
            Some(stride) => PackedFrame::with_stride(
                bytes,
                descriptor.format,
                descriptor.width,
                descriptor.height,
                stride,
            ),
            None => PackedFrame::new(bytes, descriptor.format, descriptor.width, descriptor.height),
        }
    }
}

impl<S: FrameSource + ?Sized> Drop for FrameAccess<'_, S> {
    fn drop(&mut self) {
        self.source.end_access();
    }
}

/// A frame source backed by an owned buffer.
#[derive(Debug, Clone)]
pub struct MemoryFrame {
    descriptor: FrameDescriptor,
    data: Vec<u8>,
    open: bool,
    accesses: u64,
}

impl MemoryFrame {
    /// Allocates a zeroed frame of the format's aligned size.
    pub fn new(format: SourceFormat, width: usize, height: usize) -> Result<Self> {
        let size = geometry::source_frame_size(format, width, height)?;
        Ok(Self {
            descriptor: FrameDescriptor {
                format,
                width,
                height,
                stride: None,
            },
            data: vec![0; size],
            open: false,
            accesses: 0,
        })
    }

    /// Wraps existing bytes; the length is checked when the frame is viewed.
    pub fn from_bytes(data: Vec<u8>, descriptor: FrameDescriptor) -> Self {
        Self {
            descriptor,
            data,
            open: false,
            accesses: 0,
        }
    }

    /// Buffer to fill with the next frame.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Completed begin/end brackets.
    pub fn accesses(&self) -> u64 {
        self.accesses
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl FrameSource for MemoryFrame {
    fn descriptor(&self) -> FrameDescriptor {
        self.descriptor
    }

    fn begin_access(&mut self) -> Result<()> {
        if self.open {
            return Err(ConvertError::SourceAccess("frame already being accessed".into()));
        }
        self.open = true;
        Ok(())
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }

    fn end_access(&mut self) {
        if self.open {
            self.open = false;
            self.accesses += 1;
        }
    }
}

/// A renderer-side writable region for converted planes.
pub trait DestinationBuffer {
    /// Total writable bytes.
    fn capacity(&self) -> usize;

    fn bytes_mut(&mut self) -> &mut [u8];

    /// Row width in pixels the renderer asked for, if it declared one.
    fn declared_row_width(&self) -> Option<usize> {
        None
    }
}

impl DestinationBuffer for Vec<u8> {
    fn capacity(&self) -> usize {
        self.len()
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        self
    }
}

/// Owned, contiguous destination planes for one frame geometry.
#[derive(Debug, Clone)]
pub struct FrameBuffers {
    layout: PlaneLayout,
    width: usize,
    pad: usize,
    data: Vec<u8>,
}

impl FrameBuffers {
    /// Allocates zeroed planes for `destination` with `pad` extra pixels per row.
    pub fn new(destination: PlanarFormat, width: usize, height: usize, pad: usize) -> Result<Self> {
        let layout = geometry::plane_layout(destination, width, height, pad)?;
        Ok(Self {
            layout,
            width,
            pad,
            data: vec![0; layout.total_size()],
        })
    }

    pub fn layout(&self) -> &PlaneLayout {
        &self.layout
    }

    pub fn pad(&self) -> usize {
        self.pad
    }

    /// Fills every byte, padding included, with `value`.
    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }

    /// Mutable plane views for a conversion.
    pub fn planes(&mut self) -> Result<PlaneSet<'_>> {
        PlaneSet::split(&mut self.data, &self.layout)
    }

    /// Bytes of plane `index`, padding included.
    pub fn plane(&self, index: usize) -> &[u8] {
        let start: usize = self.layout.sizes().take(index).sum();
        let size = self.layout.planes().get(index).map_or(0, |p| p.size());
        &self.data[start..start + size]
    }

    /// Genuine samples of plane `index` row by row, padding skipped.
    pub fn plane_rows(&self, index: usize) -> impl Iterator<Item = &[u8]> {
        let geometry = self.layout.planes().get(index).copied().unwrap_or_default();
        let step = geometry.stride.max(1);
        self.plane(index)
            .chunks(step)
            .map(move |row| &row[..geometry.row_bytes])
    }
}

impl DestinationBuffer for FrameBuffers {
    fn capacity(&self) -> usize {
        self.data.len()
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn declared_row_width(&self) -> Option<usize> {
        Some(self.width + self.pad)
    }
}
