//! Frame payloads for source-to-sink fan-out
//!
//! Frames are designed to be cheap to clone: the pixel data lives in a
//! reference-counted `Bytes`, so broadcasting a frame to many sinks shares a
//! single allocation.

use bytes::Bytes;

use super::mode::PixelFormat;

/// A single captured or generated video frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixel data (zero-copy via reference counting)
    pub data: Bytes,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format of `data`
    pub pixel_format: PixelFormat,
    /// Capture timestamp in microseconds since an arbitrary epoch
    pub time_us: u64,
}

impl Frame {
    /// Create a frame from raw pixel data
    pub fn new(data: Bytes, width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        Self {
            data,
            width,
            height,
            pixel_format,
            time_us: 0,
        }
    }

    /// Set the capture timestamp (microseconds)
    pub fn with_time_us(mut self, time_us: u64) -> Self {
        self.time_us = time_us;
        self
    }

    /// Create an all-zero grayscale frame of the given size
    ///
    /// Useful for tests and for priming a generated source before real
    /// frames are available.
    pub fn black(width: u32, height: u32) -> Self {
        Self {
            data: Bytes::from(vec![0u8; width as usize * height as usize]),
            width,
            height,
            pixel_format: PixelFormat::Gray,
            time_us: 0,
        }
    }

    /// Size of the pixel data in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the frame carries no pixel data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_frame() {
        let frame = Frame::black(160, 120);
        assert_eq!(frame.len(), 160 * 120);
        assert_eq!(frame.pixel_format, PixelFormat::Gray);
        assert!(frame.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_clone_shares_data() {
        let frame = Frame::new(Bytes::from_static(&[1, 2, 3]), 3, 1, PixelFormat::Gray);
        let copy = frame.clone();

        // Bytes clones are reference-counted, not copied
        assert_eq!(frame.data.as_ptr(), copy.data.as_ptr());
    }

    #[test]
    fn test_black_frame_large_dimensions() {
        // width * height overflows u32; the byte count must not
        let frame = Frame::black(65_536, 65_536);
        assert_eq!(frame.len(), 65_536usize * 65_536usize);
    }

    #[test]
    fn test_with_time() {
        let frame = Frame::black(2, 2).with_time_us(1_000_000);
        assert_eq!(frame.time_us, 1_000_000);
    }
}
