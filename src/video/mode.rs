//! Video mode descriptors
//!
//! A video mode pins down the pixel format, resolution, and frame rate a
//! source captures at. Modes are plain value types; changing a source's mode
//! goes through [`crate::video::VideoSource::set_video_mode`] so the change is
//! observable by the publisher.

/// Pixel format of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// Motion JPEG compressed frames
    #[default]
    Mjpeg,
    /// Packed YUV 4:2:2
    Yuyv,
    /// 16-bit RGB
    Rgb565,
    /// 24-bit BGR (OpenCV byte order)
    Bgr,
    /// 8-bit grayscale
    Gray,
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PixelFormat::Mjpeg => "MJPEG",
            PixelFormat::Yuyv => "YUYV",
            PixelFormat::Rgb565 => "RGB565",
            PixelFormat::Bgr => "BGR",
            PixelFormat::Gray => "GRAY",
        };
        f.write_str(name)
    }
}

/// Capture mode: pixel format, resolution, and frame rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoMode {
    /// Pixel format
    pub pixel_format: PixelFormat,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frames per second
    pub fps: u32,
}

impl VideoMode {
    /// 640x480 MJPEG at 30 fps
    pub const LARGE: VideoMode = VideoMode::new(PixelFormat::Mjpeg, 640, 480, 30);
    /// 320x240 MJPEG at 30 fps
    pub const MEDIUM: VideoMode = VideoMode::new(PixelFormat::Mjpeg, 320, 240, 30);
    /// 160x120 MJPEG at 30 fps
    pub const SMALL: VideoMode = VideoMode::new(PixelFormat::Mjpeg, 160, 120, 30);

    /// Create a new video mode
    pub const fn new(pixel_format: PixelFormat, width: u32, height: u32, fps: u32) -> Self {
        Self {
            pixel_format,
            width,
            height,
            fps,
        }
    }

    /// Return this mode with a different resolution
    pub const fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Return this mode with a different frame rate
    pub const fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Return this mode with a different pixel format
    pub const fn with_pixel_format(mut self, pixel_format: PixelFormat) -> Self {
        self.pixel_format = pixel_format;
        self
    }
}

impl Default for VideoMode {
    fn default() -> Self {
        VideoMode::LARGE
    }
}

impl std::fmt::Display for VideoMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} {} {} fps",
            self.width, self.height, self.pixel_format, self.fps
        )
    }
}
