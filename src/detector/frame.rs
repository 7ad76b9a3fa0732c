//! Canonical frame representation and pixel format normalisation.

use image::{DynamicImage, RgbImage};
use ndarray::{Array3, ArrayView3};

use crate::error::MotionError;

/// Number of interleaved channels in a canonical frame.
pub const CHANNELS: usize = 3;

/// Pixel layouts accepted from frame sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PixelFormat {
    /// 24-bit blue, green, red. The canonical layout.
    #[default]
    Bgr24,
    /// 24-bit red, green, blue.
    Rgb24,
    /// 32-bit blue, green, red, alpha.
    Bgra32,
    /// 32-bit red, green, blue, alpha.
    Rgba32,
    /// 8-bit greyscale.
    Gray8,
}

impl PixelFormat {
    /// Number of bytes one pixel occupies in this layout.
    #[inline]
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Bgr24 | Self::Rgb24 => 3,
            Self::Bgra32 | Self::Rgba32 => 4,
            Self::Gray8 => 1,
        }
    }

    #[inline]
    fn to_bgr(self, px: &[u8]) -> [u8; CHANNELS] {
        match self {
            Self::Bgr24 | Self::Bgra32 => [px[0], px[1], px[2]],
            Self::Rgb24 | Self::Rgba32 => [px[2], px[1], px[0]],
            Self::Gray8 => [px[0]; CHANNELS],
        }
    }
}

/// A frame as delivered by a capture device, before normalisation.
///
/// Rows may be padded: `stride` is the distance in bytes between the starts
/// of two consecutive rows and must be at least `width * bytes_per_pixel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub stride: usize,
    pub data: Vec<u8>,
}

impl RawFrame {
    /// Create a raw frame with tightly packed rows.
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            stride: width as usize * format.bytes_per_pixel(),
            data,
        }
    }

    /// Set the row stride in bytes.
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    /// Convert into the canonical 24-bit BGR frame, dropping alpha and row padding.
    pub fn to_frame(&self) -> Result<Frame, MotionError> {
        let (width, height) = (self.width as usize, self.height as usize);
        if width == 0 || height == 0 {
            return Err(MotionError::InvalidFrameFormat(format!(
                "frame has no pixels ({}x{})",
                self.width, self.height
            )));
        }

        let bpp = self.format.bytes_per_pixel();
        let row_len = width * bpp;
        if self.stride < row_len {
            return Err(MotionError::InvalidFrameFormat(format!(
                "stride {} is shorter than a {:?} row of {} bytes",
                self.stride, self.format, row_len
            )));
        }

        let Some(required) = self
            .stride
            .checked_mul(height - 1)
            .and_then(|padded| padded.checked_add(row_len))
        else {
            return Err(MotionError::InvalidFrameFormat(format!(
                "stride {} overflows a frame of {} rows",
                self.stride, self.height
            )));
        };
        if self.data.len() < required {
            return Err(MotionError::InvalidFrameFormat(format!(
                "{}x{} {:?} frame needs {} bytes, got {}",
                self.width,
                self.height,
                self.format,
                required,
                self.data.len()
            )));
        }

        if self.format == PixelFormat::Bgr24 && self.stride == row_len {
            return Frame::new(self.width, self.height, self.data[..required].to_vec());
        }

        let mut bgr = Vec::with_capacity(width * height * CHANNELS);
        for row in self.data.chunks(self.stride).take(height) {
            for px in row[..row_len].chunks_exact(bpp) {
                bgr.extend_from_slice(&self.format.to_bgr(px));
            }
        }
        Frame::new(self.width, self.height, bgr)
    }
}

/// A frame in the canonical layout: 3 interleaved 8-bit channels in B, G, R
/// order, row-major, without row padding.
///
/// Backed by an array of shape `(height, width, 3)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "PackedFrame", into = "PackedFrame"))]
pub struct Frame {
    pixels: Array3<u8>,
}

/// Serialized form of a [`Frame`]; validated through [`Frame::new`] on the way in.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct PackedFrame {
    width: u32,
    height: u32,
    bgr: Vec<u8>,
}

#[cfg(feature = "serde")]
impl TryFrom<PackedFrame> for Frame {
    type Error = MotionError;

    fn try_from(packed: PackedFrame) -> Result<Self, Self::Error> {
        Frame::new(packed.width, packed.height, packed.bgr)
    }
}

#[cfg(feature = "serde")]
impl From<Frame> for PackedFrame {
    fn from(frame: Frame) -> Self {
        let (width, height) = frame.dimensions();
        Self {
            width,
            height,
            bgr: frame.into_bytes(),
        }
    }
}

impl Frame {
    /// Create a frame from packed BGR bytes.
    pub fn new(width: u32, height: u32, bgr: Vec<u8>) -> Result<Self, MotionError> {
        if width == 0 || height == 0 {
            return Err(MotionError::InvalidFrameFormat(format!(
                "frame has no pixels ({width}x{height})"
            )));
        }
        Array3::from_shape_vec((height as usize, width as usize, CHANNELS), bgr)
            .map(|pixels| Self { pixels })
            .map_err(|e| MotionError::InvalidFrameFormat(format!("{width}x{height} BGR frame: {e}")))
    }

    /// Create a frame where every pixel has the same colour.
    ///
    /// Unlike [`new`](Self::new) this never fails, so a zero-sized frame can
    /// be built here; the detector rejects such frames with
    /// [`MotionError::InvalidFrameFormat`] when they are handed to it.
    pub fn filled(width: u32, height: u32, bgr: [u8; CHANNELS]) -> Self {
        Self {
            pixels: Array3::from_shape_fn((height as usize, width as usize, CHANNELS), |(_, _, c)| {
                bgr[c]
            }),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixels.dim().1 as u32
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixels.dim().0 as u32
    }

    /// Width and height in pixels.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        let (h, w, _) = self.pixels.dim();
        h * w
    }

    /// Colour of the pixel at column `x`, row `y`, or `None` if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; CHANNELS]> {
        let (x, y) = (x as usize, y as usize);
        let (h, w, _) = self.pixels.dim();
        (x < w && y < h).then(|| {
            [
                self.pixels[[y, x, 0]],
                self.pixels[[y, x, 1]],
                self.pixels[[y, x, 2]],
            ]
        })
    }

    /// Overwrite the pixel at column `x`, row `y`.
    ///
    /// # Panics
    /// Panics if the coordinates are outside the frame.
    pub fn set_pixel(&mut self, x: u32, y: u32, bgr: [u8; CHANNELS]) {
        for (c, value) in bgr.into_iter().enumerate() {
            self.pixels[[y as usize, x as usize, c]] = value;
        }
    }

    /// The packed BGR bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.pixels.as_slice().unwrap_or_default()
    }

    /// Consume the frame, returning the packed BGR bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.pixels.into_raw_vec_and_offset().0
    }

    /// View of the raster with shape `(height, width, 3)`.
    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }

    fn ensure_pixels(self) -> Result<Self, MotionError> {
        if self.pixel_count() == 0 {
            return Err(MotionError::InvalidFrameFormat(format!(
                "frame has no pixels ({}x{})",
                self.width(),
                self.height()
            )));
        }
        Ok(self)
    }

    pub(crate) fn pixels(&self) -> &Array3<u8> {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut Array3<u8> {
        &mut self.pixels
    }
}

/// Conversion into the canonical frame layout.
///
/// Implemented for every frame type the detector accepts, so callers can
/// pass whatever their capture layer produces.
pub trait IntoFrame {
    /// Normalise into a canonical frame.
    fn into_frame(self) -> Result<Frame, MotionError>;
}

impl IntoFrame for Frame {
    fn into_frame(self) -> Result<Frame, MotionError> {
        self.ensure_pixels()
    }
}

impl IntoFrame for &Frame {
    fn into_frame(self) -> Result<Frame, MotionError> {
        self.clone().ensure_pixels()
    }
}

impl IntoFrame for RawFrame {
    fn into_frame(self) -> Result<Frame, MotionError> {
        self.to_frame()
    }
}

impl IntoFrame for &RawFrame {
    fn into_frame(self) -> Result<Frame, MotionError> {
        self.to_frame()
    }
}

impl IntoFrame for RgbImage {
    fn into_frame(self) -> Result<Frame, MotionError> {
        let (width, height) = self.dimensions();
        RawFrame::new(width, height, PixelFormat::Rgb24, self.into_raw()).to_frame()
    }
}

impl IntoFrame for &DynamicImage {
    fn into_frame(self) -> Result<Frame, MotionError> {
        match self {
            DynamicImage::ImageRgba8(img) => {
                let (width, height) = img.dimensions();
                RawFrame::new(width, height, PixelFormat::Rgba32, img.as_raw().clone()).to_frame()
            }
            DynamicImage::ImageLuma8(img) => {
                let (width, height) = img.dimensions();
                RawFrame::new(width, height, PixelFormat::Gray8, img.as_raw().clone()).to_frame()
            }
            other => other.to_rgb8().into_frame(),
        }
    }
}

impl IntoFrame for DynamicImage {
    fn into_frame(self) -> Result<Frame, MotionError> {
        match self {
            DynamicImage::ImageRgb8(img) => img.into_frame(),
            other => (&other).into_frame(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_is_swapped_to_bgr() {
        let raw = RawFrame::new(2, 1, PixelFormat::Rgb24, vec![10, 20, 30, 40, 50, 60]);
        let frame = raw.to_frame().unwrap();
        assert_eq!(frame.pixel(0, 0), Some([30, 20, 10]));
        assert_eq!(frame.pixel(1, 0), Some([60, 50, 40]));
    }

    #[test]
    fn test_alpha_and_padding_are_dropped() {
        // 1x2 BGRA with 2 bytes of padding per row
        let raw = RawFrame::new(
            1,
            2,
            PixelFormat::Bgra32,
            vec![1, 2, 3, 255, 0, 0, 4, 5, 6, 255],
        )
        .with_stride(6);
        let frame = raw.to_frame().unwrap();
        assert_eq!(frame.as_bytes(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_gray_is_replicated() {
        let raw = RawFrame::new(1, 1, PixelFormat::Gray8, vec![77]);
        assert_eq!(raw.to_frame().unwrap().pixel(0, 0), Some([77, 77, 77]));
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let raw = RawFrame::new(4, 4, PixelFormat::Bgr24, vec![0; 47]);
        assert!(matches!(
            raw.to_frame(),
            Err(MotionError::InvalidFrameFormat(_))
        ));
    }

    #[test]
    fn test_short_stride_is_rejected() {
        let raw = RawFrame::new(4, 1, PixelFormat::Bgr24, vec![0; 12]).with_stride(8);
        assert!(matches!(
            raw.to_frame(),
            Err(MotionError::InvalidFrameFormat(_))
        ));
    }

    #[test]
    fn test_huge_stride_is_rejected() {
        let raw = RawFrame::new(1, 3, PixelFormat::Bgr24, vec![0; 3]).with_stride(1 << 63);
        assert!(matches!(
            raw.to_frame(),
            Err(MotionError::InvalidFrameFormat(_))
        ));

        let raw = RawFrame::new(1, 2, PixelFormat::Bgr24, vec![0; 3]).with_stride(usize::MAX);
        assert!(matches!(
            raw.to_frame(),
            Err(MotionError::InvalidFrameFormat(_))
        ));
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        assert!(Frame::new(0, 3, vec![]).is_err());
        assert!(RawFrame::new(0, 0, PixelFormat::Rgb24, vec![]).to_frame().is_err());
        assert!(matches!(
            Frame::filled(0, 0, [0, 0, 0]).into_frame(),
            Err(MotionError::InvalidFrameFormat(_))
        ));
        assert!((&Frame::filled(3, 0, [0, 0, 0])).into_frame().is_err());
    }

    #[test]
    fn test_bytes_and_view() {
        let mut frame = Frame::filled(2, 1, [1, 2, 3]);
        frame.set_pixel(1, 0, [4, 5, 6]);

        let view = frame.view();
        assert_eq!(view.dim(), (1, 2, 3));
        assert_eq!(view[[0, 1, 2]], 6);

        assert_eq!(frame.into_bytes(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let frame = Frame::filled(2, 2, [1, 2, 3]);
        assert_eq!(frame.pixel(1, 1), Some([1, 2, 3]));
        assert_eq!(frame.pixel(2, 0), None);
        assert_eq!(frame.pixel_count(), 4);
    }

    #[test]
    fn test_dynamic_image_conversion() {
        let img = RgbImage::from_raw(1, 1, vec![200, 100, 50]).unwrap();
        let frame = DynamicImage::ImageRgb8(img).into_frame().unwrap();
        assert_eq!(frame.dimensions(), (1, 1));
        assert_eq!(frame.pixel(0, 0), Some([50, 100, 200]));
    }
}
