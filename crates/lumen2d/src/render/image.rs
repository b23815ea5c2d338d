//! In-memory images
//!
//! [`Image`] stores pixel rows bottom-up: row 0 is the bottom row of the
//! picture. Loaders flip decoded data on the way in, so texture uploads can
//! hand rows to the backend unchanged and draw calls flip V when packing
//! vertices.

use std::path::Path;
use thiserror::Error;

/// Image errors
#[derive(Error, Debug)]
pub enum ImageError {
    /// Decoding failed
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// Encoding or writing failed
    #[error("failed to encode image: {0}")]
    Encode(String),

    /// Channel count outside 1..=4
    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u8),

    /// Pixel buffer does not match the dimensions
    #[error("pixel buffer is {actual} bytes, expected {expected}")]
    SizeMismatch {
        /// Bytes required by width, height and channels
        expected: usize,
        /// Bytes provided
        actual: usize,
    },
}

/// Pixel format by channel count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Luminance
    Gray,
    /// Luminance and alpha
    GrayAlpha,
    /// Red, green, blue
    Rgb,
    /// Red, green, blue, alpha
    Rgba,
}

impl ImageFormat {
    /// Format for a channel count
    pub const fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(Self::Gray),
            2 => Some(Self::GrayAlpha),
            3 => Some(Self::Rgb),
            4 => Some(Self::Rgba),
            _ => None,
        }
    }

    /// Bytes per pixel
    pub const fn channels(self) -> u8 {
        match self {
            Self::Gray => 1,
            Self::GrayAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Decoded image, rows stored bottom-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    format: ImageFormat,
    pixels: Vec<u8>,
}

impl Image {
    /// Wrap a bottom-up pixel buffer
    pub fn new(width: u32, height: u32, channels: u8, pixels: Vec<u8>) -> Result<Self, ImageError> {
        let format = ImageFormat::from_channels(channels).ok_or(ImageError::UnsupportedChannels(channels))?;
        let expected = width as usize * height as usize * channels as usize;
        if pixels.len() != expected {
            return Err(ImageError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            pixels,
        })
    }

    /// Image filled with one RGBA color
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(pixel_count * 4);
        for _ in 0..pixel_count {
            pixels.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            format: ImageFormat::Rgba,
            pixels,
        }
    }

    /// Decode an image file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ImageError> {
        let path = path.as_ref();
        log::debug!("Loading image from: {:?}", path);

        let decoded = image::open(path).map_err(|e| ImageError::Decode(format!("{}: {}", path.display(), e)))?;
        let image = Self::from_dynamic(decoded);

        log::info!(
            "Loaded image {}x{} ({} channels) from {:?}",
            image.width,
            image.height,
            image.channels(),
            path
        );
        Ok(image)
    }

    /// Decode an encoded image held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        let decoded = image::load_from_memory(bytes).map_err(|e| ImageError::Decode(e.to_string()))?;
        let image = Self::from_dynamic(decoded);
        log::debug!("Loaded image {}x{} from memory", image.width, image.height);
        Ok(image)
    }

    fn from_dynamic(decoded: image::DynamicImage) -> Self {
        let flipped = decoded.flipv();
        let (width, height) = (flipped.width(), flipped.height());
        let (format, pixels) = match flipped.color() {
            image::ColorType::L8 | image::ColorType::L16 => (ImageFormat::Gray, flipped.to_luma8().into_raw()),
            image::ColorType::La8 | image::ColorType::La16 => {
                (ImageFormat::GrayAlpha, flipped.to_luma_alpha8().into_raw())
            }
            image::ColorType::Rgb8 | image::ColorType::Rgb16 | image::ColorType::Rgb32F => {
                (ImageFormat::Rgb, flipped.to_rgb8().into_raw())
            }
            _ => (ImageFormat::Rgba, flipped.to_rgba8().into_raw()),
        };
        Self {
            width,
            height,
            format,
            pixels,
        }
    }

    /// Write as an encoded file; the format follows the extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ImageError> {
        let path = path.as_ref();
        let color = match self.format {
            ImageFormat::Gray => image::ColorType::L8,
            ImageFormat::GrayAlpha => image::ColorType::La8,
            ImageFormat::Rgb => image::ColorType::Rgb8,
            ImageFormat::Rgba => image::ColorType::Rgba8,
        };
        image::save_buffer(path, &self.rows_top_down(), self.width, self.height, color)
            .map_err(|e| ImageError::Encode(format!("{}: {}", path.display(), e)))?;
        log::info!("Saved image {}x{} to {:?}", self.width, self.height, path);
        Ok(())
    }

    /// Width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Pixel format
    pub const fn format(&self) -> ImageFormat {
        self.format
    }

    /// Bytes per pixel
    pub const fn channels(&self) -> u8 {
        self.format.channels()
    }

    /// Raw pixel bytes, bottom row first
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Bytes of one row
    pub const fn stride(&self) -> usize {
        self.width as usize * self.format.channels() as usize
    }

    /// Channels of the pixel at column `x` of stored row `row` (bottom-up)
    pub fn texel(&self, x: u32, row: u32) -> &[u8] {
        let channels = self.channels() as usize;
        let start = row as usize * self.stride() + x as usize * channels;
        &self.pixels[start..start + channels]
    }

    /// Pixel as RGBA at column `x`, row `y` counted from the top
    pub fn pixel_rgba(&self, x: u32, y: u32) -> [u8; 4] {
        self.texel_rgba(x, self.height - 1 - y)
    }

    /// Texel expanded to RGBA at column `x` of stored row `row` (bottom-up)
    pub fn texel_rgba(&self, x: u32, row: u32) -> [u8; 4] {
        let texel = self.texel(x, row);
        match self.format {
            ImageFormat::Gray => [texel[0], texel[0], texel[0], 255],
            ImageFormat::GrayAlpha => [texel[0], texel[0], texel[0], texel[1]],
            ImageFormat::Rgb => [texel[0], texel[1], texel[2], 255],
            ImageFormat::Rgba => [texel[0], texel[1], texel[2], texel[3]],
        }
    }

    /// Copy of the pixel bytes with the top row first
    pub fn rows_top_down(&self) -> Vec<u8> {
        let stride = self.stride();
        if stride == 0 {
            return Vec::new();
        }
        self.pixels.chunks_exact(stride).rev().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_png(width: u32, height: u32, rgba_top_down: &[u8]) -> Vec<u8> {
        let buffer = image::RgbaImage::from_raw(width, height, rgba_top_down.to_vec()).unwrap();
        let mut bytes = std::io::Cursor::new(Vec::new());
        buffer.write_to(&mut bytes, image::ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_new_validates_buffer_size() {
        assert!(Image::new(2, 2, 4, vec![0; 16]).is_ok());
        assert!(matches!(
            Image::new(2, 2, 4, vec![0; 15]),
            Err(ImageError::SizeMismatch { expected: 16, actual: 15 })
        ));
        assert!(matches!(Image::new(1, 1, 5, vec![0; 5]), Err(ImageError::UnsupportedChannels(5))));
    }

    #[test]
    fn test_decoded_rows_are_bottom_up() {
        // Top row red, bottom row blue
        let png = encode_png(1, 2, &[255, 0, 0, 255, 0, 0, 255, 255]);
        let image = Image::from_bytes(&png).unwrap();

        assert_eq!(image.width(), 1);
        assert_eq!(image.height(), 2);
        assert_eq!(image.format(), ImageFormat::Rgba);
        assert_eq!(image.texel(0, 0), &[0, 0, 255, 255]);
        assert_eq!(image.pixel_rgba(0, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn test_rows_top_down_reverses_storage() {
        let image = Image::new(1, 2, 1, vec![10, 20]).unwrap();
        assert_eq!(image.rows_top_down(), vec![20, 10]);
        assert_eq!(image.pixel_rgba(0, 0), [20, 20, 20, 255]);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        assert!(matches!(Image::from_bytes(b"not an image"), Err(ImageError::Decode(_))));
    }

    #[test]
    fn test_solid_color_image() {
        let image = Image::solid_color(3, 2, [1, 2, 3, 4]);
        assert_eq!(image.pixels().len(), 3 * 2 * 4);
        assert_eq!(image.pixel_rgba(2, 1), [1, 2, 3, 4]);
    }
}
