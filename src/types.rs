//! Decoded images and their color modes

use crate::error::{EditorError, Result};
use image::{DynamicImage, ImageFormat};

/// Channel layout of a decoded raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    Grayscale,
    GrayscaleAlpha,
    Rgb,
    Rgba,
    /// Indexed color; pixels are held expanded to RGB or RGBA
    Palette,
}

impl ColorMode {
    pub const ALL: [Self; 5] = [
        Self::Grayscale,
        Self::GrayscaleAlpha,
        Self::Rgb,
        Self::Rgba,
        Self::Palette,
    ];

    pub fn has_alpha(self) -> bool {
        matches!(self, Self::GrayscaleAlpha | Self::Rgba)
    }

    /// Layout of the pixels actually stored for a non-indexed image
    fn from_pixels(image: &DynamicImage) -> Self {
        let color = image.color();
        match (color.has_color(), color.has_alpha()) {
            (false, false) => Self::Grayscale,
            (false, true) => Self::GrayscaleAlpha,
            (true, false) => Self::Rgb,
            (true, true) => Self::Rgba,
        }
    }
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Grayscale => "L",
            Self::GrayscaleAlpha => "LA",
            Self::Rgb => "RGB",
            Self::Rgba => "RGBA",
            Self::Palette => "P",
        };
        f.write_str(name)
    }
}

/// An in-memory raster plus the color mode it was stored in
#[derive(Debug, Clone)]
pub struct DecodedImage {
    image: DynamicImage,
    mode: ColorMode,
}

impl DecodedImage {
    /// Decode bytes, recognising the container from its signature
    ///
    /// # Errors
    /// - `EditorError::Decode` when the bytes are not a supported raster
    pub fn decode(bytes: &[u8], origin: &str) -> Result<Self> {
        let format =
            image::guess_format(bytes).map_err(|e| EditorError::decode_error(origin, &e))?;
        let image = image::load_from_memory_with_format(bytes, format)
            .map_err(|e| EditorError::decode_error(origin, &e))?;
        let indexed = is_indexed_container(bytes, format);
        Ok(Self::with_indexed_flag(image, indexed))
    }

    /// Wrap pixels whose mode follows from their layout
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::with_indexed_flag(image, false)
    }

    /// Wrap pixels expanded from an indexed source
    pub fn from_palette(image: DynamicImage) -> Self {
        Self::with_indexed_flag(image, true)
    }

    fn with_indexed_flag(image: DynamicImage, indexed: bool) -> Self {
        let mode = if indexed {
            ColorMode::Palette
        } else {
            ColorMode::from_pixels(&image)
        };
        Self {
            image: to_eight_bit(image, mode),
            mode,
        }
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }
}

/// Collapse 16-bit and float buffers to 8 bits per channel, keeping the layout
fn to_eight_bit(image: DynamicImage, mode: ColorMode) -> DynamicImage {
    if matches!(
        image,
        DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_)
    ) {
        return image;
    }
    match mode {
        ColorMode::Grayscale => DynamicImage::ImageLuma8(image.to_luma8()),
        ColorMode::GrayscaleAlpha => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        ColorMode::Rgb => DynamicImage::ImageRgb8(image.to_rgb8()),
        ColorMode::Rgba | ColorMode::Palette => DynamicImage::ImageRgba8(image.to_rgba8()),
    }
}

/// Whether the container stores palette indices rather than direct color
///
/// The decoder expands indices to RGB(A), so the header is inspected directly.
fn is_indexed_container(bytes: &[u8], format: ImageFormat) -> bool {
    match format {
        ImageFormat::Gif => true,
        // IHDR color type sits at byte 25; 3 = indexed
        ImageFormat::Png => bytes.get(25) == Some(&3),
        ImageFormat::Bmp => bmp_bits_per_pixel(bytes).is_some_and(|bpp| bpp <= 8),
        _ => false,
    }
}

fn bmp_bits_per_pixel(bytes: &[u8]) -> Option<u16> {
    let header_size = u32::from_le_bytes(bytes.get(14..18)?.try_into().ok()?);
    // OS/2 core headers store the bit count two bytes earlier
    let offset = if header_size == 12 { 24 } else { 28 };
    Some(u16::from_le_bytes(bytes.get(offset..offset + 2)?.try_into().ok()?))
}
