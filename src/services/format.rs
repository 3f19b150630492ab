//! Color-mode normalization and re-encoding
//!
//! Only JPEG lacks an alpha channel among the supported targets, so flattening
//! onto white happens for exactly that family. Every other target keeps alpha
//! and only indexed images are widened to RGBA.

use crate::{
    config::{BackgroundFormat, TargetEncoding, DEFAULT_JPEG_QUALITY},
    error::{EditorError, Result},
    types::{ColorMode, DecodedImage},
};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use std::io::Cursor;

/// What happens to an image before it reaches the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationAction {
    /// Composite onto an opaque white canvas (indexed images promoted first)
    FlattenOnWhite,
    /// Expand to RGBA
    PromoteToRgba,
    /// Hand the pixels to the encoder as they are
    Keep,
}

impl NormalizationAction {
    /// Decision table over `(source mode, target is JPEG-family)`
    pub fn plan(mode: ColorMode, jpeg_family: bool) -> Self {
        match (mode, jpeg_family) {
            (ColorMode::GrayscaleAlpha | ColorMode::Rgba | ColorMode::Palette, true) => {
                Self::FlattenOnWhite
            },
            (ColorMode::Grayscale | ColorMode::Rgb, true) => Self::Keep,
            (ColorMode::Palette, false) => Self::PromoteToRgba,
            (
                ColorMode::Grayscale | ColorMode::GrayscaleAlpha | ColorMode::Rgb | ColorMode::Rgba,
                false,
            ) => Self::Keep,
        }
    }
}

/// Encoded output ready to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Converts decoded images into a target encoding
#[derive(Debug, Clone, Copy)]
pub struct FormatConverter {
    jpeg_quality: u8,
}

impl Default for FormatConverter {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl FormatConverter {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Normalize the color mode for `target` and encode
    ///
    /// # Errors
    /// - `EditorError::Encode` if the encoder rejects the image
    pub fn convert(&self, image: DecodedImage, target: TargetEncoding) -> Result<EncodedImage> {
        let mode = image.mode();
        let action = NormalizationAction::plan(mode, target.is_jpeg_family());
        log::debug!(
            "Converting {}x{} {} image to {} ({:?})",
            image.width(),
            image.height(),
            mode,
            target,
            action
        );

        let normalized = Self::normalize(image, target);
        let bytes = self.encode(&normalized, target.image_format())?;
        Ok(EncodedImage {
            bytes,
            extension: target.extension(),
            width: normalized.width(),
            height: normalized.height(),
        })
    }

    /// Apply the normalization the decision table picks for `target`
    pub fn normalize(image: DecodedImage, target: TargetEncoding) -> DynamicImage {
        let mode = image.mode();
        match NormalizationAction::plan(mode, target.is_jpeg_family()) {
            NormalizationAction::FlattenOnWhite => {
                DynamicImage::ImageRgb8(flatten_onto_white(&image.into_image()))
            },
            NormalizationAction::PromoteToRgba => {
                DynamicImage::ImageRgba8(image.into_image().to_rgba8())
            },
            NormalizationAction::Keep => image.into_image(),
        }
    }

    /// Encode background removal output; WebP is always lossless
    ///
    /// # Errors
    /// - `EditorError::Encode` if the encoder rejects the image
    pub fn encode_background(
        &self,
        image: &DynamicImage,
        format: BackgroundFormat,
    ) -> Result<EncodedImage> {
        let bytes = self.encode(image, format.image_format())?;
        Ok(EncodedImage {
            bytes,
            extension: format.extension(),
            width: image.width(),
            height: image.height(),
        })
    }

    fn encode(&self, image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
        let image = widen_for_encoder(image, format);
        let mut bytes = Vec::new();
        let mut cursor = Cursor::new(&mut bytes);

        let result = match format {
            ImageFormat::Jpeg => {
                image.write_with_encoder(JpegEncoder::new_with_quality(&mut cursor, self.jpeg_quality))
            },
            ImageFormat::WebP => image.write_with_encoder(WebPEncoder::new_lossless(&mut cursor)),
            other => image.write_to(&mut cursor, other),
        };
        result.map_err(|e| EditorError::encode_error(format_name(format), &e))?;

        log::debug!("Encoded {} bytes as {}", bytes.len(), format_name(format));
        Ok(bytes)
    }
}

/// Composite onto solid white using the alpha channel as the mask
///
/// Images without alpha overwrite the canvas unchanged.
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba: RgbaImage = image.to_rgba8();
    let mut canvas = RgbImage::from_pixel(rgba.width(), rgba.height(), Rgb([255, 255, 255]));
    for (source, target) in rgba.pixels().zip(canvas.pixels_mut()) {
        let [r, g, b, alpha] = source.0;
        *target = Rgb([
            blend_over_white(r, alpha),
            blend_over_white(g, alpha),
            blend_over_white(b, alpha),
        ]);
    }
    canvas
}

fn blend_over_white(channel: u8, alpha: u8) -> u8 {
    let (channel, alpha) = (u32::from(channel), u32::from(alpha));
    ((channel * alpha + 255 * (255 - alpha) + 127) / 255) as u8
}

/// Losslessly widen layouts an encoder cannot take (GIF has no gray, TIFF no gray+alpha)
fn widen_for_encoder(image: &DynamicImage, format: ImageFormat) -> std::borrow::Cow<'_, DynamicImage> {
    use std::borrow::Cow;

    match (format, image) {
        (ImageFormat::Gif, DynamicImage::ImageLuma8(_)) => {
            Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8()))
        },
        (ImageFormat::Gif | ImageFormat::Tiff, DynamicImage::ImageLumaA8(_)) => {
            Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8()))
        },
        _ => Cow::Borrowed(image),
    }
}

fn format_name(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "PNG",
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::WebP => "WEBP",
        ImageFormat::Gif => "GIF",
        ImageFormat::Bmp => "BMP",
        ImageFormat::Tiff => "TIFF",
        _ => "unknown",
    }
}
