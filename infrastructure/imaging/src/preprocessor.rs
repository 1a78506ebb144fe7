use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use business::domain::identification::errors::FailureReason;
use business::domain::identification::services::ImagePreprocessor;
use business::domain::identification::value_objects::{CapturedImage, ImagePayload};

pub const DEFAULT_MAX_DIMENSION: u32 = 1000;
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

const JPEG_MIME_TYPE: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreprocessorConfig {
    /// Upper bound for the larger side of the uploaded image, in pixels.
    pub max_dimension: u32,
    /// JPEG quality between 1 and 100.
    pub jpeg_quality: u8,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Decodes any supported photo format, bounds its size and re-encodes it
/// as JPEG for upload.
#[derive(Debug, Clone, Default)]
pub struct JpegImagePreprocessor {
    config: PreprocessorConfig,
}

impl JpegImagePreprocessor {
    pub fn new(config: PreprocessorConfig) -> Self {
        Self { config }
    }

    /// Scales `(width, height)` so the larger side fits `max_dimension`,
    /// keeping the aspect ratio. Images that already fit are left alone.
    fn bounded_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
        let larger = width.max(height);
        if larger <= max_dimension {
            return (width, height);
        }

        let factor = max_dimension as f64 / larger as f64;
        let scale = |side: u32| ((side as f64 * factor).round() as u32).clamp(1, max_dimension);
        (scale(width), scale(height))
    }

    fn resize(&self, image: DynamicImage) -> DynamicImage {
        let (width, height) = image.dimensions();
        let (target_width, target_height) =
            Self::bounded_dimensions(width, height, self.config.max_dimension.max(1));

        if (target_width, target_height) == (width, height) {
            image
        } else {
            image.resize_exact(target_width, target_height, FilterType::Triangle)
        }
    }
}

impl ImagePreprocessor for JpegImagePreprocessor {
    fn prepare(&self, image: &CapturedImage) -> Result<ImagePayload, FailureReason> {
        if image.is_empty() {
            return Err(FailureReason::InvalidImage);
        }

        let decoded =
            image::load_from_memory(image.bytes()).map_err(|_| FailureReason::InvalidImage)?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(FailureReason::InvalidImage);
        }

        // JPEG carries no alpha channel
        let rgb = self.resize(decoded).to_rgb8();

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.config.jpeg_quality.clamp(1, 100))
            .encode_image(&rgb)
            .map_err(|_| FailureReason::InvalidImage)?;

        Ok(ImagePayload::new(
            bytes,
            JPEG_MIME_TYPE,
            rgb.width(),
            rgb.height(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> CapturedImage {
        let image = RgbaImage::from_pixel(width, height, Rgba([120, 80, 40, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        CapturedImage::new(bytes)
    }

    #[test]
    fn should_downscale_landscape_image_to_max_dimension() {
        let payload = JpegImagePreprocessor::default()
            .prepare(&png(2000, 1500))
            .unwrap();

        assert_eq!((payload.width(), payload.height()), (1000, 750));
        assert_eq!(payload.mime_type(), "image/jpeg");

        let decoded = image::load_from_memory(payload.bytes()).unwrap();
        assert_eq!(decoded.dimensions(), (1000, 750));
    }

    #[test]
    fn should_downscale_portrait_image_preserving_aspect_ratio() {
        let payload = JpegImagePreprocessor::default()
            .prepare(&png(600, 1800))
            .unwrap();

        assert_eq!((payload.width(), payload.height()), (333, 1000));
    }

    #[test]
    fn should_not_upscale_small_image() {
        let payload = JpegImagePreprocessor::default()
            .prepare(&png(400, 300))
            .unwrap();

        assert_eq!((payload.width(), payload.height()), (400, 300));
    }

    #[test]
    fn should_respect_configured_max_dimension() {
        let preprocessor = JpegImagePreprocessor::new(PreprocessorConfig {
            max_dimension: 256,
            ..PreprocessorConfig::default()
        });

        let payload = preprocessor.prepare(&png(1024, 512)).unwrap();

        assert_eq!((payload.width(), payload.height()), (256, 128));
    }

    #[test]
    fn should_reject_empty_image() {
        let result = JpegImagePreprocessor::default().prepare(&CapturedImage::new(Vec::new()));

        assert_eq!(result, Err(FailureReason::InvalidImage));
    }

    #[test]
    fn should_reject_undecodable_bytes() {
        let result = JpegImagePreprocessor::default()
            .prepare(&CapturedImage::new(b"definitely not a photo".to_vec()));

        assert_eq!(result, Err(FailureReason::InvalidImage));
    }

    #[test]
    fn should_produce_identical_payload_for_identical_input() {
        let preprocessor = JpegImagePreprocessor::default();
        let image = png(1200, 900);

        let first = preprocessor.prepare(&image).unwrap();
        let second = preprocessor.prepare(&image).unwrap();

        assert_eq!(first.reference(), second.reference());
    }

    #[test]
    fn should_keep_at_least_one_pixel_for_extreme_aspect_ratio() {
        assert_eq!(
            JpegImagePreprocessor::bounded_dimensions(10_000, 2, 1000),
            (1000, 1)
        );
    }
}
