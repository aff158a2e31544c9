//! Library-based image encoder implementation.

use image::codecs::avif::AvifEncoder;
use image::DynamicImage;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

use super::error::ConverterError;
use super::traits::ImageEncoder;
use super::types::{ImageConfig, ImageFormat};

/// AVIF encode speed, 1 (slowest/best) to 10. 6 trades well for batch work.
const AVIF_SPEED: u8 = 6;

/// Image encoder backed by the `image` and `webp` crates.
#[derive(Debug, Default, Clone)]
pub struct RasterEncoder;

impl RasterEncoder {
    /// Creates a new raster encoder.
    pub fn new() -> Self {
        Self
    }

    fn encode_webp(
        image: &DynamicImage,
        output: &Path,
        config: &ImageConfig,
    ) -> Result<(), ConverterError> {
        // libwebp only accepts 8-bit RGB/RGBA input.
        let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
        let encoder = webp::Encoder::from_image(&rgba)
            .map_err(|e| ConverterError::encode_failed(format!("WebP encoding failed: {}", e), None))?;

        let encoded = if config.lossless {
            encoder.encode_lossless()
        } else {
            encoder.encode(f32::from(config.quality))
        };

        std::fs::write(output, &*encoded)?;
        Ok(())
    }

    fn encode_avif(
        image: &DynamicImage,
        output: &Path,
        config: &ImageConfig,
    ) -> Result<(), ConverterError> {
        // The AVIF encoder exposes no lossless toggle; quality 100 is the
        // closest mapping, and quality 0 is rejected by the encoder.
        let quality = if config.lossless {
            100
        } else {
            config.quality.max(1)
        };

        let file = File::create(output)?;
        let writer = BufWriter::new(file);
        let encoder = AvifEncoder::new_with_speed_quality(writer, AVIF_SPEED, quality);
        let rgba = DynamicImage::ImageRgba8(image.to_rgba8());
        rgba.write_with_encoder(encoder)?;
        Ok(())
    }
}

impl ImageEncoder for RasterEncoder {
    fn name(&self) -> &str {
        "raster"
    }

    fn encode(
        &self,
        input: &Path,
        output: &Path,
        config: &ImageConfig,
    ) -> Result<(), ConverterError> {
        if !input.exists() {
            return Err(ConverterError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        let image = image::open(input)?;
        debug!(
            input = %input.display(),
            width = image.width(),
            height = image.height(),
            format = ?config.format,
            quality = config.quality,
            "Encoding image"
        );

        match config.format {
            ImageFormat::Webp => Self::encode_webp(&image, output, config),
            ImageFormat::Avif => Self::encode_avif(&image, output, config),
        }
    }
}
