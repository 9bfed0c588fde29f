// src/services/image_processor.rs
use crate::config::Config;
use crate::errors::ScannerError;
use crate::models::{ImageValidation, NormalizedImage};
use base64::{Engine as _, engine::general_purpose};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::io::Reader as ImageReader;
use image::{ColorType, DynamicImage, GenericImageView, Rgb, RgbImage};
use std::collections::HashMap;
use std::io::Cursor;

const DOMINANT_THUMBNAIL: u32 = 150;
const DOMINANT_MAX_COLORS: usize = 256;
const DOMINANT_TOP: usize = 5;

pub struct ImageProcessor {
    max_dimension: u32,
    jpeg_quality: u8,
    max_bytes: usize,
    max_width: u32,
    max_height: u32,
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self {
            max_dimension: 2048,
            jpeg_quality: 85,
            max_bytes: 10 * 1024 * 1024,
            max_width: 4096,
            max_height: 4096,
        }
    }
}

impl ImageProcessor {
    pub fn new(config: &Config) -> Self {
        Self {
            max_dimension: config.max_image_dimension,
            jpeg_quality: config.jpeg_quality,
            max_bytes: config.max_image_size,
            max_width: config.max_image_width,
            max_height: config.max_image_height,
        }
    }

    /// Strips an optional `data:image/...;base64,` prefix and decodes the rest.
    pub fn decode_data_url(&self, image_data: &str) -> Result<Vec<u8>, ScannerError> {
        let payload = match image_data.strip_prefix("data:") {
            Some(rest) => rest
                .split_once(',')
                .map(|(_, data)| data)
                .ok_or_else(|| ScannerError::Decode("data URL has no payload".to_string()))?,
            None => image_data,
        };

        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        general_purpose::STANDARD
            .decode(cleaned)
            .map_err(|e| ScannerError::Decode(e.to_string()))
    }

    /// Size/dimension gate. Reports instead of failing so callers decide how
    /// to surface the rejection.
    pub fn validate_image_size(&self, image_data: &str) -> ImageValidation {
        match self.check_limits(image_data) {
            Ok(()) => ImageValidation {
                valid: true,
                reason: "Valid".to_string(),
            },
            Err(e) => ImageValidation {
                valid: false,
                reason: e.to_string(),
            },
        }
    }

    /// Byte and pixel ceilings, checked from the header without a full decode.
    pub fn check_limits(&self, image_data: &str) -> Result<(), ScannerError> {
        let bytes = self.decode_data_url(image_data)?;

        if bytes.len() > self.max_bytes {
            return Err(ScannerError::ImageTooLarge(format!(
                "Image size exceeds {} byte limit",
                self.max_bytes
            )));
        }

        let (width, height) = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| ScannerError::UnsupportedFormat(e.to_string()))?
            .into_dimensions()
            .map_err(|e| ScannerError::UnsupportedFormat(e.to_string()))?;

        if width > self.max_width || height > self.max_height {
            return Err(ScannerError::ImageTooLarge(format!(
                "Image dimensions exceed {}x{}px limit",
                self.max_width, self.max_height
            )));
        }

        Ok(())
    }

    /// Decode, flatten to RGB, clamp the longest edge and re-encode as JPEG.
    pub fn normalize(&self, image_data: &str) -> Result<NormalizedImage, ScannerError> {
        let bytes = self.decode_data_url(image_data)?;
        let original_size = bytes.len();

        let reader = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()
            .map_err(|e| ScannerError::UnsupportedFormat(e.to_string()))?;
        let original_format = reader
            .format()
            .map(|f| format!("{:?}", f).to_lowercase())
            .ok_or_else(|| {
                ScannerError::UnsupportedFormat("unrecognized image data".to_string())
            })?;
        let img = reader
            .decode()
            .map_err(|e| ScannerError::UnsupportedFormat(e.to_string()))?;

        let rgb = flatten_to_rgb(&img);
        let rgb = self.clamp_dimensions(rgb);
        let (width, height) = rgb.dimensions();

        let mut output = Vec::new();
        JpegEncoder::new_with_quality(&mut output, self.jpeg_quality)
            .encode(rgb.as_raw(), width, height, ColorType::Rgb8)
            .map_err(|e| {
                ScannerError::ImageProcessing(format!("Failed to encode image: {}", e))
            })?;

        Ok(NormalizedImage {
            data: output,
            media_type: "image/jpeg",
            width,
            height,
            original_format,
            original_size,
        })
    }

    /// Size gate, then normalisation. Oversized input never reaches the decoder.
    pub fn prepare(&self, image_data: &str) -> Result<NormalizedImage, ScannerError> {
        self.check_limits(image_data)?;
        self.normalize(image_data)
    }

    /// Full text-to-text transform used by the HTTP layer.
    pub fn process_image_data(&self, image_data: &str) -> Result<String, ScannerError> {
        let normalized = self.prepare(image_data)?;
        Ok(general_purpose::STANDARD.encode(normalized.data))
    }

    /// Up to five most frequent colours as `#rrggbb`. Images with more than
    /// 256 distinct colours after thumbnailing yield nothing.
    pub fn extract_dominant_colors(&self, image_data: &str) -> Vec<String> {
        let Ok(bytes) = self.decode_data_url(image_data) else {
            return Vec::new();
        };
        let Ok(img) = image::load_from_memory(&bytes) else {
            return Vec::new();
        };

        let (width, height) = img.dimensions();
        let thumb = if width > DOMINANT_THUMBNAIL || height > DOMINANT_THUMBNAIL {
            img.thumbnail(DOMINANT_THUMBNAIL, DOMINANT_THUMBNAIL).to_rgb8()
        } else {
            img.to_rgb8()
        };
        let mut counts: HashMap<[u8; 3], usize> = HashMap::new();
        for pixel in thumb.pixels() {
            *counts.entry(pixel.0).or_insert(0) += 1;
            if counts.len() > DOMINANT_MAX_COLORS {
                return Vec::new();
            }
        }

        let mut ranked: Vec<([u8; 3], usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked
            .into_iter()
            .take(DOMINANT_TOP)
            .map(|([r, g, b], _)| format!("#{:02x}{:02x}{:02x}", r, g, b))
            .collect()
    }

    fn clamp_dimensions(&self, rgb: RgbImage) -> RgbImage {
        let (width, height) = rgb.dimensions();
        if width.max(height) <= self.max_dimension {
            return rgb;
        }

        DynamicImage::ImageRgb8(rgb)
            .resize(self.max_dimension, self.max_dimension, FilterType::Lanczos3)
            .to_rgb8()
    }
}

/// Composites any alpha channel onto opaque white.
fn flatten_to_rgb(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let rgba = img.to_rgba8();
    let (width, height) = img.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        Rgb([blend(r), blend(g), blend(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn png_data_url(img: DynamicImage) -> String {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(buf)
        )
    }

    fn decode_output(encoded: &str) -> DynamicImage {
        let bytes = general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            ImageFormat::Jpeg
        );
        image::load_from_memory(&bytes).unwrap()
    }

    #[test]
    fn strips_data_url_prefix() {
        let processor = ImageProcessor::default();
        let bytes = processor
            .decode_data_url("data:image/png;base64,aGVsbG8=")
            .unwrap();
        assert_eq!(bytes, b"hello");
        assert_eq!(processor.decode_data_url("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn rejects_bad_base64_and_non_images() {
        let processor = ImageProcessor::default();
        assert!(matches!(
            processor.normalize("data:image/png;base64,@@not-base64@@"),
            Err(ScannerError::Decode(_))
        ));
        assert!(matches!(
            processor.normalize("data:image/png;base64,aGVsbG8gd29ybGQ="),
            Err(ScannerError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn transparent_pixels_become_white() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 0]));
        let processor = ImageProcessor::default();
        let out = decode_output(
            &processor
                .process_image_data(&png_data_url(DynamicImage::ImageRgba8(img)))
                .unwrap(),
        );

        assert_eq!(out.color(), ColorType::Rgb8);
        let pixel = out.to_rgb8().get_pixel(4, 4).0;
        assert!(pixel.iter().all(|&c| c > 245), "got {:?}", pixel);
    }

    #[test]
    fn downsamples_longest_edge_and_keeps_aspect() {
        let img = RgbImage::from_pixel(3000, 1500, Rgb([10, 120, 200]));
        let processor = ImageProcessor::default();
        let normalized = processor
            .normalize(&png_data_url(DynamicImage::ImageRgb8(img)))
            .unwrap();

        assert_eq!((normalized.width, normalized.height), (2048, 1024));
        assert_eq!(normalized.original_format, "png");
        assert_eq!(normalized.media_type, "image/jpeg");
    }

    #[test]
    fn second_pass_does_not_resize() {
        let img = RgbImage::from_pixel(2500, 400, Rgb([200, 30, 30]));
        let processor = ImageProcessor::default();
        let first = processor
            .normalize(&png_data_url(DynamicImage::ImageRgb8(img)))
            .unwrap();
        let again = processor
            .normalize(&general_purpose::STANDARD.encode(&first.data))
            .unwrap();

        assert_eq!(again.original_format, "jpeg");
        assert_eq!(
            (again.width, again.height),
            (first.width, first.height)
        );
    }

    #[test]
    fn validator_reports_oversized_images() {
        let processor = ImageProcessor {
            max_width: 64,
            max_height: 64,
            ..ImageProcessor::default()
        };
        let wide = png_data_url(DynamicImage::ImageRgb8(RgbImage::new(100, 10)));
        let check = processor.validate_image_size(&wide);
        assert!(!check.valid);
        assert!(check.reason.contains("dimensions"));

        let small = png_data_url(DynamicImage::ImageRgb8(RgbImage::new(10, 10)));
        assert_eq!(
            processor.validate_image_size(&small),
            ImageValidation {
                valid: true,
                reason: "Valid".to_string()
            }
        );

        let tiny_budget = ImageProcessor {
            max_bytes: 16,
            ..ImageProcessor::default()
        };
        let check = tiny_budget.validate_image_size(&small);
        assert!(!check.valid);
        assert!(check.reason.contains("size"));
    }

    #[test]
    fn limit_errors_keep_their_kind() {
        let processor = ImageProcessor::default();
        assert!(matches!(
            processor.check_limits("data:image/png;base64,%%%"),
            Err(ScannerError::Decode(_))
        ));
        assert!(matches!(
            processor.check_limits("data:image/png;base64,aGVsbG8gd29ybGQ="),
            Err(ScannerError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn process_image_data_applies_size_gate() {
        let processor = ImageProcessor {
            max_width: 8,
            ..ImageProcessor::default()
        };
        let wide = png_data_url(DynamicImage::ImageRgb8(RgbImage::new(16, 4)));
        assert!(matches!(
            processor.process_image_data(&wide),
            Err(ScannerError::ImageTooLarge(_))
        ));

        let narrow = png_data_url(DynamicImage::ImageRgb8(RgbImage::new(8, 4)));
        let out = decode_output(&processor.process_image_data(&narrow).unwrap());
        assert_eq!((out.width(), out.height()), (8, 4));
    }

    #[test]
    fn dominant_colors_ranked_by_frequency() {
        let mut img = RgbImage::from_pixel(20, 20, Rgb([255, 0, 0]));
        for x in 0..20 {
            for y in 0..5 {
                img.put_pixel(x, y, Rgb([0, 0, 255]));
            }
        }
        let processor = ImageProcessor::default();
        let colors = processor.extract_dominant_colors(&png_data_url(DynamicImage::ImageRgb8(img)));
        assert_eq!(colors, vec!["#ff0000", "#0000ff"]);

        assert!(processor.extract_dominant_colors("not an image").is_empty());
    }
}
