use crate::processing::regions::RegionOfInterest;
use crate::utils::{DocumentError, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat};
use imageproc::filter::filter3x3;
use log::debug;
use std::path::Path;
use tempfile::NamedTempFile;

/// Images whose long edge is below this are upscaled before OCR.
pub const UPSCALE_THRESHOLD: u32 = 1400;
pub const UPSCALE_FACTOR: f32 = 1.5;

// 3x3 sharpen: centre 32, neighbours -2, divisor 16
const SHARPEN_KERNEL: [f32; 9] = [
    -0.125, -0.125, -0.125,
    -0.125, 2.0, -0.125,
    -0.125, -0.125, -0.125,
];

pub struct ImageProcessor;

impl ImageProcessor {
    /// Decode an image from disk. A file that cannot be decoded is a hard
    /// input error, never an empty extraction.
    pub fn load(image_path: &Path) -> Result<DynamicImage> {
        let is_pdf = image_path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            return Err(DocumentError::ImageProcessingError(format!(
                "{} is a PDF; only raster images are read, export the page as PNG or JPEG",
                image_path.display()
            )));
        }
        image::open(image_path).map_err(|e| {
            DocumentError::ImageProcessingError(format!(
                "Failed to open image {}: {}",
                image_path.display(),
                e
            ))
        })
    }

    /// Grayscale, auto-contrast, sharpen, then upscale small scans.
    pub fn preprocess(img: &DynamicImage) -> GrayImage {
        let gray = img.to_luma8();
        let enhanced = Self::sharpen(&Self::auto_contrast(&gray));

        let (width, height) = enhanced.dimensions();
        if width.max(height) < UPSCALE_THRESHOLD {
            let new_width = (width as f32 * UPSCALE_FACTOR) as u32;
            let new_height = (height as f32 * UPSCALE_FACTOR) as u32;
            debug!(
                "Upscaling {}x{} to {}x{} before OCR",
                width, height, new_width, new_height
            );
            imageops::resize(&enhanced, new_width, new_height, FilterType::Lanczos3)
        } else {
            enhanced
        }
    }

    /// Contrast and sharpen a crop again without resizing it.
    pub fn clean_region(region: &GrayImage) -> GrayImage {
        Self::sharpen(&Self::auto_contrast(region))
    }

    pub fn crop(img: &GrayImage, region: &RegionOfInterest) -> GrayImage {
        let (width, height) = img.dimensions();
        let (x, y, w, h) = region.to_pixels(width, height);
        imageops::crop_imm(img, x, y, w, h).to_image()
    }

    /// Stretch the darkest pixel to 0 and the brightest to 255.
    fn auto_contrast(img: &GrayImage) -> GrayImage {
        let (mut lo, mut hi) = (u8::MAX, u8::MIN);
        for pixel in img.pixels() {
            lo = lo.min(pixel[0]);
            hi = hi.max(pixel[0]);
        }
        if hi <= lo {
            return img.clone();
        }

        let range = (hi - lo) as f32;
        let mut lut = [0u8; 256];
        for (value, slot) in lut.iter_mut().enumerate() {
            let v = value as f32;
            *slot = if v <= lo as f32 {
                0
            } else if v >= hi as f32 {
                255
            } else {
                ((v - lo as f32) * 255.0 / range).round() as u8
            };
        }

        let mut stretched = img.clone();
        for pixel in stretched.pixels_mut() {
            pixel[0] = lut[pixel[0] as usize];
        }
        stretched
    }

    fn sharpen(img: &GrayImage) -> GrayImage {
        filter3x3::<_, f32, u8>(img, &SHARPEN_KERNEL)
    }

    /// Write an image to a temporary PNG for engines that read from disk.
    /// The file lives as long as the returned handle.
    pub fn save_to_temp_file(img: &GrayImage) -> Result<NamedTempFile> {
        let temp_file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(|e| DocumentError::ImageProcessingError(e.to_string()))?;

        img.save_with_format(temp_file.path(), ImageFormat::Png)
            .map_err(|e| {
                DocumentError::ImageProcessingError(format!("Failed to encode temp image: {}", e))
            })?;

        Ok(temp_file)
    }
}
