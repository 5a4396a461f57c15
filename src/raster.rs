// Card rasterization: SVG markup to pixels via resvg

use std::io::Write;

use ::image::codecs::jpeg::JpegEncoder;
use ::image::{Rgba, RgbaImage, RgbImage};
use resvg::{tiny_skia, usvg};

use crate::card::{CARD_HEIGHT_PX, CARD_WIDTH_PX};
use crate::error::AppError;

/// Output sharpness multiplier over the 96 DPI card grid
pub const RASTER_SCALE: f32 = 2.0;

/// 1584 x 1008 pixels
pub const RASTER_WIDTH_PX: u32 = (CARD_WIDTH_PX * RASTER_SCALE) as u32;
pub const RASTER_HEIGHT_PX: u32 = (CARD_HEIGHT_PX * RASTER_SCALE) as u32;

pub const JPEG_QUALITY: u8 = 90;

pub struct Rasterizer {
    options: usvg::Options<'static>,
}

impl Default for Rasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Rasterizer {
    /// Loads system fonts once; every card rendered afterwards shares them.
    pub fn new() -> Self {
        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();

        if options.fontdb.is_empty() {
            tracing::warn!("No system fonts found, card text will not be drawn");
        }

        Self { options }
    }

    /// Renders card markup at the fixed export resolution. Pixels keep their
    /// transparency.
    pub fn rasterize(&self, svg: &str) -> Result<RgbaImage, AppError> {
        let tree = usvg::Tree::from_str(svg, &self.options)
            .map_err(|e| AppError::RasterError(format!("SVG parsing failed: {}", e)))?;

        let mut pixmap = tiny_skia::Pixmap::new(RASTER_WIDTH_PX, RASTER_HEIGHT_PX).ok_or_else(|| {
            AppError::RasterError(format!(
                "Failed to create pixmap ({}x{})",
                RASTER_WIDTH_PX, RASTER_HEIGHT_PX
            ))
        })?;

        let size = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            RASTER_WIDTH_PX as f32 / size.width(),
            RASTER_HEIGHT_PX as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let mut image = RgbaImage::new(RASTER_WIDTH_PX, RASTER_HEIGHT_PX);
        for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
            let c = src.demultiply();
            *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
        }

        Ok(image)
    }
}

/// Composites against a white background, dropping the alpha channel.
pub fn flatten_onto_white(rgba_image: &RgbaImage) -> RgbImage {
    let (width_px, height_px) = rgba_image.dimensions();
    let mut rgb_image = RgbImage::new(width_px, height_px);

    for (x, y, pixel) in rgba_image.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = a as f32 / 255.0;
        let bg = 255.0;
        let out_r = (r as f32 * alpha + bg * (1.0 - alpha)).round() as u8;
        let out_g = (g as f32 * alpha + bg * (1.0 - alpha)).round() as u8;
        let out_b = (b as f32 * alpha + bg * (1.0 - alpha)).round() as u8;
        rgb_image.put_pixel(x, y, ::image::Rgb([out_r, out_g, out_b]));
    }

    rgb_image
}

pub fn write_jpeg<W: Write>(image: &RgbImage, writer: W) -> Result<(), AppError> {
    let mut encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
    encoder
        .encode_image(image)
        .map_err(|e| AppError::RasterError(format!("JPEG encoding failed: {}", e)))
}
