//! Deterministic preprocessing: shortest side → 256, center crop 224×224,
//! scale to [0, 1], per-channel ImageNet normalisation, NCHW layout.

use crate::error::InferenceResult;
use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use tract_onnx::prelude::tract_ndarray::Array4;

pub const RESIZE_SHORTEST: u32 = 256;
pub const CROP_SIZE: u32 = 224;
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

#[derive(Debug, Clone, Copy)]
pub struct ImagePreprocessor {
    pub resize_shortest: u32,
    pub crop: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self {
            resize_shortest: RESIZE_SHORTEST,
            crop: CROP_SIZE,
            mean: MEAN,
            std: STD,
        }
    }
}

impl ImagePreprocessor {
    /// Decode encoded image bytes (PNG, JPEG, …) and produce a `[1, 3, crop, crop]` tensor.
    pub fn from_bytes(&self, bytes: &[u8]) -> InferenceResult<Array4<f32>> {
        let img = image::load_from_memory(bytes)?;
        Ok(self.tensor(&img))
    }

    pub fn tensor(&self, img: &DynamicImage) -> Array4<f32> {
        let cropped = self.resize_and_crop(img);
        let size = self.crop as usize;
        Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
            let px = cropped.get_pixel(x as u32, y as u32);
            (px[c] as f32 / 255.0 - self.mean[c]) / self.std[c]
        })
    }

    /// Same pixels as "scale shortest side to `resize_shortest`, center crop `crop`",
    /// computed as a center window on the source image so only the window is resized.
    pub fn resize_and_crop(&self, img: &DynamicImage) -> RgbImage {
        let rgb = img.to_rgb8();
        let (left, top, side) =
            crop_window(rgb.width(), rgb.height(), self.resize_shortest, self.crop);
        let window = image::imageops::crop_imm(&rgb, left, top, side, side).to_image();
        image::imageops::resize(&window, self.crop, self.crop, FilterType::Triangle)
    }
}

/// Square source window `(left, top, side)` that maps onto the final crop after the
/// shortest side is scaled to `shortest`. Always within the image, never empty.
pub fn crop_window(width: u32, height: u32, shortest: u32, crop: u32) -> (u32, u32, u32) {
    let (width, height) = (width.max(1), height.max(1));
    let short = width.min(height);
    let exact = u64::from(short) * u64::from(crop.min(shortest)) / u64::from(shortest.max(1));
    let side = u32::try_from(exact).unwrap_or(short).clamp(1, short);
    (center_offset(width, side), center_offset(height, side), side)
}

/// Half the slack, rounded half up.
fn center_offset(full: u32, part: u32) -> u32 {
    (full - part).div_ceil(2)
}
