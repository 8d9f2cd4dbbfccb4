use std::sync::Arc;

use burn::tensor::{backend::Backend, Device, Tensor, TensorData};
use image::{imageops, imageops::FilterType, RgbImage};

use crate::{
    error::{InferenceError, Result},
    ledger::{BufferLedger, Tracked},
};

/// Side of the square model input.
pub const INPUT_SIZE: usize = 224;

fn to_tensor<B: Backend>(image: &RgbImage, device: &Device<B>) -> Tensor<B, 4> {
    let (width, height) = image.dimensions();
    let data = image
        .as_raw()
        .iter()
        .map(|&v| v as f32)
        .collect::<Vec<_>>();

    // [B, H, W, C]
    Tensor::<B, 4>::from_data(
        TensorData::new(data, [1, height as usize, width as usize, 3]),
        device,
    )
}

/// Turn a decoded RGB image into the `[1, size, size, 3]` model input.
///
/// The image is resized with a bilinear filter and every channel is rescaled from
/// `[0, 255]` to `[-1, 1]`.
pub fn preprocess<B: Backend>(
    image: &RgbImage,
    size: usize,
    ledger: &Arc<BufferLedger>,
    device: &Device<B>,
) -> Result<Tracked<B, 4>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(InferenceError::EmptyImage { width, height });
    }

    let resized = if (width as usize, height as usize) == (size, size) {
        image.clone()
    } else {
        // Triangle is bilinear in 2D
        imageops::resize(image, size as u32, size as u32, FilterType::Triangle)
    };

    let pixels = ledger.track(to_tensor::<B>(&resized, device));
    Ok(pixels.map(|x| x.div_scalar(127.5).sub_scalar(1.0)))
}
