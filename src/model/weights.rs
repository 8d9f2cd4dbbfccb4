/// Pre-trained weights metadata.
pub struct Weights {
    pub(crate) url: &'static str,
    pub(crate) num_classes: usize,
}

#[cfg(feature = "pretrained")]
mod downloader {
    use super::*;
    use crate::error::{LoadResult, ModelLoadError};
    use burn::data::network::downloader;
    use std::fs::{create_dir_all, File};
    use std::io::Write;
    use std::path::PathBuf;

    /// Download a checkpoint to the local cache directory, unless it is already there.
    pub fn download(url: &str) -> LoadResult<PathBuf> {
        // Model cache directory
        let model_dir = dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
            .ok_or_else(|| {
                ModelLoadError::Download("Could not find a cache directory".to_string())
            })?
            .join("crop-disease-burn");

        if !model_dir.exists() {
            create_dir_all(&model_dir)?;
        }

        let file_base_name = file_name(url);
        let file_name = model_dir.join(file_base_name);
        if !file_name.exists() {
            tracing::info!(url, "Downloading model weights");
            let bytes = downloader::download_file_as_bytes(url, file_base_name);
            if bytes.is_empty() {
                return Err(ModelLoadError::Download(format!("Empty response from {url}")));
            }

            let mut output_file = File::create(&file_name)?;
            output_file.write_all(&bytes)?;
        }

        Ok(file_name)
    }

    impl Weights {
        /// Download the pre-trained weights to the local cache directory.
        pub fn download(&self) -> LoadResult<PathBuf> {
            download(self.url)
        }
    }
}

#[cfg(feature = "pretrained")]
pub use downloader::download;

/// Last segment of a checkpoint URL.
pub fn file_name(url: &str) -> &str {
    url.rsplit_once('/').map(|(_, name)| name).unwrap_or(url)
}

pub trait WeightsMeta {
    fn weights(&self) -> Weights;
}

/// MobileNetV2 pre-trained weights.
pub enum MobileNetV2 {
    /// Torchvision ImageNet weights trained with the improved
    /// [recipe](https://pytorch.org/blog/how-to-train-state-of-the-art-models-using-torchvision-latest-primitives).
    /// Top-1 accuracy: 72.154%.
    /// Top-5 accuracy: 90.822%.
    ImageNet1kV2,
}

impl WeightsMeta for MobileNetV2 {
    fn weights(&self) -> Weights {
        match *self {
            MobileNetV2::ImageNet1kV2 => Weights {
                url: "https://download.pytorch.org/models/mobilenet_v2-7ebf99e0.pth",
                num_classes: 1000,
            },
        }
    }
}
