use core::time::Duration;

use burn::config::Config;

use crate::model::weights::{MobileNetV2, WeightsMeta};

/// Detector settings.
///
/// Saved and loaded as JSON with [`Config::save`] / [`Config::load`].
#[derive(Config, Debug)]
pub struct DetectorConfig {
    /// Location of the PyTorch checkpoint fetched at startup.
    pub model_url: String,

    /// Number of outputs of the checkpoint's classification head.
    #[config(default = "1000")]
    pub num_classes: usize,

    /// Number of ranked predictions kept (primary + alternatives).
    #[config(default = "3")]
    pub top_k: usize,

    /// Side of the square model input.
    #[config(default = "224")]
    pub input_size: usize,

    /// Artificial latency of the demo fallback, in milliseconds.
    #[config(default = "2000")]
    pub demo_delay_ms: u64,

    /// Local checkpoint used instead of downloading `model_url`.
    pub checkpoint: Option<String>,
}

impl DetectorConfig {
    /// Configuration for the published MobileNetV2 ImageNet weights.
    pub fn mobilenet_v2() -> Self {
        let weights = MobileNetV2::ImageNet1kV2.weights();
        Self::new(weights.url.to_string()).with_num_classes(weights.num_classes)
    }

    pub fn demo_delay(&self) -> Duration {
        Duration::from_millis(self.demo_delay_ms)
    }
}
