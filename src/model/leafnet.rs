use core::cmp::max;
use std::path::Path;

use burn::{
    config::Config,
    module::Module,
    nn::{
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig},
        Dropout, DropoutConfig, Linear, LinearConfig,
    },
    record::{FullPrecisionSettings, Recorder},
    tensor::{activation::softmax, backend::Backend, Device, Tensor},
};
use burn_import::pytorch::{LoadArgs, PyTorchFileRecorder};

use super::blocks::{ConvNorm, ConvNormConfig, InvertedResidual, InvertedResidualConfig};
use crate::error::{self, InferenceError, LoadResult, ModelLoadError};

#[cfg(feature = "pretrained")]
use super::weights::{self, WeightsMeta};

/// Bottleneck layout: expansion factor, channels, repeats, first stride.
const BOTTLENECKS: [[usize; 4]; 7] = [
    [1, 16, 1, 1],
    [6, 24, 2, 2],
    [6, 32, 3, 2],
    [6, 64, 4, 2],
    [6, 96, 3, 1],
    [6, 160, 3, 2],
    [6, 320, 1, 1],
];
/// Channel counts are rounded to a multiple of this number.
const ROUND_NEAREST: usize = 8;
const STEM_CHANNELS: usize = 32;
const HEAD_CHANNELS: usize = 1280;

/// Anything that turns a `[batch, height, width, 3]` image tensor into class probabilities.
pub trait Classifier<B: Backend> {
    /// Returns a `[batch, num_classes]` tensor of probabilities.
    fn predict(&self, input: Tensor<B, 4>) -> error::Result<Tensor<B, 2>>;
}

/// MobileNetV2 leaf classifier.
#[derive(Module, Debug)]
pub struct LeafNet<B: Backend> {
    stem: ConvNorm<B>,
    blocks: Vec<InvertedResidual<B>>,
    head: ConvNorm<B>,
    avg_pool: AdaptiveAvgPool2d,
    dropout: Dropout,
    classifier: Linear<B>,
}

impl<B: Backend> LeafNet<B> {
    /// Raw class scores for a `[batch, 3, height, width]` input.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = self.stem.forward(input);
        for block in &self.blocks {
            x = block.forward(x);
        }
        let x = self.avg_pool.forward(self.head.forward(x));
        // [B, C, 1, 1] -> [B, C]
        let x = x.flatten(1, 3);

        self.classifier.forward(self.dropout.forward(x))
    }

    /// Load a torchvision MobileNetV2 `state_dict` checkpoint.
    pub fn from_checkpoint(
        path: impl AsRef<Path>,
        config: &LeafNetConfig,
        device: &Device<B>,
    ) -> LoadResult<Self> {
        let record = PyTorchFileRecorder::<FullPrecisionSettings>::default()
            .load(checkpoint_args(path.as_ref()), device)
            .map_err(|err| ModelLoadError::Record(err.to_string()))?;

        Ok(config.init(device).load_record(record))
    }

    /// MobileNetV2 from [`MobileNetV2: Inverted Residuals and Linear Bottlenecks`](https://arxiv.org/abs/1801.04381)
    /// with pre-trained weights, downloaded to the local cache on first use.
    #[cfg(feature = "pretrained")]
    pub fn pretrained(weights: weights::MobileNetV2, device: &Device<B>) -> LoadResult<Self> {
        let weights = weights.weights();
        let path = weights.download()?;
        let config = LeafNetConfig::new().with_num_classes(weights.num_classes);
        Self::from_checkpoint(path, &config, device)
    }
}

impl<B: Backend> Classifier<B> for LeafNet<B> {
    fn predict(&self, input: Tensor<B, 4>) -> error::Result<Tensor<B, 2>> {
        let [_, _, _, channels] = input.dims();
        if channels != 3 {
            return Err(InferenceError::Prediction(format!(
                "expected 3 input channels, got {channels}"
            )));
        }

        // [B, H, W, C] -> [B, C, H, W]
        let logits = self.forward(input.permute([0, 3, 1, 2]));
        Ok(softmax(logits, 1))
    }
}

/// Map torchvision parameter names onto the [`LeafNet`] module tree.
fn checkpoint_args(path: &Path) -> LoadArgs {
    let last = BOTTLENECKS.iter().map(|[_, _, n, _]| n).sum::<usize>() + 1;

    let mut args = LoadArgs::new(path.to_path_buf())
        .with_key_remap("^features\\.0\\.0\\.(.+)", "stem.conv.$1")
        .with_key_remap("^features\\.0\\.1\\.(.+)", "stem.norm.$1")
        .with_key_remap("^classifier\\.1\\.(.+)", "classifier.$1");

    // The first bottleneck has no expansion layer
    for (from, to) in [
        ("0.0", "dw.conv"),
        ("0.1", "dw.norm"),
        ("1", "pw_linear.conv"),
        ("2", "pw_linear.norm"),
    ] {
        args = args.with_key_remap(
            &format!("^features\\.1\\.conv\\.{}\\.(.+)", from.replace('.', "\\.")),
            &format!("blocks.0.{to}.$1"),
        );
    }
    for i in 2..last {
        for (from, to) in [
            ("0.0", "pw.conv"),
            ("0.1", "pw.norm"),
            ("1.0", "dw.conv"),
            ("1.1", "dw.norm"),
            ("2", "pw_linear.conv"),
            ("3", "pw_linear.norm"),
        ] {
            args = args.with_key_remap(
                &format!("^features\\.{i}\\.conv\\.{}\\.(.+)", from.replace('.', "\\.")),
                &format!("blocks.{}.{to}.$1", i - 1),
            );
        }
    }

    args.with_key_remap(&format!("^features\\.{last}\\.0\\.(.+)"), "head.conv.$1")
        .with_key_remap(&format!("^features\\.{last}\\.1\\.(.+)"), "head.norm.$1")
}

/// [LeafNet](LeafNet) configuration.
#[derive(Config, Debug)]
pub struct LeafNetConfig {
    #[config(default = "1000")]
    pub num_classes: usize,

    #[config(default = "1.0")]
    pub width_mult: f32,

    #[config(default = "0.2")]
    pub dropout: f64,
}

impl LeafNetConfig {
    /// Initialize a [LeafNet](LeafNet) with random weights.
    pub fn init<B: Backend>(&self, device: &B::Device) -> LeafNet<B> {
        let mut in_channels = make_divisible(STEM_CHANNELS as f32 * self.width_mult);
        let head_channels = make_divisible(HEAD_CHANNELS as f32 * f32::max(1.0, self.width_mult));

        let stem = ConvNormConfig::new(3, in_channels)
            .with_stride(2)
            .init(device);

        let mut blocks = Vec::new();
        for [t, c, n, s] in BOTTLENECKS {
            let out_channels = make_divisible(c as f32 * self.width_mult);
            for i in 0..n {
                let stride = if i == 0 { s } else { 1 };
                blocks.push(
                    InvertedResidualConfig::new(in_channels, out_channels, stride, t).init(device),
                );
                in_channels = out_channels;
            }
        }

        let head = ConvNormConfig::new(in_channels, head_channels)
            .with_kernel_size(1)
            .init(device);

        LeafNet {
            stem,
            blocks,
            head,
            avg_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            dropout: DropoutConfig::new(self.dropout).init(),
            classifier: LinearConfig::new(head_channels, self.num_classes).init(device),
        }
    }
}

fn make_divisible(v: f32) -> usize {
    let rounded = (v + ROUND_NEAREST as f32 / 2.0) as usize / ROUND_NEAREST * ROUND_NEAREST;
    let rounded = max(rounded, ROUND_NEAREST);

    // Rounding down must not lose more than 10%
    if (rounded as f32) < 0.9 * v {
        rounded + ROUND_NEAREST
    } else {
        rounded
    }
}
