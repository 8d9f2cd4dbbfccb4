use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        BatchNorm, BatchNormConfig, PaddingConfig2d,
    },
    tensor::{activation::relu, backend::Backend, Tensor},
};

/// Convolution followed by batch norm and an optional ReLU6.
#[derive(Module, Debug)]
pub struct ConvNorm<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
    relu6: bool,
}

impl<B: Backend> ConvNorm<B> {
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.norm.forward(self.conv.forward(input));
        if self.relu6 {
            relu(x).clamp_max(6)
        } else {
            x
        }
    }
}

#[derive(Config, Debug)]
pub struct ConvNormConfig {
    pub in_channels: usize,
    pub out_channels: usize,

    #[config(default = "3")]
    pub kernel_size: usize,

    #[config(default = "1")]
    pub stride: usize,

    #[config(default = "1")]
    pub groups: usize,

    #[config(default = true)]
    pub relu6: bool,
}

impl ConvNormConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> ConvNorm<B> {
        let padding = (self.kernel_size - 1) / 2;
        ConvNorm {
            conv: Conv2dConfig::new(
                [self.in_channels, self.out_channels],
                [self.kernel_size, self.kernel_size],
            )
            .with_stride([self.stride, self.stride])
            .with_padding(PaddingConfig2d::Explicit(padding, padding))
            .with_groups(self.groups)
            .with_bias(false)
            .init(device),
            norm: BatchNormConfig::new(self.out_channels).init(device),
            relu6: self.relu6,
        }
    }
}

/// MobileNetV2 bottleneck: optional pointwise expansion, depthwise conv, linear projection.
#[derive(Module, Debug)]
pub struct InvertedResidual<B: Backend> {
    pw: Option<ConvNorm<B>>,
    dw: ConvNorm<B>,
    pw_linear: ConvNorm<B>,
    residual: bool,
}

impl<B: Backend> InvertedResidual<B> {
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut x = input.clone();
        if let Some(pw) = &self.pw {
            x = pw.forward(x);
        }
        let x = self.pw_linear.forward(self.dw.forward(x));

        if self.residual {
            x + input
        } else {
            x
        }
    }
}

#[derive(Config, Debug)]
pub struct InvertedResidualConfig {
    pub in_channels: usize,
    pub out_channels: usize,
    pub stride: usize,
    pub expand_ratio: usize,
}

impl InvertedResidualConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> InvertedResidual<B> {
        let hidden = self.in_channels * self.expand_ratio;
        let pw = (self.expand_ratio != 1).then(|| {
            ConvNormConfig::new(self.in_channels, hidden)
                .with_kernel_size(1)
                .init(device)
        });

        InvertedResidual {
            pw,
            dw: ConvNormConfig::new(hidden, hidden)
                .with_stride(self.stride)
                .with_groups(hidden)
                .init(device),
            pw_linear: ConvNormConfig::new(hidden, self.out_channels)
                .with_kernel_size(1)
                .with_relu6(false)
                .init(device),
            residual: self.stride == 1 && self.in_channels == self.out_channels,
        }
    }
}
