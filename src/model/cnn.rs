//! Convolutional image classifier
//!
//! Four conv blocks (conv, batch norm, ReLU, 2x2 max pool) with doubling
//! filter counts, global average pooling and a two-layer head. Input is
//! `[batch, 3, height, width]`; any spatial size works thanks to the
//! adaptive pool, so the declared input size lives in the config only.

use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// Configuration for [`LeafCnn`]
#[derive(Config, Debug)]
pub struct LeafCnnConfig {
    /// Number of output classes
    #[config(default = "3")]
    pub num_classes: usize,

    /// Square input size the weights were trained at, if known
    pub input_size: Option<usize>,

    /// Dropout rate of the head (inactive outside autodiff backends)
    #[config(default = "0.3")]
    pub dropout_rate: f64,

    /// Number of input channels
    #[config(default = "3")]
    pub in_channels: usize,

    /// Filters of the first block; doubled per block
    #[config(default = "32")]
    pub base_filters: usize,

    /// Width of the hidden fully connected layer
    #[config(default = "256")]
    pub hidden_size: usize,
}

/// Conv2d + BatchNorm + ReLU + MaxPool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
    relu: Relu,
    pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(in_channels: usize, out_channels: usize, device: &B::Device) -> Self {
        Self {
            conv: Conv2dConfig::new([in_channels, out_channels], [3, 3])
                .with_padding(PaddingConfig2d::Same)
                .init(device),
            bn: BatchNormConfig::new(out_channels).init(device),
            relu: Relu::new(),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);
        self.pool.forward(x)
    }
}

/// Leaf / pest image classifier
#[derive(Module, Debug)]
pub struct LeafCnn<B: Backend> {
    blocks: Vec<ConvBlock<B>>,
    global_pool: AdaptiveAvgPool2d,
    fc1: Linear<B>,
    relu: Relu,
    dropout: Dropout,
    fc2: Linear<B>,
}

impl LeafCnnConfig {
    /// Build the network with freshly initialized weights
    pub fn init<B: Backend>(&self, device: &B::Device) -> LeafCnn<B> {
        let base = self.base_filters;
        let widths = [base, base * 2, base * 4, base * 8];

        let mut blocks = Vec::with_capacity(widths.len());
        let mut in_channels = self.in_channels;
        for &out_channels in &widths {
            blocks.push(ConvBlock::new(in_channels, out_channels, device));
            in_channels = out_channels;
        }

        LeafCnn {
            blocks,
            global_pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc1: LinearConfig::new(in_channels, self.hidden_size).init(device),
            relu: Relu::new(),
            dropout: DropoutConfig::new(self.dropout_rate).init(),
            fc2: LinearConfig::new(self.hidden_size, self.num_classes).init(device),
        }
    }
}

impl<B: Backend> LeafCnn<B> {
    /// `[batch, channels, height, width]` -> logits `[batch, num_classes]`
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = x;
        for block in &self.blocks {
            x = block.forward(x);
        }

        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc1.forward(x);
        let x = self.relu.forward(x);
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }
}
