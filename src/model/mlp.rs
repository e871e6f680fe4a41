//! Multilayer perceptron over tabular soil and weather features

use burn::{
    config::Config,
    module::Module,
    nn::{Linear, LinearConfig, Relu},
    tensor::{backend::Backend, Tensor},
};

/// Configuration for [`FeatureMlp`]
#[derive(Config, Debug)]
pub struct FeatureMlpConfig {
    /// Length of the input feature vector
    pub num_features: usize,

    /// Number of output classes
    pub num_classes: usize,

    /// Width of both hidden layers
    #[config(default = "64")]
    pub hidden_size: usize,
}

/// Two hidden ReLU layers and a linear output
#[derive(Module, Debug)]
pub struct FeatureMlp<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    out: Linear<B>,
    relu: Relu,
}

impl FeatureMlpConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> FeatureMlp<B> {
        FeatureMlp {
            fc1: LinearConfig::new(self.num_features, self.hidden_size).init(device),
            fc2: LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
            out: LinearConfig::new(self.hidden_size, self.num_classes).init(device),
            relu: Relu::new(),
        }
    }
}

impl<B: Backend> FeatureMlp<B> {
    /// `[batch, num_features]` -> logits `[batch, num_classes]`
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.relu.forward(self.fc1.forward(x));
        let x = self.relu.forward(self.fc2.forward(x));
        self.out.forward(x)
    }
}
