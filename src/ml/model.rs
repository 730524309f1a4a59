// ============================================================
// Layer 5 — Networks
// ============================================================
// Two dense model families behind one `Network` trait:
//
//   Classifier   features → [Linear → ReLU → Dropout]* → logits
//                loss: softmax cross entropy against the label
//
//   Autoencoder  features → encoder → latent → decoder → features
//                loss: mean squared reconstruction error
//
// Dropout only acts on autodiff backends, so the inference copy
// from `model.valid()` and the eval backend run without it.
//
// Reference: Burn Book §3 (Modules, Config)

use burn::{
    nn::{
        loss::{CrossEntropyLossConfig, MseLoss, Reduction},
        Dropout, DropoutConfig,
        Linear, LinearConfig,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::data::batcher::Batch;

/// What a prediction is compared against.
#[derive(Debug, Clone)]
pub enum Target<B: Backend> {
    /// Class ids — shape [batch]
    Labels(Tensor<B, 1, Int>),
    /// Dense values — shape [batch, features]
    Values(Tensor<B, 2>),
}

impl<B: Backend> Target<B> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Target::Labels(_) => "label",
            Target::Values(_) => "value",
        }
    }
}

/// A trainable network as seen by the trainer and the evaluators.
///
/// `predict` and `targets` return lists: the evaluator pairs them up
/// element by element, so both must have the same length.
pub trait Network<B: Backend>: Module<B> {
    /// Short name used in logs and error messages
    fn name(&self) -> &'static str;

    fn predict(&self, inputs: Tensor<B, 2>) -> Vec<Tensor<B, 2>>;

    fn targets(&self, batch: &Batch<B>) -> Vec<Target<B>>;

    /// Scalar training loss for one batch
    fn loss(&self, batch: &Batch<B>) -> Tensor<B, 1>;
}

// Dense + ReLU + dropout stack shared by both model families.
fn build_stack<B: Backend>(dims: &[usize], device: &B::Device) -> Vec<Linear<B>> {
    dims.windows(2)
        .map(|w| LinearConfig::new(w[0], w[1]).init(device))
        .collect()
}

fn run_stack<B: Backend>(layers: &[Linear<B>], dropout: &Dropout, x: Tensor<B, 2>) -> Tensor<B, 2> {
    layers
        .iter()
        .fold(x, |x, layer| dropout.forward(relu(layer.forward(x))))
}

// ─── Classifier ───────────────────────────────────────────────────────────────
#[derive(Config, Debug)]
pub struct ClassifierConfig {
    pub input_dim:   usize,
    pub hidden_dims: Vec<usize>,
    pub num_classes: usize,
    #[config(default = 0.0)]
    pub dropout:     f64,
}

impl ClassifierConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Classifier<B> {
        let mut dims = vec![self.input_dim];
        dims.extend_from_slice(&self.hidden_dims);
        let last = *dims.last().unwrap_or(&self.input_dim);

        Classifier {
            hidden:  build_stack(&dims, device),
            head:    LinearConfig::new(last, self.num_classes).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct Classifier<B: Backend> {
    pub hidden:  Vec<Linear<B>>,
    pub head:    Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> Classifier<B> {
    /// inputs: [batch, features] → logits: [batch, classes]
    pub fn forward(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        self.head.forward(run_stack(&self.hidden, &self.dropout, inputs))
    }
}

impl<B: Backend> Network<B> for Classifier<B> {
    fn name(&self) -> &'static str {
        "classifier"
    }

    fn predict(&self, inputs: Tensor<B, 2>) -> Vec<Tensor<B, 2>> {
        vec![self.forward(inputs)]
    }

    fn targets(&self, batch: &Batch<B>) -> Vec<Target<B>> {
        vec![Target::Labels(batch.labels.clone())]
    }

    fn loss(&self, batch: &Batch<B>) -> Tensor<B, 1> {
        let logits = self.forward(batch.inputs.clone());
        CrossEntropyLossConfig::new()
            .init(&logits.device())
            .forward(logits, batch.labels.clone())
    }
}

// ─── Autoencoder ──────────────────────────────────────────────────────────────
// encoder: input → hidden… → latent
// decoder: latent → …hidden (reversed) → input
// The last decoder layer is linear: standardised features are unbounded.
#[derive(Config, Debug)]
pub struct AutoencoderConfig {
    pub input_dim:   usize,
    pub hidden_dims: Vec<usize>,
    pub latent_dim:  usize,
    #[config(default = 0.0)]
    pub dropout:     f64,
}

impl AutoencoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Autoencoder<B> {
        let mut enc_dims = vec![self.input_dim];
        enc_dims.extend_from_slice(&self.hidden_dims);
        enc_dims.push(self.latent_dim);

        let mut dec_dims: Vec<usize> = enc_dims.iter().rev().copied().collect();
        // Output layer is kept separate so it skips the ReLU
        let output_dim = dec_dims.pop().unwrap_or(self.input_dim);
        let last_hidden = *dec_dims.last().unwrap_or(&self.latent_dim);

        Autoencoder {
            encoder: build_stack(&enc_dims, device),
            decoder: build_stack(&dec_dims, device),
            output:  LinearConfig::new(last_hidden, output_dim).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
        }
    }
}

#[derive(Module, Debug)]
pub struct Autoencoder<B: Backend> {
    pub encoder: Vec<Linear<B>>,
    pub decoder: Vec<Linear<B>>,
    pub output:  Linear<B>,
    pub dropout: Dropout,
}

impl<B: Backend> Autoencoder<B> {
    pub fn encode(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        run_stack(&self.encoder, &self.dropout, inputs)
    }

    /// inputs: [batch, features] → reconstructions: [batch, features]
    pub fn forward(&self, inputs: Tensor<B, 2>) -> Tensor<B, 2> {
        let latent = self.encode(inputs);
        self.output.forward(run_stack(&self.decoder, &self.dropout, latent))
    }
}

impl<B: Backend> Network<B> for Autoencoder<B> {
    fn name(&self) -> &'static str {
        "autoencoder"
    }

    fn predict(&self, inputs: Tensor<B, 2>) -> Vec<Tensor<B, 2>> {
        vec![self.forward(inputs)]
    }

    fn targets(&self, batch: &Batch<B>) -> Vec<Target<B>> {
        vec![Target::Values(batch.inputs.clone())]
    }

    fn loss(&self, batch: &Batch<B>) -> Tensor<B, 1> {
        let reconstructions = self.forward(batch.inputs.clone());
        MseLoss::new().forward(reconstructions, batch.inputs.clone(), Reduction::Mean)
    }
}
