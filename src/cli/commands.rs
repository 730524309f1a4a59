// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `train` and `eval`, and their
// flags. Selector flags (model, dataset, optimizer, device,
// split) parse through the domain enums' FromStr, so a typo is
// reported with the list of valid names.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::{evaluate_use_case::EvaluateRequest, train_use_case::TrainConfig};
use crate::domain::{
    input_type::InputType,
    kinds::{DatasetKind, DeviceKind, ModelKind, OptimizerKind},
};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train a model, tracking the best checkpoint by validation score
    Train(TrainArgs),

    /// Evaluate a saved checkpoint and print the results as JSON
    Eval(EvalArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Model family: classifier or autoencoder
    #[arg(long, default_value = "classifier")]
    pub model: ModelKind,

    /// Input source: blobs (synthetic) or csv
    #[arg(long, default_value = "blobs")]
    pub dataset: DatasetKind,

    /// Directory holding train.csv / validation.csv / test.csv
    /// [default: data/<dataset>]
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Root of the log tree: <log-root>/<model>/<run name>
    #[arg(long, default_value = "log")]
    pub log_root: String,

    /// Where validation_results.txt and test_results.txt are appended
    #[arg(long, default_value = ".")]
    pub results_dir: String,

    /// Run name; generated from the hyperparameters when omitted
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, default_value_t = 32)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    /// adam, sgd or momentum
    #[arg(long, default_value = "adam")]
    pub optimizer: OptimizerKind,

    #[arg(long, default_value_t = 1e-3)]
    pub learning_rate: f64,

    /// Momentum coefficient (momentum optimizer only)
    #[arg(long, default_value_t = 0.9)]
    pub momentum: f64,

    /// Enable staircase exponential learning-rate decay
    #[arg(long)]
    pub lr_decay: bool,

    /// Decay the learning rate every this many epochs
    #[arg(long, default_value_t = 25)]
    pub lr_decay_epochs: usize,

    #[arg(long, default_value_t = 0.1)]
    pub lr_decay_factor: f64,

    /// L2 penalty applied as weight decay; 0 disables it
    #[arg(long, default_value_t = 0.0)]
    pub l2_penalty: f64,

    /// Discard existing checkpoints and start from scratch
    #[arg(long)]
    pub restart: bool,

    /// cpu or gpu
    #[arg(long, default_value = "cpu")]
    pub train_device: DeviceKind,

    /// Device used for validation and test evaluation
    #[arg(long, default_value = "cpu")]
    pub eval_device: DeviceKind,

    /// Hidden layer widths, comma separated
    #[arg(long, value_delimiter = ',', default_value = "64,32")]
    pub hidden_dims: Vec<usize>,

    /// Autoencoder bottleneck width
    #[arg(long, default_value_t = 4)]
    pub latent_dim: usize,

    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    /// Std of the Gaussian noise added to training inputs
    #[arg(long, default_value_t = 0.0)]
    pub augment_noise: f64,

    /// Probability of zeroing each training feature
    #[arg(long, default_value_t = 0.0)]
    pub augment_drop: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of clusters in the blobs dataset
    #[arg(long, default_value_t = 3)]
    pub blob_classes: usize,

    #[arg(long, default_value_t = 8)]
    pub blob_features: usize,

    /// Examples per split in the blobs dataset
    #[arg(long, default_value_t = 600)]
    pub blob_samples: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            model:           a.model,
            dataset:         a.dataset,
            data_dir:        a.data_dir,
            log_root:        a.log_root,
            results_dir:     a.results_dir,
            name:            a.name,
            batch_size:      a.batch_size,
            epochs:          a.epochs,
            optimizer:       a.optimizer,
            learning_rate:   a.learning_rate,
            momentum:        a.momentum,
            lr_decay:        a.lr_decay,
            lr_decay_epochs: a.lr_decay_epochs,
            lr_decay_factor: a.lr_decay_factor,
            l2_penalty:      a.l2_penalty,
            restart:         a.restart,
            train_device:    a.train_device,
            eval_device:     a.eval_device,
            hidden_dims:     a.hidden_dims,
            latent_dim:      a.latent_dim,
            dropout:         a.dropout,
            augment_noise:   a.augment_noise,
            augment_drop:    a.augment_drop,
            seed:            a.seed,
            blob_classes:    a.blob_classes,
            blob_features:   a.blob_features,
            blob_samples:    a.blob_samples,
        }
    }
}

/// All arguments for the `eval` command
#[derive(Args, Debug)]
pub struct EvalArgs {
    /// A run's log dir or its best/ dir
    #[arg(long)]
    pub checkpoint_dir: PathBuf,

    /// Defaults to the batch size used for training
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// train, validation or test; all splits when omitted
    #[arg(long)]
    pub split: Option<InputType>,

    /// Metric name; all of the model's metrics when omitted
    #[arg(long)]
    pub metric: Option<String>,

    #[arg(long, default_value = "cpu")]
    pub device: DeviceKind,
}

impl From<EvalArgs> for EvaluateRequest {
    fn from(a: EvalArgs) -> Self {
        EvaluateRequest {
            checkpoint_dir: a.checkpoint_dir,
            batch_size:     a.batch_size,
            split:          a.split,
            metric:         a.metric,
            device:         a.device,
        }
    }
}
