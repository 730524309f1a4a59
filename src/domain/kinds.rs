// ============================================================
// Layer 3 — Selectors
// ============================================================
// Small closed enums picked on the command line and persisted
// in train_config.json. Each one parses from and prints as its
// lowercase name so the CLI, the config file and the run name
// all agree on spelling.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Implements Display + FromStr over a fixed list of lowercase names.
macro_rules! named_enum {
    ($ty:ident, $what:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    other => Err(format!(
                        "unknown {} '{}', expected one of: {}",
                        $what,
                        other,
                        [$($name),+].join(", ")
                    )),
                }
            }
        }
    };
}

/// Which network family to train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Classifier,
    Autoencoder,
}

named_enum!(ModelKind, "model", {
    Classifier  => "classifier",
    Autoencoder => "autoencoder",
});

/// Where the examples come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    /// Seeded Gaussian clusters, written to disk on first use
    Blobs,
    /// `train.csv` / `validation.csv` / `test.csv` in a directory
    Csv,
}

named_enum!(DatasetKind, "dataset", {
    Blobs => "blobs",
    Csv   => "csv",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    Sgd,
    Momentum,
}

named_enum!(OptimizerKind, "optimizer", {
    Adam     => "adam",
    Sgd      => "sgd",
    Momentum => "momentum",
});

/// Compute device. Training and evaluation pick theirs independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Cpu,
    Gpu,
}

named_enum!(DeviceKind, "device", {
    Cpu => "cpu",
    Gpu => "gpu",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_case_insensitively() {
        assert_eq!("Autoencoder".parse::<ModelKind>().unwrap(), ModelKind::Autoencoder);
        assert_eq!("SGD".parse::<OptimizerKind>().unwrap(), OptimizerKind::Sgd);
        assert_eq!("gpu".parse::<DeviceKind>().unwrap(), DeviceKind::Gpu);
    }

    #[test]
    fn test_unknown_name_lists_choices() {
        let err = "rmsprop".parse::<OptimizerKind>().unwrap_err();
        assert!(err.contains("adam, sgd, momentum"));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&DatasetKind::Blobs).unwrap();
        assert_eq!(json, "\"blobs\"");
    }
}
