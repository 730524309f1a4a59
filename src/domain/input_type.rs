// ============================================================
// Layer 3 — InputType
// ============================================================
// Every dataset exposes three disjoint splits. Training reads
// `Train`, model selection reads `Validation`, and the final
// number reported for a run comes from `Test`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Train,
    Validation,
    Test,
}

impl InputType {
    /// All splits in report order.
    pub const ALL: [InputType; 3] = [InputType::Train, InputType::Validation, InputType::Test];

    /// File stem used for the split on disk, e.g. `train.csv`.
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Train      => "train",
            InputType::Validation => "validation",
            InputType::Test       => "test",
        }
    }
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "train"                => Ok(InputType::Train),
            "validation" | "valid" => Ok(InputType::Validation),
            "test"                 => Ok(InputType::Test),
            other => Err(format!(
                "invalid input type '{other}', expected one of: train, validation, test"
            )),
        }
    }
}
