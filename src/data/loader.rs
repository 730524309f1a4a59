// ============================================================
// Layer 4 — CSV Loader
// ============================================================
// A dataset directory holds one file per split:
//
//   data/
//     train.csv        ← required
//     validation.csv   ← optional, carved from train if absent
//     test.csv         ← optional, empty split if absent
//
// Row format: f1,f2,...,fN,label
//   - blank lines and lines starting with '#' are skipped
//   - a first line whose leading field is not a number is a header
//   - every row must have the same number of columns
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (I/O and File Handling)

use anyhow::{bail, Context, Result};
use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::data::{preprocessor::Standardizer, splitter::split_train_val};
use crate::domain::{input_type::InputType, sample::Sample, traits::InputSource};

/// Parses split files from a directory.
pub struct CsvLoader {
    dir: PathBuf,
}

impl CsvLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn split_path(&self, input_type: InputType) -> PathBuf {
        self.dir.join(format!("{}.csv", input_type.as_str()))
    }

    pub fn has_split(&self, input_type: InputType) -> bool {
        self.split_path(input_type).exists()
    }

    /// Load one split. Returns `None` if its file does not exist.
    pub fn load(&self, input_type: InputType) -> Result<Option<Vec<Sample>>> {
        let path = self.split_path(input_type);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        let samples = parse_csv(&text)
            .with_context(|| format!("Malformed dataset file '{}'", path.display()))?;
        tracing::debug!("Loaded {} rows from '{}'", samples.len(), path.display());
        Ok(Some(samples))
    }
}

/// Parse CSV text into samples (features first, label last).
pub fn parse_csv(text: &str) -> Result<Vec<Sample>> {
    let mut samples = Vec::new();
    let mut width: Option<usize> = None;
    let mut first_row = true;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();

        // Header: only the first non-comment line may be one
        let is_header = first_row && fields[0].parse::<f32>().is_err();
        first_row = false;
        if is_header {
            continue;
        }

        if fields.len() < 2 {
            bail!("line {line_no}: expected at least one feature and a label");
        }
        match width {
            None => width = Some(fields.len()),
            Some(w) if w != fields.len() => {
                bail!("line {line_no}: expected {w} columns, found {}", fields.len())
            }
            Some(_) => {}
        }

        let (label_field, feature_fields) = fields
            .split_last()
            .with_context(|| format!("line {line_no}: empty row"))?;

        let features = feature_fields
            .iter()
            .map(|f| {
                f.parse::<f32>()
                    .with_context(|| format!("line {line_no}: invalid feature '{f}'"))
            })
            .collect::<Result<Vec<f32>>>()?;

        let label = label_field
            .parse::<usize>()
            .with_context(|| format!("line {line_no}: invalid label '{label_field}'"))?;

        samples.push(Sample::new(features, label));
    }

    Ok(samples)
}

/// Write samples in the format `parse_csv` reads back.
pub fn write_csv(path: &Path, samples: &[Sample]) -> Result<()> {
    let mut f = fs::File::create(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;

    if let Some(first) = samples.first() {
        let header: Vec<String> = (0..first.num_features()).map(|i| format!("f{i}")).collect();
        writeln!(f, "{},label", header.join(","))?;
    }
    for s in samples {
        let row: Vec<String> = s.features.iter().map(|v| v.to_string()).collect();
        writeln!(f, "{},{}", row.join(","), s.label)?;
    }
    Ok(())
}

// ─── CsvSource ────────────────────────────────────────────────────────────────
/// `InputSource` over a directory of split files. All splits are
/// loaded and standardised during `prepare()`.
pub struct CsvSource {
    name:                String,
    loader:              CsvLoader,
    validation_fraction: f64,
    seed:                u64,
    splits:              HashMap<InputType, Vec<Sample>>,
    num_classes:         usize,
    num_features:        usize,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>, seed: u64) -> Self {
        Self::named("csv", dir, seed)
    }

    pub(crate) fn named(name: impl Into<String>, dir: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            name:                name.into(),
            loader:              CsvLoader::new(dir),
            validation_fraction: 0.1,
            seed,
            splits:              HashMap::new(),
            num_classes:         0,
            num_features:        0,
        }
    }

    /// Fraction of train moved to validation when validation.csv is absent.
    pub fn with_validation_fraction(mut self, fraction: f64) -> Self {
        self.validation_fraction = fraction;
        self
    }

    pub(crate) fn loader(&self) -> &CsvLoader {
        &self.loader
    }
}

impl InputSource for CsvSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn num_features(&self) -> usize {
        self.num_features
    }

    fn num_examples(&self, input_type: InputType) -> usize {
        self.splits.get(&input_type).map_or(0, Vec::len)
    }

    fn examples(&self, input_type: InputType) -> Result<Vec<Sample>> {
        self.splits
            .get(&input_type)
            .cloned()
            .with_context(|| format!("Dataset '{}' has not been prepared", self.name))
    }

    fn prepare(&mut self) -> Result<()> {
        let train = self.loader.load(InputType::Train)?.with_context(|| {
            format!(
                "Missing '{}'. A csv dataset needs at least a train split.",
                self.loader.split_path(InputType::Train).display()
            )
        })?;
        if train.is_empty() {
            bail!("'{}' contains no rows", self.loader.split_path(InputType::Train).display());
        }

        let (mut train, mut validation) = match self.loader.load(InputType::Validation)? {
            Some(validation) => (train, validation),
            None => {
                tracing::info!(
                    "No validation split on disk, holding out {:.0}% of train",
                    self.validation_fraction * 100.0
                );
                split_train_val(train, 1.0 - self.validation_fraction, self.seed)
            }
        };

        if validation.is_empty() {
            bail!(
                "The validation split of dataset '{}' is empty; add rows to '{}' \
                 or provide at least two train rows to hold one out",
                self.name,
                self.loader.split_path(InputType::Validation).display()
            );
        }

        let mut test = self.loader.load(InputType::Test)?.unwrap_or_else(|| {
            tracing::warn!("No test split found in dataset '{}'", self.name);
            Vec::new()
        });

        let num_features = train[0].num_features();
        for (split, samples) in [
            (InputType::Train, &train),
            (InputType::Validation, &validation),
            (InputType::Test, &test),
        ] {
            if let Some(bad) = samples.iter().find(|s| s.num_features() != num_features) {
                bail!(
                    "{split} split has rows with {} features, train has {num_features}",
                    bad.num_features()
                );
            }
        }

        let standardizer = Standardizer::fit(&train);
        standardizer.apply(&mut train);
        standardizer.apply(&mut validation);
        standardizer.apply(&mut test);

        self.num_classes = train
            .iter()
            .chain(&validation)
            .chain(&test)
            .map(|s| s.label + 1)
            .max()
            .unwrap_or(0);
        self.num_features = num_features;

        tracing::info!(
            "Dataset '{}': {} train, {} validation, {} test, {} features, {} classes",
            self.name,
            train.len(),
            validation.len(),
            test.len(),
            self.num_features,
            self.num_classes,
        );

        self.splits.insert(InputType::Train, train);
        self.splits.insert(InputType::Validation, validation);
        self.splits.insert(InputType::Test, test);
        Ok(())
    }
}
