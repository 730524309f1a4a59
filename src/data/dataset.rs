use burn::data::dataset::Dataset;

use crate::domain::sample::Sample;

/// One split held in memory, served to Burn's DataLoader.
pub struct TabularDataset {
    samples: Vec<Sample>,
}

impl TabularDataset {
    pub fn new(samples: Vec<Sample>) -> Self { Self { samples } }
}

impl Dataset<Sample> for TabularDataset {
    fn get(&self, index: usize) -> Option<Sample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
