//! Usage dataset: synthesis and CSV loading.

pub mod loader;
pub mod synthesizer;

pub use loader::load_samples;
pub use synthesizer::{round2, write_csv, DatasetSynthesizer, DEFAULT_SAMPLES};
