//! Training Infrastructure
//!
//! Supervised fitting of the delta network and artifact export.

pub mod trainer;

pub use trainer::{TrainBackend, Trainer, TrainingReport};
