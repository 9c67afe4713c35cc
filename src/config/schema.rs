//! Configuration schema

use serde::{Deserialize, Serialize};

use crate::distill::Divergence;

/// Hyperparameters of a [`DistillLoss`](crate::distill::DistillLoss)
///
/// Only the two epoch counts are required in YAML; everything else falls back
/// to the usual multi-crop self-distillation defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistillLossConfig {
    /// Epochs over which the teacher temperature ramps linearly
    pub warmup_teacher_temp_epochs: usize,

    /// Total training epochs (schedule length)
    pub num_epochs: usize,

    /// Augmented views per sample
    #[serde(default = "default_n_crops")]
    pub n_crops: usize,

    /// Teacher temperature at epoch 0
    #[serde(default = "default_warmup_teacher_temp")]
    pub warmup_teacher_temp: f32,

    /// Teacher temperature after warmup
    #[serde(default = "default_teacher_temp")]
    pub teacher_temp: f32,

    /// Student temperature
    #[serde(default = "default_student_temp")]
    pub student_temp: f32,

    #[serde(default)]
    pub divergence: Divergence,
}

fn default_n_crops() -> usize {
    2
}

fn default_warmup_teacher_temp() -> f32 {
    0.07
}

fn default_teacher_temp() -> f32 {
    0.04
}

fn default_student_temp() -> f32 {
    0.1
}

impl DistillLossConfig {
    /// Configuration with default temperatures and two crops
    pub fn new(warmup_teacher_temp_epochs: usize, num_epochs: usize) -> Self {
        Self {
            warmup_teacher_temp_epochs,
            num_epochs,
            n_crops: default_n_crops(),
            warmup_teacher_temp: default_warmup_teacher_temp(),
            teacher_temp: default_teacher_temp(),
            student_temp: default_student_temp(),
            divergence: Divergence::default(),
        }
    }

    pub fn with_crops(mut self, n_crops: usize) -> Self {
        self.n_crops = n_crops;
        self
    }

    pub fn with_warmup_teacher_temp(mut self, temp: f32) -> Self {
        self.warmup_teacher_temp = temp;
        self
    }

    pub fn with_teacher_temp(mut self, temp: f32) -> Self {
        self.teacher_temp = temp;
        self
    }

    pub fn with_student_temp(mut self, temp: f32) -> Self {
        self.student_temp = temp;
        self
    }

    pub fn with_divergence(mut self, divergence: Divergence) -> Self {
        self.divergence = divergence;
        self
    }
}
