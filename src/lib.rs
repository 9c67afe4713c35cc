//! # Destilar: Multi-Crop Self-Distillation Loss
//!
//! Destilar computes the loss a student network minimizes to match a
//! teacher's output distribution across augmented crops of the same inputs,
//! with a per-epoch teacher temperature schedule.
//!
//! ## Architecture
//!
//! - **distill**: The crop-pair loss, its temperature schedule and row-wise numerics
//! - **autograd**: Minimal tape so the loss can feed gradients to the student only
//! - **config**: Declarative YAML configuration and validation
//!
//! ## Example
//!
//! ```
//! use destilar::{DistillLoss, DistillLossConfig};
//! use ndarray::array;
//!
//! let config = DistillLossConfig::new(1, 4).with_crops(2);
//! let loss_fn = DistillLoss::from_config(&config).unwrap();
//!
//! let student = array![[4.0, 0.0], [0.0, 4.0], [3.0, 0.5], [0.5, 3.0]];
//! let teacher = array![[1.0, 0.0], [0.0, 1.0], [1.0, 0.0], [0.0, 1.0]];
//!
//! let loss = loss_fn.forward(&student, &teacher, 3).unwrap();
//! assert!(loss >= 0.0);
//! ```

pub mod autograd;
pub mod config;
pub mod distill;

pub mod error;

// Re-export commonly used types
pub use autograd::{backward, Tensor};
pub use config::{load_config, DistillLossConfig};
pub use distill::{DistillLoss, Divergence, TeacherTempSchedule};
pub use error::{Error, Result};
