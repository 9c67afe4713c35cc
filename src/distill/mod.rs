//! Multi-crop self-distillation
//!
//! A student network is trained to match a teacher's output distribution
//! across several augmented crops of the same inputs. Every student crop is
//! scored against every *other* teacher crop; a crop is never matched with
//! itself.
//!
//! ## Features
//!
//! - **Scheduled teacher temperature**: linear warmup, then constant
//! - **Cross-entropy or strict KL** per crop pair
//! - **Stop-gradient teacher**: only the student receives gradients
//!
//! ## Example
//!
//! ```
//! use destilar::distill::DistillLoss;
//! use ndarray::Array2;
//!
//! let loss_fn = DistillLoss::new(10, 100).unwrap();
//!
//! // 2 crops x 4 samples, 8 classes
//! let student = Array2::from_shape_fn((8, 8), |(r, c)| ((r + c) % 5) as f32);
//! let teacher = Array2::from_shape_fn((8, 8), |(r, c)| ((r * c) % 3) as f32);
//!
//! let loss = loss_fn.forward(&student, &teacher, 0).unwrap();
//! assert!(loss.is_finite() && loss >= 0.0);
//! ```

mod functional;
mod loss;
mod schedule;

#[cfg(test)]
mod tests;

pub use functional::{
    chunk_rows, cross_entropy_batchmean, kl_div_batchmean, log_softmax_rows, softmax_rows,
};
pub use loss::{DistillLoss, Divergence, LossBreakdown, PairTerm};
pub use schedule::TeacherTempSchedule;
