//! Multi-crop self-distillation loss

use std::rc::Rc;

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::functional::{
    chunk_rows, cross_entropy_batchmean, kl_div_batchmean, log_softmax_rows, softmax_rows,
};
use super::schedule::TeacherTempSchedule;
use crate::autograd::{BackwardOp, GradCell, Tensor};
use crate::config::{validate_config, DistillLossConfig};
use crate::error::{Error, Result};

/// Per-pair divergence between a teacher crop and a student crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Divergence {
    /// Σ -t * log q. Includes the teacher entropy.
    #[default]
    CrossEntropy,
    /// Σ t * (log t - log q). Cross-entropy minus the teacher entropy.
    KlDivergence,
}

/// One term of the loss
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairTerm {
    /// Crop whose student log-probabilities were used
    pub student_crop: usize,
    /// Crop whose teacher probabilities were the target
    pub teacher_crop: usize,
    /// Batch-mean divergence for this pair
    pub value: f32,
}

/// Loss value together with the terms it averages
#[derive(Debug, Clone, PartialEq)]
pub struct LossBreakdown {
    pub loss: f32,
    pub teacher_temp: f32,
    pub terms: Vec<PairTerm>,
}

/// Self-distillation loss over crop pairs
///
/// Student and teacher outputs are `n_crops` blocks of `batch` rows stacked
/// along the row axis. For every ordered pair of distinct crops `(i, j)` the
/// student's crop `i` is scored against the teacher's crop `j`:
///
/// ```text
/// q_i = log_softmax(student_i / τ_s)
/// t_j = softmax(teacher_j / τ_t[epoch])          (no gradient)
/// L   = 1 / (n(n-1)) * Σ_{i≠j} batchmean(Σ_c -t_j * q_i)
/// ```
///
/// The teacher temperature `τ_t` follows a [`TeacherTempSchedule`].
///
/// # Example
///
/// ```
/// use destilar::distill::DistillLoss;
/// use ndarray::array;
///
/// let loss_fn = DistillLoss::new(2, 10).unwrap();
/// // two crops of one sample each
/// let student = array![[2.0, 1.0, 0.5], [1.8, 1.2, 0.4]];
/// let teacher = array![[1.5, 1.2, 0.8], [1.6, 1.0, 0.9]];
///
/// let loss = loss_fn.forward(&student, &teacher, 0).unwrap();
/// assert!(loss > 0.0);
/// assert!(loss_fn.forward(&student, &teacher, 10).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct DistillLoss {
    student_temp: f32,
    n_crops: usize,
    divergence: Divergence,
    schedule: TeacherTempSchedule,
}

/// Normalized inputs shared by the forward value and the gradient
struct Prepared {
    batch: usize,
    teacher_temp: f32,
    student_log_probs: Array2<f32>,
    teacher_probs: Array2<f32>,
}

impl DistillLoss {
    /// Create a loss with the default crops and temperatures
    ///
    /// Two crops, teacher temperature ramping 0.07 → 0.04, student
    /// temperature 0.1, cross-entropy divergence.
    ///
    /// # Errors
    ///
    /// Fails if `warmup_teacher_temp_epochs > num_epochs` or `num_epochs == 0`.
    pub fn new(warmup_teacher_temp_epochs: usize, num_epochs: usize) -> Result<Self> {
        Self::from_config(&DistillLossConfig::new(
            warmup_teacher_temp_epochs,
            num_epochs,
        ))
    }

    /// Create a loss from a full configuration
    pub fn from_config(config: &DistillLossConfig) -> Result<Self> {
        validate_config(config)?;

        let schedule = TeacherTempSchedule::new(
            config.warmup_teacher_temp,
            config.teacher_temp,
            config.warmup_teacher_temp_epochs,
            config.num_epochs,
        )?;

        tracing::debug!(
            n_crops = config.n_crops,
            student_temp = config.student_temp,
            warmup_teacher_temp = config.warmup_teacher_temp,
            teacher_temp = config.teacher_temp,
            warmup_epochs = config.warmup_teacher_temp_epochs,
            num_epochs = config.num_epochs,
            divergence = ?config.divergence,
            "built distillation loss"
        );

        Ok(Self {
            student_temp: config.student_temp,
            n_crops: config.n_crops,
            divergence: config.divergence,
            schedule,
        })
    }

    pub fn student_temp(&self) -> f32 {
        self.student_temp
    }

    pub fn n_crops(&self) -> usize {
        self.n_crops
    }

    pub fn divergence(&self) -> Divergence {
        self.divergence
    }

    pub fn num_epochs(&self) -> usize {
        self.schedule.len()
    }

    pub fn schedule(&self) -> &TeacherTempSchedule {
        &self.schedule
    }

    /// Teacher temperature used at `epoch`
    pub fn teacher_temp(&self, epoch: usize) -> Result<f32> {
        self.schedule.get(epoch)
    }

    /// Number of averaged pair terms, `n_crops * (n_crops - 1)`
    pub fn num_terms(&self) -> usize {
        self.n_crops * (self.n_crops - 1)
    }

    /// Compute the loss
    ///
    /// # Arguments
    ///
    /// * `student_outputs` - Student logits [n_crops * batch, classes]
    /// * `teacher_outputs` - Teacher logits [n_crops * batch, classes]
    /// * `epoch` - Index into the teacher temperature schedule
    ///
    /// # Errors
    ///
    /// Shape mismatch, empty input, row count not divisible by `n_crops`,
    /// or `epoch >= num_epochs`.
    pub fn forward(
        &self,
        student_outputs: &Array2<f32>,
        teacher_outputs: &Array2<f32>,
        epoch: usize,
    ) -> Result<f32> {
        self.forward_detailed(student_outputs, teacher_outputs, epoch)
            .map(|breakdown| breakdown.loss)
    }

    /// Compute the loss and report every pair term
    pub fn forward_detailed(
        &self,
        student_outputs: &Array2<f32>,
        teacher_outputs: &Array2<f32>,
        epoch: usize,
    ) -> Result<LossBreakdown> {
        let prepared = self.prepare(student_outputs.view(), teacher_outputs.view(), epoch)?;
        self.evaluate(&prepared)
    }

    /// Compute the loss as a differentiable scalar tensor
    ///
    /// The teacher is detached before use, so only `student_outputs` ever
    /// receives a gradient from [`backward`](crate::autograd::backward).
    ///
    /// # Example
    ///
    /// ```
    /// use destilar::autograd::{backward, Tensor};
    /// use destilar::distill::DistillLoss;
    /// use ndarray::array;
    ///
    /// let loss_fn = DistillLoss::new(1, 3).unwrap();
    /// let student = Tensor::new(array![[1.0, 0.0], [0.0, 1.0]], true);
    /// let teacher = Tensor::new(array![[0.5, 0.1], [0.2, 0.4]], true);
    ///
    /// let mut loss = loss_fn.forward_tensor(&student, &teacher, 2).unwrap();
    /// backward(&mut loss, None);
    ///
    /// assert!(student.grad().is_some());
    /// assert!(teacher.grad().is_none());
    /// ```
    pub fn forward_tensor(
        &self,
        student_outputs: &Tensor,
        teacher_outputs: &Tensor,
        epoch: usize,
    ) -> Result<Tensor> {
        let teacher = teacher_outputs.detach();
        let prepared = self.prepare(student_outputs.data().view(), teacher.data().view(), epoch)?;
        let breakdown = self.evaluate(&prepared)?;

        let requires_grad = student_outputs.requires_grad();
        let mut loss = Tensor::scalar(breakdown.loss, requires_grad);

        if requires_grad {
            loss.set_backward_op(Rc::new(DistillBackward {
                student: student_outputs.clone(),
                grad: self.student_grad(&prepared),
                result_grad: loss.grad_cell(),
            }));
        }

        Ok(loss)
    }

    /// Validate shapes and epoch, then normalize both sides
    fn prepare(
        &self,
        student: ArrayView2<'_, f32>,
        teacher: ArrayView2<'_, f32>,
        epoch: usize,
    ) -> Result<Prepared> {
        if student.dim() != teacher.dim() {
            return Err(Error::ShapeMismatch {
                expected: student.shape().to_vec(),
                got: teacher.shape().to_vec(),
            });
        }

        let (rows, cols) = student.dim();
        if rows == 0 || cols == 0 {
            return Err(Error::EmptyBatch { rows, cols });
        }
        if rows % self.n_crops != 0 {
            return Err(Error::UnevenCrops {
                rows,
                n_crops: self.n_crops,
            });
        }

        let teacher_temp = self.schedule.get(epoch)?;

        let student_log_probs = log_softmax_rows((&student / self.student_temp).view());
        let teacher_probs = softmax_rows((&teacher / teacher_temp).view());

        Ok(Prepared {
            batch: rows / self.n_crops,
            teacher_temp,
            student_log_probs,
            teacher_probs,
        })
    }

    fn evaluate(&self, prepared: &Prepared) -> Result<LossBreakdown> {
        let terms = self.pair_terms(prepared)?;
        let total: f32 = terms.iter().map(|term| term.value).sum();
        let loss = total / terms.len() as f32;

        tracing::trace!(
            loss,
            teacher_temp = prepared.teacher_temp,
            batch = prepared.batch,
            n_terms = terms.len(),
            "distillation loss"
        );
        if !loss.is_finite() {
            tracing::warn!(loss, "non-finite distillation loss");
        }

        Ok(LossBreakdown {
            loss,
            teacher_temp: prepared.teacher_temp,
            terms,
        })
    }

    fn pair_terms(&self, prepared: &Prepared) -> Result<Vec<PairTerm>> {
        let student_crops = chunk_rows(prepared.student_log_probs.view(), self.n_crops)?;
        let teacher_crops = chunk_rows(prepared.teacher_probs.view(), self.n_crops)?;

        let mut terms = Vec::with_capacity(self.num_terms());
        for (i, log_q) in student_crops.iter().enumerate() {
            for (j, t) in teacher_crops.iter().enumerate() {
                if i == j {
                    continue;
                }
                let value = match self.divergence {
                    Divergence::CrossEntropy => cross_entropy_batchmean(t.view(), log_q.view()),
                    Divergence::KlDivergence => kl_div_batchmean(t.view(), log_q.view()),
                };
                terms.push(PairTerm {
                    student_crop: i,
                    teacher_crop: j,
                    value,
                });
            }
        }

        Ok(terms)
    }

    /// ∂L/∂student_outputs
    ///
    /// For student crop `i` with `S_i = Σ_{j≠i} t_j`:
    /// `(q_i * rowsum(S_i) - S_i) / (n_terms * batch * τ_s)`.
    /// Identical for both divergences since they differ by a teacher-only term.
    fn student_grad(&self, prepared: &Prepared) -> Array2<f32> {
        let batch = prepared.batch;
        let classes = prepared.teacher_probs.ncols();

        let mut teacher_total = Array2::<f32>::zeros((batch, classes));
        for t in prepared.teacher_probs.axis_chunks_iter(Axis(0), batch) {
            teacher_total += &t;
        }

        let scale = 1.0 / (self.num_terms() as f32 * batch as f32 * self.student_temp);
        let mut grad = Array2::<f32>::zeros(prepared.student_log_probs.raw_dim());

        let blocks = grad
            .axis_chunks_iter_mut(Axis(0), batch)
            .zip(prepared.student_log_probs.axis_chunks_iter(Axis(0), batch))
            .zip(prepared.teacher_probs.axis_chunks_iter(Axis(0), batch));

        for ((mut g, log_q), t_self) in blocks {
            let others = &teacher_total - &t_self;
            let mass = others.sum_axis(Axis(1)).insert_axis(Axis(1));
            let q = log_q.mapv(f32::exp);
            g.assign(&((&q * &mass - &others) * scale));
        }

        grad
    }
}

struct DistillBackward {
    student: Tensor,
    grad: Array2<f32>,
    result_grad: GradCell,
}

impl BackwardOp for DistillBackward {
    fn backward(&self) {
        let upstream = match self.result_grad.borrow().as_ref() {
            Some(g) => g.iter().next().copied().unwrap_or(0.0),
            None => return,
        };

        self.student.accumulate_grad(&self.grad * upstream);

        if let Some(op) = self.student.backward_op() {
            op.backward();
        }
    }
}
