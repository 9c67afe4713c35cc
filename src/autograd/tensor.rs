//! Matrix tensor with gradient tracking

use super::BackwardOp;
use ndarray::Array2;
use std::cell::RefCell;
use std::rc::Rc;

/// Shared gradient slot of a tensor
pub type GradCell = Rc<RefCell<Option<Array2<f32>>>>;

/// Row-major `(rows, cols)` tensor with automatic differentiation support
///
/// Rows are samples (crops concatenated along this axis), columns are classes.
#[derive(Clone)]
pub struct Tensor {
    data: Array2<f32>,
    grad: GradCell,
    backward_op: Option<Rc<dyn BackwardOp>>,
    requires_grad: bool,
}

impl Tensor {
    /// Create a new tensor with data
    pub fn new(data: Array2<f32>, requires_grad: bool) -> Self {
        Self {
            data,
            grad: Rc::new(RefCell::new(None)),
            backward_op: None,
            requires_grad,
        }
    }

    /// Create a 1x1 tensor holding a scalar
    pub fn scalar(value: f32, requires_grad: bool) -> Self {
        Self::new(Array2::from_elem((1, 1), value), requires_grad)
    }

    /// Create a tensor filled with zeros
    pub fn zeros(rows: usize, cols: usize, requires_grad: bool) -> Self {
        Self::new(Array2::zeros((rows, cols)), requires_grad)
    }

    /// Get reference to data
    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    /// Shape as `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// First element, the loss value for 1x1 tensors
    pub fn item(&self) -> f32 {
        self.data.iter().next().copied().unwrap_or(0.0)
    }

    /// Get gradient (if computed)
    pub fn grad(&self) -> Option<Array2<f32>> {
        self.grad.borrow().clone()
    }

    /// Set gradient
    pub fn set_grad(&self, grad: Array2<f32>) {
        *self.grad.borrow_mut() = Some(grad);
    }

    /// Accumulate gradient (for when tensor is used multiple times)
    pub fn accumulate_grad(&self, grad: Array2<f32>) {
        let mut grad_ref = self.grad.borrow_mut();
        if let Some(existing) = grad_ref.as_mut() {
            *existing += &grad;
        } else {
            *grad_ref = Some(grad);
        }
    }

    /// Zero out gradient
    pub fn zero_grad(&self) {
        *self.grad.borrow_mut() = None;
    }

    /// Check if requires gradient
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Copy of this tensor cut off from the graph
    ///
    /// The result shares no gradient cell and has no backward op, so nothing
    /// computed from it can write a gradient back into `self`.
    pub fn detach(&self) -> Tensor {
        Tensor::new(self.data.clone(), false)
    }

    /// Get reference to gradient cell (for backward operations)
    pub fn grad_cell(&self) -> GradCell {
        self.grad.clone()
    }

    /// Set backward operation
    pub fn set_backward_op(&mut self, op: Rc<dyn BackwardOp>) {
        self.backward_op = Some(op);
    }

    /// Get backward operation
    pub fn backward_op(&self) -> Option<Rc<dyn BackwardOp>> {
        self.backward_op.clone()
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Array2<f32>> for Tensor {
    fn from(data: Array2<f32>) -> Self {
        Tensor::new(data, false)
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape())
            .field("grad", &self.grad.borrow().is_some())
            .field("requires_grad", &self.requires_grad)
            .finish()
    }
}
