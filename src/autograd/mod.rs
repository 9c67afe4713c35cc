//! Tape-based autograd for loss outputs
//!
//! Only what a loss needs: a matrix tensor with a gradient cell, `detach` for
//! fixed targets, a scaling op, and `backward` to start the pass from a scalar.

mod backward;
mod ops;
mod tensor;

#[cfg(test)]
mod tests;

pub use backward::BackwardOp;
pub use ops::scale;
pub use tensor::{GradCell, Tensor};

use ndarray::Array2;

/// Perform backward pass on a tensor
///
/// With `grad_output == None` the pass is seeded with ones, which is the
/// usual choice for a scalar loss.
pub fn backward(tensor: &mut Tensor, grad_output: Option<Array2<f32>>) {
    let seed = grad_output.unwrap_or_else(|| Array2::ones(tensor.shape()));
    tensor.set_grad(seed);

    if let Some(op) = tensor.backward_op() {
        op.backward();
    }
}
