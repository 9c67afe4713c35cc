//! Tests for the autograd tensor and ops

use super::*;
use approx::assert_abs_diff_eq;
use ndarray::array;

#[test]
fn test_tensor_creation() {
    let t = Tensor::new(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], true);
    assert_eq!(t.shape(), (2, 3));
    assert_eq!(t.len(), 6);
    assert!(t.requires_grad());
    assert!(t.grad().is_none());
}

#[test]
fn test_scalar_item() {
    let t = Tensor::scalar(0.25, false);
    assert_eq!(t.shape(), (1, 1));
    assert_abs_diff_eq!(t.item(), 0.25);
}

#[test]
fn test_tensor_grad_accumulation() {
    let t = Tensor::zeros(1, 2, true);

    t.accumulate_grad(array![[1.0, 1.0]]);
    assert_eq!(t.grad().unwrap()[[0, 0]], 1.0);

    t.accumulate_grad(array![[1.0, 2.0]]);
    let grad = t.grad().unwrap();
    assert_eq!(grad[[0, 0]], 2.0);
    assert_eq!(grad[[0, 1]], 3.0);

    t.zero_grad();
    assert!(t.grad().is_none());
}

#[test]
fn test_detach_cuts_gradient_link() {
    let t = Tensor::new(array![[1.0, 2.0]], true);
    let d = t.detach();

    assert!(!d.requires_grad());
    assert!(d.backward_op().is_none());
    assert_eq!(d.data(), t.data());

    d.accumulate_grad(array![[5.0, 5.0]]);
    assert!(t.grad().is_none());
}

#[test]
fn test_scale_forward() {
    let a = Tensor::new(array![[1.0, -2.0]], true);
    let b = scale(&a, 3.0);
    assert_abs_diff_eq!(b.data()[[0, 0]], 3.0);
    assert_abs_diff_eq!(b.data()[[0, 1]], -6.0);
}

#[test]
fn test_scale_backward_chains() {
    let a = Tensor::new(array![[1.0, 2.0]], true);
    let b = scale(&a, 2.0);
    let mut c = scale(&b, 0.5);

    backward(&mut c, None);

    let grad_a = a.grad().unwrap();
    assert_abs_diff_eq!(grad_a[[0, 0]], 1.0);
    assert_abs_diff_eq!(grad_a[[0, 1]], 1.0);
}

#[test]
fn test_no_backward_op_without_requires_grad() {
    let a = Tensor::new(array![[1.0]], false);
    let b = scale(&a, 4.0);
    assert!(!b.requires_grad());
    assert!(b.backward_op().is_none());
}
