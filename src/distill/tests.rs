//! Property-based tests for the self-distillation loss

use super::*;
use crate::autograd::{backward, Tensor};
use crate::config::DistillLossConfig;
use ndarray::{concatenate, Array2, Axis};
use proptest::prelude::*;

// Helper to generate random logits
fn logits_strategy(rows: usize, num_classes: usize) -> impl Strategy<Value = Array2<f32>> {
    prop::collection::vec(prop::collection::vec(-5.0f32..5.0, num_classes), rows).prop_map(
        move |data| {
            let flat: Vec<f32> = data.into_iter().flatten().collect();
            Array2::from_shape_vec((rows, num_classes), flat).unwrap()
        },
    )
}

/// Reorder the crop blocks of `x` according to `order`
fn permute_crops(x: &Array2<f32>, n_crops: usize, order: &[usize]) -> Array2<f32> {
    let blocks = chunk_rows(x.view(), n_crops).unwrap();
    let reordered: Vec<_> = order.iter().map(|&i| blocks[i]).collect();
    concatenate(Axis(0), &reordered).unwrap()
}

/// Finite difference gradient checker
///
/// Computes numerical gradient using central difference:
/// f'(x) ≈ (f(x + h) - f(x - h)) / (2h)
fn finite_difference<F>(f: F, x: &Array2<f32>, epsilon: f32) -> Array2<f32>
where
    F: Fn(&Array2<f32>) -> f32,
{
    let mut grad = Array2::zeros(x.raw_dim());
    let mut probe = x.clone();

    for (idx, g) in grad.indexed_iter_mut() {
        let original = probe[idx];

        probe[idx] = original + epsilon;
        let f_plus = f(&probe);
        probe[idx] = original - epsilon;
        let f_minus = f(&probe);
        probe[idx] = original;

        *g = (f_plus - f_minus) / (2.0 * epsilon);
    }

    grad
}

proptest! {
    /// Cross-entropy form is never negative
    #[test]
    fn prop_loss_non_negative(
        student in logits_strategy(6, 4),
        teacher in logits_strategy(6, 4),
        epoch in 0usize..10,
    ) {
        let loss_fn = DistillLoss::from_config(&DistillLossConfig::new(4, 10).with_crops(3)).unwrap();
        let loss = loss_fn.forward(&student, &teacher, epoch).unwrap();

        prop_assert!(loss.is_finite());
        prop_assert!(loss >= -1e-6);
    }

    /// Strict KL form is never negative either
    #[test]
    fn prop_kl_non_negative(
        student in logits_strategy(4, 3),
        teacher in logits_strategy(4, 3),
    ) {
        let config = DistillLossConfig::new(2, 5).with_divergence(Divergence::KlDivergence);
        let loss_fn = DistillLoss::from_config(&config).unwrap();
        let loss = loss_fn.forward(&student, &teacher, 1).unwrap();

        prop_assert!(loss >= -1e-4);
    }

    /// n crops always give n(n-1) terms and never a self pair
    #[test]
    fn prop_pair_count(n_crops in 2usize..6, batch in 1usize..4) {
        let loss_fn = DistillLoss::from_config(&DistillLossConfig::new(1, 2).with_crops(n_crops)).unwrap();
        let x = Array2::from_shape_fn((n_crops * batch, 3), |(r, c)| (r + 2 * c) as f32 * 0.1);

        let breakdown = loss_fn.forward_detailed(&x, &x, 0).unwrap();

        prop_assert_eq!(breakdown.terms.len(), n_crops * (n_crops - 1));
        prop_assert!(breakdown.terms.iter().all(|t| t.student_crop != t.teacher_crop));
    }

    /// Repeated calls are bit-identical
    #[test]
    fn prop_deterministic(
        student in logits_strategy(4, 5),
        teacher in logits_strategy(4, 5),
    ) {
        let loss_fn = DistillLoss::new(3, 6).unwrap();
        let first = loss_fn.forward(&student, &teacher, 2).unwrap();
        let second = loss_fn.forward(&student, &teacher, 2).unwrap();

        prop_assert_eq!(first.to_bits(), second.to_bits());
    }

    /// Relabelling crops the same way on both sides leaves the loss unchanged
    #[test]
    fn prop_crop_permutation_invariant(
        student in logits_strategy(6, 4),
        teacher in logits_strategy(6, 4),
        order in Just(vec![0usize, 1, 2]).prop_shuffle(),
    ) {
        let loss_fn = DistillLoss::from_config(&DistillLossConfig::new(1, 3).with_crops(3)).unwrap();

        let original = loss_fn.forward(&student, &teacher, 2).unwrap();
        let permuted = loss_fn
            .forward(
                &permute_crops(&student, 3, &order),
                &permute_crops(&teacher, 3, &order),
                2,
            )
            .unwrap();

        prop_assert!((original - permuted).abs() <= 1e-4 * original.abs().max(1.0));
    }

    /// Analytic student gradient matches central differences
    #[test]
    fn prop_student_gradient_matches_finite_difference(
        student in logits_strategy(4, 3),
        teacher in logits_strategy(4, 3),
    ) {
        let config = DistillLossConfig::new(0, 1)
            .with_teacher_temp(1.0)
            .with_student_temp(1.0);
        let loss_fn = DistillLoss::from_config(&config).unwrap();

        let student_tensor = Tensor::new(student.clone(), true);
        let mut loss = loss_fn
            .forward_tensor(&student_tensor, &Tensor::from(teacher.clone()), 0)
            .unwrap();
        backward(&mut loss, None);
        let analytical = student_tensor.grad().unwrap();

        let numerical = finite_difference(
            |x| loss_fn.forward(x, &teacher, 0).unwrap(),
            &student,
            1e-2,
        );

        for (a, n) in analytical.iter().zip(numerical.iter()) {
            prop_assert!((a - n).abs() < 5e-3, "analytical {} vs numerical {}", a, n);
        }
    }
}

#[test]
fn test_student_gradient_flows_through_upstream_ops() {
    let loss_fn = DistillLoss::new(1, 2).unwrap();
    let raw = Tensor::new(
        Array2::from_shape_fn((4, 3), |(r, c)| (r as f32 - c as f32) * 0.3),
        true,
    );
    let student = crate::autograd::scale(&raw, 2.0);
    let teacher = Tensor::new(Array2::from_shape_fn((4, 3), |(r, c)| ((r + c) % 2) as f32), true);

    let mut loss = loss_fn.forward_tensor(&student, &teacher, 1).unwrap();
    backward(&mut loss, None);

    let grad_student = student.grad().unwrap();
    let grad_raw = raw.grad().unwrap();
    for (gr, gs) in grad_raw.iter().zip(grad_student.iter()) {
        approx::assert_abs_diff_eq!(*gr, 2.0 * gs, epsilon = 1e-6);
    }
    assert!(teacher.grad().is_none());
}

#[test]
fn test_tensor_loss_matches_array_loss() {
    let loss_fn = DistillLoss::new(2, 4).unwrap();
    let student = Array2::from_shape_fn((4, 3), |(r, c)| (r * 3 + c) as f32 * 0.05);
    let teacher = Array2::from_shape_fn((4, 3), |(r, c)| (c as f32 - r as f32) * 0.02);

    let value = loss_fn.forward(&student, &teacher, 1).unwrap();
    let tensor = loss_fn
        .forward_tensor(&Tensor::new(student, true), &Tensor::from(teacher), 1)
        .unwrap();

    assert_eq!(tensor.shape(), (1, 1));
    assert_eq!(tensor.item().to_bits(), value.to_bits());
}
