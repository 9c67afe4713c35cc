//! Backward operation trait

/// A node on the tape that pushes its output gradient into its inputs
pub trait BackwardOp {
    /// Perform backward pass
    fn backward(&self);
}
