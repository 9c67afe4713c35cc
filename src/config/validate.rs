//! Configuration validation

use super::schema::DistillLossConfig;

/// Validation error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Warmup epochs ({warmup_epochs}) exceed total epochs ({num_epochs})")]
    WarmupExceedsEpochs {
        warmup_epochs: usize,
        num_epochs: usize,
    },

    #[error("Invalid crop count: {0} (must be >= 2)")]
    TooFewCrops(usize),

    #[error("Invalid {name}: {value} (must be finite and > 0.0)")]
    InvalidTemperature { name: &'static str, value: f32 },
}

/// Validate a loss configuration
///
/// Checks:
/// - Schedule length is positive and covers the warmup
/// - At least two crops, so there is at least one cross-crop pair
/// - All temperatures are finite and positive
pub fn validate_config(config: &DistillLossConfig) -> Result<(), ValidationError> {
    if config.num_epochs == 0 {
        return Err(ValidationError::InvalidEpochs(config.num_epochs));
    }

    if config.warmup_teacher_temp_epochs > config.num_epochs {
        return Err(ValidationError::WarmupExceedsEpochs {
            warmup_epochs: config.warmup_teacher_temp_epochs,
            num_epochs: config.num_epochs,
        });
    }

    if config.n_crops < 2 {
        return Err(ValidationError::TooFewCrops(config.n_crops));
    }

    let temperatures = [
        ("warmup_teacher_temp", config.warmup_teacher_temp),
        ("teacher_temp", config.teacher_temp),
        ("student_temp", config.student_temp),
    ];
    for (name, value) in temperatures {
        if !(value.is_finite() && value > 0.0) {
            return Err(ValidationError::InvalidTemperature { name, value });
        }
    }

    Ok(())
}
