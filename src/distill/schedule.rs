//! Teacher temperature schedule

use crate::config::ValidationError;
use crate::error::{Error, Result};

/// Per-epoch teacher temperatures, computed once
///
/// A linear ramp from `warmup_temp` to `final_temp` over the first
/// `warmup_epochs` entries, then `final_temp` for the rest of training.
///
/// # Example
///
/// ```
/// use destilar::distill::TeacherTempSchedule;
///
/// let schedule = TeacherTempSchedule::new(0.07, 0.04, 4, 10).unwrap();
/// assert_eq!(schedule.len(), 10);
/// assert!((schedule.get(0).unwrap() - 0.07).abs() < 1e-7);
/// assert!((schedule.get(3).unwrap() - 0.04).abs() < 1e-7);
/// assert!(schedule.get(10).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TeacherTempSchedule {
    temps: Vec<f32>,
    warmup_epochs: usize,
}

impl TeacherTempSchedule {
    /// Build the schedule
    ///
    /// # Errors
    ///
    /// `WarmupExceedsEpochs` if `warmup_epochs > num_epochs`.
    pub fn new(
        warmup_temp: f32,
        final_temp: f32,
        warmup_epochs: usize,
        num_epochs: usize,
    ) -> std::result::Result<Self, ValidationError> {
        if warmup_epochs > num_epochs {
            return Err(ValidationError::WarmupExceedsEpochs {
                warmup_epochs,
                num_epochs,
            });
        }

        let mut temps = linspace(warmup_temp, final_temp, warmup_epochs);
        temps.resize(num_epochs, final_temp);

        Ok(Self {
            temps,
            warmup_epochs,
        })
    }

    /// Temperature for `epoch`
    ///
    /// # Errors
    ///
    /// `EpochOutOfRange` if `epoch >= len()`. Never wraps or clamps.
    pub fn get(&self, epoch: usize) -> Result<f32> {
        self.temps
            .get(epoch)
            .copied()
            .ok_or(Error::EpochOutOfRange {
                epoch,
                num_epochs: self.temps.len(),
            })
    }

    pub fn warmup_epochs(&self) -> usize {
        self.warmup_epochs
    }

    pub fn len(&self) -> usize {
        self.temps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temps.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.temps
    }
}

/// `num` evenly spaced values over `[start, stop]`, endpoints included
///
/// `num == 1` yields `[start]`. Computed in f64 so the ramp does not drift.
fn linspace(start: f32, stop: f32, num: usize) -> Vec<f32> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let (start, stop) = (f64::from(start), f64::from(stop));
            let step = (stop - start) / (num - 1) as f64;
            let mut values: Vec<f32> = (0..num)
                .map(|i| (start + step * i as f64) as f32)
                .collect();
            values[num - 1] = stop as f32;
            values
        }
    }
}
