//! Declarative YAML configuration
//!
//! # Example
//!
//! ```yaml
//! warmup_teacher_temp_epochs: 30
//! num_epochs: 100
//! n_crops: 2
//! warmup_teacher_temp: 0.07
//! teacher_temp: 0.04
//! student_temp: 0.1
//! divergence: cross_entropy
//! ```

mod schema;
mod validate;


pub use schema::DistillLossConfig;
pub use validate::{validate_config, ValidationError};

use std::path::Path;

use crate::error::{Error, Result};

/// Parse a configuration from a YAML string
///
/// Parsing does not validate; [`DistillLoss::from_config`](crate::distill::DistillLoss::from_config)
/// does that at construction.
pub fn parse_config(yaml: &str) -> Result<DistillLossConfig> {
    serde_yaml::from_str(yaml).map_err(|e| Error::Serialization(e.to_string()))
}

/// Load and validate a configuration from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DistillLossConfig> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let config = parse_config(&content)?;
    validate_config(&config)?;

    tracing::debug!(
        path = %path.as_ref().display(),
        num_epochs = config.num_epochs,
        n_crops = config.n_crops,
        "loaded distillation loss config"
    );

    Ok(config)
}
