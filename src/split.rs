//! Validation/training partitioning.

use serde::{Deserialize, Serialize};

use crate::{PipelineErr, Result};

/// A sequence partitioned into a validation prefix and a training suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split<T> {
    pub validation: Vec<T>,
    pub training: Vec<T>,
}

/// Takes the first `validation` items as the validation partition and the
/// rest as the training one, keeping the relative order inside each.
///
/// # Returns
/// An error if `validation` exceeds the amount of items.
pub fn split<T>(mut items: Vec<T>, validation: usize) -> Result<Split<T>> {
    let total = items.len();
    if validation > total {
        return Err(PipelineErr::InvalidSplit { validation, total });
    }

    let training = items.split_off(validation);
    Ok(Split {
        validation: items,
        training,
    })
}

/// How large the validation partition is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSize {
    /// An absolute amount of examples.
    Count(usize),
    /// A fraction of the dataset in `[0, 1]`, rounded to the nearest example.
    Fraction(f64),
}

impl Default for ValidationSize {
    fn default() -> Self {
        Self::Count(1000)
    }
}

impl ValidationSize {
    /// Resolves this size against a dataset of `total` examples.
    ///
    /// # Returns
    /// An error if the resulting size exceeds `total` or the fraction is out of range.
    pub fn resolve(self, total: usize) -> Result<usize> {
        let validation = match self {
            ValidationSize::Count(count) => count,
            ValidationSize::Fraction(fraction) => {
                if !(0.0..=1.0).contains(&fraction) {
                    return Err(PipelineErr::InvalidConfig(format!(
                        "validation fraction {fraction} is not in [0, 1]"
                    )));
                }
                (total as f64 * fraction).round() as usize
            }
        };

        if validation > total {
            return Err(PipelineErr::InvalidSplit { validation, total });
        }

        Ok(validation)
    }
}
