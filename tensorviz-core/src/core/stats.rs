//! # Statistics Functions
//!
//! Summary statistics of a tensor, used for status lines and run summaries.

use serde::{Deserialize, Serialize};

use super::tensor::Tensor;

/// Sum of all elements
pub fn sum(tensor: &Tensor) -> f64 {
    tensor.as_slice().iter().sum()
}

/// Mean of all elements
pub fn mean(tensor: &Tensor) -> f64 {
    sum(tensor) / tensor.len() as f64
}

/// Variance: σ² = (1/n) Σ (xi - μ)²
pub fn variance(tensor: &Tensor) -> f64 {
    let mean = mean(tensor);
    let sum_sq: f64 = tensor
        .as_slice()
        .iter()
        .map(|v| (v - mean) * (v - mean))
        .sum();
    sum_sq / tensor.len() as f64
}

/// Standard deviation
pub fn std_dev(tensor: &Tensor) -> f64 {
    variance(tensor).sqrt()
}

/// Summary of a tensor's values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TensorStatistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    /// Mean of absolute values, i.e. the average cube opacity when rendered
    pub mean_abs: f64,
}

impl TensorStatistics {
    pub fn of(tensor: &Tensor) -> Self {
        let values = tensor.as_slice();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_abs = values.iter().map(|v| v.abs()).sum::<f64>() / values.len() as f64;

        TensorStatistics {
            min,
            max,
            mean: mean(tensor),
            std_dev: std_dev(tensor),
            mean_abs,
        }
    }
}

impl Tensor {
    /// Summary statistics of this tensor
    pub fn statistics(&self) -> TensorStatistics {
        TensorStatistics::of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tensor::Shape;

    #[test]
    fn test_statistics() {
        let tensor = Tensor::from_vec(
            Shape::new(1, 2, 2).unwrap(),
            vec![-1.0, 0.0, 0.5, 0.5],
        )
        .unwrap();
        let stats = tensor.statistics();

        assert_eq!(stats.min, -1.0);
        assert_eq!(stats.max, 0.5);
        assert!(stats.mean.abs() < 1e-12);
        assert!((stats.mean_abs - 0.5).abs() < 1e-12);
        assert!((stats.std_dev - (0.375f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_constant_tensor_has_no_spread() {
        let tensor = Tensor::filled(Shape::new(2, 2, 2).unwrap(), 0.25);
        assert_eq!(variance(&tensor), 0.0);
        assert!((sum(&tensor) - 2.0).abs() < 1e-12);
    }
}
