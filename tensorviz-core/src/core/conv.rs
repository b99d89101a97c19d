//! # 2D Convolution
//!
//! Sliding-window convolution of a (height, width, channels) tensor with a
//! single 2D kernel shared by every channel.
//!
//! Output extents follow the usual formula
//!
//! ```text
//! out = floor((dim + 2 * padding - kernel) / stride) + 1
//! ```
//!
//! and the channel count is unchanged. Padding is virtual: positions that
//! fall outside the input contribute zero.

use serde::{Deserialize, Serialize};

use super::tensor::{Shape, Tensor};
use crate::error::{Result, TensorError};

/// 2D convolution filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Kernel {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Kernel {
    /// Build a kernel from rows; it must be non-empty and rectangular
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        if n_rows == 0 || n_cols == 0 {
            return Err(TensorError::InvalidInput("kernel must be non-empty".into()));
        }

        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(TensorError::InvalidInput(format!(
                    "kernel row {} has {} columns, expected {}",
                    i,
                    row.len(),
                    n_cols
                )));
            }
            data.extend(row);
        }

        Ok(Kernel {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    /// 3x3 Laplacian edge detector: -8 in the center, 1 elsewhere
    pub fn laplacian() -> Self {
        Kernel {
            rows: 3,
            cols: 3,
            data: vec![1.0, 1.0, 1.0, 1.0, -8.0, 1.0, 1.0, 1.0, 1.0],
        }
    }

    /// 1x1 kernel holding `value`
    pub fn scalar(value: f64) -> Self {
        Kernel {
            rows: 1,
            cols: 1,
            data: vec![value],
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::laplacian()
    }
}

impl TryFrom<Vec<Vec<f64>>> for Kernel {
    type Error = TensorError;

    fn try_from(rows: Vec<Vec<f64>>) -> Result<Self> {
        Kernel::new(rows)
    }
}

impl From<Kernel> for Vec<Vec<f64>> {
    fn from(kernel: Kernel) -> Self {
        kernel.data.chunks(kernel.cols).map(<[f64]>::to_vec).collect()
    }
}

/// Output shape of [`convolve`] without running it
pub fn output_shape(input: Shape, kernel: &Kernel, stride: usize, padding: usize) -> Result<Shape> {
    let (height, width) = (input.depth(), input.rows());

    if stride == 0 {
        return Err(TensorError::InvalidInput("stride must be at least 1".into()));
    }
    if kernel.rows > height || kernel.cols > width {
        return Err(TensorError::KernelTooLarge {
            kernel_rows: kernel.rows,
            kernel_cols: kernel.cols,
            height,
            width,
        });
    }

    let padded = |extent: usize| {
        padding
            .checked_mul(2)
            .and_then(|p| p.checked_add(extent))
            .ok_or_else(|| TensorError::InvalidInput(format!("padding {} is too large", padding)))
    };

    let out_h = (padded(height)? - kernel.rows) / stride + 1;
    let out_w = (padded(width)? - kernel.cols) / stride + 1;
    Shape::new(out_h, out_w, input.cols())
}

/// Convolve every channel of `tensor` with `kernel`
///
/// The tensor axes are read as (height, width, channels). Cost is
/// O(out_h * out_w * channels * kernel_rows * kernel_cols).
pub fn convolve(tensor: &Tensor, kernel: &Kernel, stride: usize, padding: usize) -> Result<Tensor> {
    let input = tensor.shape();
    let out = output_shape(input, kernel, stride, padding)?;
    let (height, channels) = (input.depth(), input.cols());

    let mut data = Vec::with_capacity(out.len());
    for i in 0..out.depth() {
        for j in 0..out.rows() {
            for c in 0..channels {
                let mut sum = 0.0;
                for ki in 0..kernel.rows {
                    // Shift by padding without going negative
                    let Some(ii) = (i * stride + ki).checked_sub(padding) else {
                        continue;
                    };
                    if ii >= height {
                        continue;
                    }
                    for kj in 0..kernel.cols {
                        let Some(jj) = (j * stride + kj).checked_sub(padding) else {
                            continue;
                        };
                        if let Some(v) = tensor.get(ii, jj, c) {
                            sum += v * kernel.at(ki, kj);
                        }
                    }
                }
                data.push(sum);
            }
        }
    }

    Tensor::from_vec(out, data)
}

/// Convolve with the default Laplacian kernel, stride 1 and no padding
pub fn convolve_default(tensor: &Tensor) -> Result<Tensor> {
    convolve(tensor, &Kernel::laplacian(), 1, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tensor::create_tensor;

    #[test]
    fn test_unit_kernel_is_identity() {
        let tensor = create_tensor(Shape::new(4, 5, 3).unwrap());
        let out = convolve(&tensor, &Kernel::scalar(1.0), 1, 0).unwrap();
        assert_eq!(out, tensor);
    }

    #[test]
    fn test_output_size() {
        let tensor = create_tensor(Shape::new(10, 10, 3).unwrap());
        let out = convolve(&tensor, &Kernel::laplacian(), 1, 0).unwrap();
        assert_eq!(out.shape().dims(), [8, 8, 3]);
    }

    #[test]
    fn test_stride_and_padding_size() {
        let shape = Shape::new(7, 6, 2).unwrap();
        let k = Kernel::laplacian();
        assert_eq!(output_shape(shape, &k, 2, 1).unwrap().dims(), [4, 3, 2]);
        assert_eq!(output_shape(shape, &k, 1, 1).unwrap().dims(), [7, 6, 2]);
    }

    #[test]
    fn test_huge_padding_rejected() {
        let shape = Shape::new(3, 3, 1).unwrap();
        let k = Kernel::laplacian();
        assert!(matches!(
            output_shape(shape, &k, 1, usize::MAX / 2 + 1),
            Err(TensorError::InvalidInput(_))
        ));
        // Addition fits but the padded output cannot be allocated
        assert!(matches!(
            output_shape(shape, &k, 1, usize::MAX / 4),
            Err(TensorError::InvalidShape(_))
        ));
    }

    #[test]
    fn test_kernel_too_large() {
        let tensor = create_tensor(Shape::new(3, 3, 1).unwrap());
        let kernel = Kernel::new(vec![vec![1.0; 5]; 5]).unwrap();
        assert!(matches!(
            convolve(&tensor, &kernel, 1, 0),
            Err(TensorError::KernelTooLarge { .. })
        ));
    }

    #[test]
    fn test_invalid_kernel_and_stride() {
        assert!(matches!(Kernel::new(Vec::new()), Err(TensorError::InvalidInput(_))));
        assert!(matches!(
            Kernel::new(vec![vec![1.0, 2.0], vec![1.0]]),
            Err(TensorError::InvalidInput(_))
        ));

        let tensor = create_tensor(Shape::new(3, 3, 1).unwrap());
        assert!(matches!(
            convolve(&tensor, &Kernel::scalar(1.0), 0, 0),
            Err(TensorError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_laplacian_on_constant_is_zero() {
        let tensor = Tensor::filled(Shape::new(5, 5, 2).unwrap(), 0.75);
        let out = convolve_default(&tensor).unwrap();
        assert!(out.as_slice().iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_padding_contributes_zero() {
        // 3x3 of ones, single channel; with padding 1 the corner only sees 4 cells
        let tensor = Tensor::filled(Shape::new(3, 3, 1).unwrap(), 1.0);
        let ones = Kernel::new(vec![vec![1.0; 3]; 3]).unwrap();
        let out = convolve(&tensor, &ones, 1, 1).unwrap();
        assert_eq!(out.shape().dims(), [3, 3, 1]);
        assert_eq!(out.get(0, 0, 0), Some(4.0));
        assert_eq!(out.get(0, 1, 0), Some(6.0));
        assert_eq!(out.get(1, 1, 0), Some(9.0));
    }

    #[test]
    fn test_channels_are_independent() {
        let nested = vec![
            vec![vec![1.0, 10.0], vec![2.0, 20.0]],
            vec![vec![3.0, 30.0], vec![4.0, 40.0]],
        ];
        let tensor = Tensor::from_nested(nested).unwrap();
        let sum = Kernel::new(vec![vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();
        let out = convolve(&tensor, &sum, 1, 0).unwrap();
        assert_eq!(out.shape().dims(), [1, 1, 2]);
        assert_eq!(out.as_slice(), &[10.0, 100.0]);
    }

    #[test]
    fn test_kernel_serde() {
        let kernel: Kernel = serde_json::from_str("[[0.0, 1.0], [2.0, 3.0]]").unwrap();
        assert_eq!(kernel.rows(), 2);
        assert_eq!(kernel.cols(), 2);
        assert!(serde_json::from_str::<Kernel>("[]").is_err());
    }
}
