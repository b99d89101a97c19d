//! # Rank-3 Tensors
//!
//! [`Shape`] and [`Tensor`] plus the random tensor factory.
//!
//! A tensor is stored row-major in a flat buffer: element `(d, r, c)` lives at
//! `(d * rows + r) * cols + c`. The buffer length always equals
//! `depth * rows * cols`, so no tensor can be ragged.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::linalg::Matrix;
use crate::error::{Result, TensorError};

/// Extents of a rank-3 tensor: (depth, rows, cols)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "[usize; 3]")]
pub struct Shape {
    depth: usize,
    rows: usize,
    cols: usize,
}

impl Shape {
    /// Create a shape; every extent must be positive
    ///
    /// The element buffer must be addressable: shapes whose element count or
    /// byte size overflows are rejected, so [`Shape::len`] never overflows.
    pub fn new(depth: usize, rows: usize, cols: usize) -> Result<Self> {
        if depth == 0 || rows == 0 || cols == 0 {
            return Err(TensorError::InvalidShape(format!(
                "all extents must be positive, got [{}, {}, {}]",
                depth, rows, cols
            )));
        }

        let bytes = depth
            .checked_mul(rows)
            .and_then(|n| n.checked_mul(cols))
            .and_then(|n| n.checked_mul(std::mem::size_of::<f64>()))
            .filter(|&b| b <= isize::MAX as usize);
        if bytes.is_none() {
            return Err(TensorError::InvalidShape(format!(
                "[{}, {}, {}] has too many elements to allocate",
                depth, rows, cols
            )));
        }

        Ok(Shape { depth, rows, cols })
    }

    /// Create a shape from a slice of signed extents
    ///
    /// Exactly three components are required, each a positive integer.
    pub fn from_dims(dims: &[i64]) -> Result<Self> {
        let [depth, rows, cols] = dims else {
            return Err(TensorError::InvalidShape(format!(
                "expected exactly 3 dimensions, got {}",
                dims.len()
            )));
        };

        let extent = |v: i64| -> Result<usize> {
            usize::try_from(v)
                .ok()
                .filter(|&v| v > 0)
                .ok_or_else(|| TensorError::InvalidShape(format!("extent {} is not positive", v)))
        };

        Self::new(extent(*depth)?, extent(*rows)?, extent(*cols)?)
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Extents as an array
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        [self.depth, self.rows, self.cols]
    }

    /// Total number of elements
    #[inline]
    pub fn len(&self) -> usize {
        self.depth * self.rows * self.cols
    }

    /// Always false: a valid shape has at least one element
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    fn offset(&self, d: usize, r: usize, c: usize) -> usize {
        (d * self.rows + r) * self.cols + c
    }
}

impl TryFrom<Vec<i64>> for Shape {
    type Error = TensorError;

    fn try_from(dims: Vec<i64>) -> Result<Self> {
        Shape::from_dims(&dims)
    }
}

impl From<Shape> for [usize; 3] {
    fn from(shape: Shape) -> Self {
        shape.dims()
    }
}

/// Parses the textual form `"depth,rows,cols"`, e.g. `"10, 10, 3"`
impl FromStr for Shape {
    type Err = TensorError;

    fn from_str(s: &str) -> Result<Self> {
        let dims = s
            .split(',')
            .map(|part| {
                part.trim().parse::<i64>().map_err(|_| {
                    TensorError::InvalidShape(format!(
                        "'{}' is not an integer (expected e.g. 10,10,3)",
                        part.trim()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Shape::from_dims(&dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.depth, self.rows, self.cols)
    }
}

/// Immutable rank-3 array of `f64`
///
/// Every transform returns a new tensor; there are no in-place mutators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TensorRepr")]
pub struct Tensor {
    shape: Shape,
    data: Vec<f64>,
}

#[derive(Deserialize)]
struct TensorRepr {
    shape: Shape,
    data: Vec<f64>,
}

impl TryFrom<TensorRepr> for Tensor {
    type Error = TensorError;

    fn try_from(repr: TensorRepr) -> Result<Self> {
        Tensor::from_vec(repr.shape, repr.data)
    }
}

impl Tensor {
    /// Build a tensor from a flat row-major buffer
    pub fn from_vec(shape: Shape, data: Vec<f64>) -> Result<Self> {
        if data.len() != shape.len() {
            return Err(TensorError::InvalidInput(format!(
                "{} tensor needs {} elements, got {}",
                shape,
                shape.len(),
                data.len()
            )));
        }
        Ok(Tensor { shape, data })
    }

    /// Build a tensor from nested vectors, rejecting empty or ragged input
    pub fn from_nested(nested: Vec<Vec<Vec<f64>>>) -> Result<Self> {
        let depth = nested.len();
        let rows = nested.first().map_or(0, Vec::len);
        let cols = nested
            .first()
            .and_then(|plane| plane.first())
            .map_or(0, Vec::len);

        if depth == 0 || rows == 0 || cols == 0 {
            return Err(TensorError::InvalidInput("tensor must be non-empty".into()));
        }

        let mut data = Vec::with_capacity(depth * rows * cols);
        for (d, plane) in nested.into_iter().enumerate() {
            if plane.len() != rows {
                return Err(TensorError::InvalidInput(format!(
                    "plane {} has {} rows, expected {}",
                    d,
                    plane.len(),
                    rows
                )));
            }
            for (r, row) in plane.into_iter().enumerate() {
                if row.len() != cols {
                    return Err(TensorError::InvalidInput(format!(
                        "row ({}, {}) has {} columns, expected {}",
                        d,
                        r,
                        row.len(),
                        cols
                    )));
                }
                data.extend(row);
            }
        }

        Ok(Tensor {
            shape: Shape { depth, rows, cols },
            data,
        })
    }

    /// Tensor of the given shape with every element equal to `value`
    pub fn filled(shape: Shape, value: f64) -> Self {
        Tensor {
            shape,
            data: vec![value; shape.len()],
        }
    }

    /// Stack equally-sized matrices along the first axis
    pub fn from_planes(planes: Vec<Matrix>) -> Result<Self> {
        let first = planes
            .first()
            .ok_or_else(|| TensorError::InvalidInput("no planes to stack".into()))?;
        let shape = Shape::new(planes.len(), first.rows(), first.cols())?;

        let mut data = Vec::with_capacity(shape.len());
        for plane in &planes {
            if plane.rows() != shape.rows() || plane.cols() != shape.cols() {
                return Err(TensorError::InvalidInput(format!(
                    "plane is {}x{}, expected {}x{}",
                    plane.rows(),
                    plane.cols(),
                    shape.rows(),
                    shape.cols()
                )));
            }
            data.extend_from_slice(plane.as_slice());
        }

        Ok(Tensor { shape, data })
    }

    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Element at `(d, r, c)`, or `None` when out of bounds
    pub fn get(&self, d: usize, r: usize, c: usize) -> Option<f64> {
        if d < self.shape.depth && r < self.shape.rows && c < self.shape.cols {
            Some(self.data[self.shape.offset(d, r, c)])
        } else {
            None
        }
    }

    /// Flat row-major view of the elements
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Copy of the `d`-th plane along the first axis as a rows x cols matrix
    pub fn plane(&self, d: usize) -> Option<Matrix> {
        if d >= self.shape.depth {
            return None;
        }
        let size = self.shape.rows * self.shape.cols;
        let start = d * size;
        Matrix::from_vec(
            self.shape.rows,
            self.shape.cols,
            self.data[start..start + size].to_vec(),
        )
        .ok()
    }

    /// Iterator over all first-axis planes
    pub fn planes(&self) -> impl Iterator<Item = Matrix> + '_ {
        (0..self.shape.depth).filter_map(move |d| self.plane(d))
    }

    /// Apply `f` to every element, returning a new tensor of the same shape
    pub fn map<F>(&self, f: F) -> Tensor
    where
        F: Fn(f64) -> f64,
    {
        Tensor {
            shape: self.shape,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Nested representation `[depth][rows][cols]`
    pub fn to_nested(&self) -> Vec<Vec<Vec<f64>>> {
        self.data
            .chunks(self.shape.rows * self.shape.cols)
            .map(|plane| plane.chunks(self.shape.cols).map(<[f64]>::to_vec).collect())
            .collect()
    }
}

/// Create a tensor of uniform random values in [-1, 1) using the thread-local generator
pub fn create_tensor(shape: Shape) -> Tensor {
    create_tensor_with_rng(shape, &mut rand::thread_rng())
}

/// Create a tensor of uniform random values in [-1, 1) from an explicit source
pub fn create_tensor_with_rng<R: Rng + ?Sized>(shape: Shape, rng: &mut R) -> Tensor {
    let data = (0..shape.len()).map(|_| rng.gen_range(-1.0..1.0)).collect();
    Tensor { shape, data }
}

/// Create a random tensor from raw dimensions, validating them first
pub fn create_tensor_from_dims(dims: &[i64]) -> Result<Tensor> {
    Ok(create_tensor(Shape::from_dims(dims)?))
}
