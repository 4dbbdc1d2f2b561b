//! Vector kernels used by the solver loop.
//!
//! Inner product and norm are implemented for slices of any `num_traits::Float`
//! type through the unit type `()`, with optional Rayon parallelism. The
//! update kernels (`axpy`, `xpby`) produce a fresh vector instead of writing
//! in place: each iteration of the solver replaces its state vectors.

use crate::core::traits::InnerProduct;
use num_traits::Float;

/// Implements inner product and norm for slices, with optional Rayon parallelism.
///
/// If the `rayon` feature is enabled, uses parallel iterators; the reduction
/// order is then unspecified, so results can differ in the last bits.
impl<T: Float + Send + Sync> InnerProduct<[T]> for () {
    type Scalar = T;
    /// Computes the dot product of two vectors: `x^T y`.
    fn dot(&self, x: &[T], y: &[T]) -> T {
        assert_eq!(x.len(), y.len(), "Vectors must have the same length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            x.par_iter()
                .zip(y.par_iter())
                .map(|(xi, yi)| *xi * *yi)
                .reduce(|| T::zero(), |acc, v| acc + v)
        }
        #[cfg(not(feature = "rayon"))]
        {
            x.iter()
                .zip(y.iter())
                .map(|(xi, yi)| *xi * *yi)
                .fold(T::zero(), |acc, v| acc + v)
        }
    }
    /// Computes the Euclidean norm of a vector: `||x||_2`.
    fn norm(&self, x: &[T]) -> T {
        self.dot(x, x).sqrt()
    }
}

/// `x · y`
pub fn dot<T: Float + Send + Sync>(x: &[T], y: &[T]) -> T {
    ().dot(x, y)
}

/// `‖x‖₂`
pub fn norm<T: Float + Send + Sync>(x: &[T]) -> T {
    ().norm(x)
}

/// Returns `y + alpha · x`.
pub fn axpy<T: Float + Send + Sync>(alpha: T, x: &[T], y: &[T]) -> Vec<T> {
    assert_eq!(x.len(), y.len(), "Vectors must have the same length");
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        x.par_iter().zip(y.par_iter()).map(|(&xi, &yi)| yi + alpha * xi).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        x.iter().zip(y.iter()).map(|(&xi, &yi)| yi + alpha * xi).collect()
    }
}

/// Returns `x + beta · y`.
pub fn xpby<T: Float + Send + Sync>(x: &[T], beta: T, y: &[T]) -> Vec<T> {
    axpy(beta, y, x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn dot_and_norm() {
        let x = vec![1.0, 2.0, 3.0];
        let y = vec![4.0, -5.0, 6.0];
        assert_abs_diff_eq!(dot(&x, &y), 12.0, epsilon = 1e-12);
        assert_abs_diff_eq!(norm(&x), 14.0f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn updates_allocate_fresh_vectors() {
        let x = vec![1.0, 1.0];
        let y = vec![2.0, 3.0];
        assert_eq!(axpy(2.0, &x, &y), vec![4.0, 5.0]);
        assert_eq!(xpby(&x, -1.0, &y), vec![-1.0, -2.0]);
        assert_eq!(y, vec![2.0, 3.0]);
    }
}
