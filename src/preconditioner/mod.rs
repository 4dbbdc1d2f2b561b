//! Preconditioners for the conjugate-gradient solver.
//!
//! The solver always receives a [`Preconditioning`]: either the identity
//! (no preconditioner) or a custom [`Preconditioner`]. The inner loop calls
//! [`Preconditioning::apply`] unconditionally.

use crate::error::Result;

/// A preconditioner M ≈ (A + λI)⁻¹.
pub trait Preconditioner: Send + Sync {
    /// Apply M⁻¹ to r, returning z = M⁻¹ r.
    fn apply(&self, r: &[f64]) -> Result<Vec<f64>>;
}

/// Preconditioner choice handed to the solver.
#[derive(Default)]
pub enum Preconditioning {
    #[default]
    Identity,
    Custom(Box<dyn Preconditioner>),
}

impl Preconditioning {
    pub fn custom<P: Preconditioner + 'static>(pc: P) -> Self {
        Preconditioning::Custom(Box::new(pc))
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, Preconditioning::Identity)
    }

    pub fn apply(&self, r: &[f64]) -> Result<Vec<f64>> {
        match self {
            Preconditioning::Identity => Ok(r.to_vec()),
            Preconditioning::Custom(pc) => pc.apply(r),
        }
    }
}

impl From<Option<Box<dyn Preconditioner>>> for Preconditioning {
    fn from(pc: Option<Box<dyn Preconditioner>>) -> Self {
        match pc {
            Some(pc) => Preconditioning::Custom(pc),
            None => Preconditioning::Identity,
        }
    }
}

impl std::fmt::Debug for Preconditioning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Preconditioning::Identity => f.write_str("Identity"),
            Preconditioning::Custom(_) => f.write_str("Custom"),
        }
    }
}

pub mod jacobi;
pub use jacobi::{DiagonalSource, Jacobi};
