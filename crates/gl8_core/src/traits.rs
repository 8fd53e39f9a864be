use anyhow::Result;
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars by the integrator.
/// Must support basic arithmetic, debug printing, and conversion from f64.
/// Implemented by `f64` and by [`DoubleDouble`](crate::double_double::DoubleDouble).
pub trait Scalar: Float + FromPrimitive + Debug + Send + Sync + 'static {}

impl<T: Float + FromPrimitive + Debug + Send + Sync + 'static> Scalar for T {}

/// Converts an `f64` literal into the scalar type.
pub(crate) fn constant<T: Scalar>(value: f64) -> T {
    T::from_f64(value).unwrap_or_else(T::nan)
}

/// An autonomous vector field, x' = f(x).
pub trait VectorField<T: Scalar> {
    /// Returns the dimension of the state space.
    fn dimension(&self) -> usize;

    /// Evaluates f(x) into `out`, which has the same length as `x`.
    /// Implementations must be deterministic; the integrator calls this many
    /// times per step. Errors are propagated to the caller unchanged.
    fn apply(&self, x: &[T], out: &mut [T]) -> Result<()>;
}

impl<T: Scalar, F: VectorField<T> + ?Sized> VectorField<T> for &F {
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn apply(&self, x: &[T], out: &mut [T]) -> Result<()> {
        (**self).apply(x, out)
    }
}

/// A system with a conserved scalar quantity.
pub trait Hamiltonian<T: Scalar> {
    fn energy(&self, x: &[T]) -> T;
}

/// Adapter turning a closure into a [`VectorField`].
#[derive(Clone, Copy)]
pub struct FnField<F> {
    dimension: usize,
    f: F,
}

/// Wraps `f(x, out)` as an infallible vector field of the given dimension.
pub fn from_fn<T, F>(dimension: usize, f: F) -> FnField<F>
where
    T: Scalar,
    F: Fn(&[T], &mut [T]),
{
    FnField { dimension, f }
}

impl<T, F> VectorField<T> for FnField<F>
where
    T: Scalar,
    F: Fn(&[T], &mut [T]),
{
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn apply(&self, x: &[T], out: &mut [T]) -> Result<()> {
        (self.f)(x, out);
        Ok(())
    }
}
