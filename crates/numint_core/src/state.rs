//! Containers usable as the state vector of an integration run.
//!
//! The steppers work on contiguous slices; any container that can lend its
//! components as a slice can hold the state.

use crate::traits::Scalar;
use nalgebra::{DVector, SVector};

/// Ordered, fixed-length sequence of scalars holding the dependent variables.
pub trait StateVector<T: Scalar> {
    fn as_slice(&self) -> &[T];

    fn as_mut_slice(&mut self) -> &mut [T];

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Scalar> StateVector<T> for Vec<T> {
    fn as_slice(&self) -> &[T] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }
}

impl<T: Scalar, const N: usize> StateVector<T> for [T; N] {
    fn as_slice(&self) -> &[T] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        self
    }
}

impl<T: Scalar> StateVector<T> for DVector<T> {
    fn as_slice(&self) -> &[T] {
        DVector::as_slice(self)
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        DVector::as_mut_slice(self)
    }
}

impl<T: Scalar, const D: usize> StateVector<T> for SVector<T, D> {
    fn as_slice(&self) -> &[T] {
        SVector::as_slice(self)
    }

    fn as_mut_slice(&mut self) -> &mut [T] {
        SVector::as_mut_slice(self)
    }
}

/// Returns true when every component is finite.
pub fn is_finite<T: Scalar>(values: &[T]) -> bool {
    values.iter().all(|v| v.is_finite())
}
