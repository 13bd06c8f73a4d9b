//! Shared types for building computations over secret values.
//!
//! The [`Numeric`] trait is the whole contract between code that composes a secure
//! computation and the runtime that evaluates it. Implementors decide how secrets are
//! represented and how rounds are scheduled; callers only ever see opaque handles.

pub mod dummy;
pub mod fixed_point;

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use dummy::{DummyNumeric, DummyStats, RoundCosts};
pub use fixed_point::FixedPointConfig;

///An error representing the things that can go wrong inside a secure-arithmetic runtime
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NumericError {
    #[error("Opening a secret value failed: {0}")]
    /// The runtime could not reveal a value
    OpenFailed(String),
    #[error("Fixed-point precision of {0} fractional bits is not supported")]
    /// Precision does not leave room for an integer part in a 64-bit word
    InvalidPrecision(u32),
}

/// How the sub-computations built inside a scope relate to each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Composition {
    /// No data dependency between the parts; their rounds may be batched together
    Parallel,
    /// Each part may depend on the previous one
    Sequential,
}

/// The secure-arithmetic vocabulary consumed by the training engine.
///
/// `SFixed` is a secret fixed-point real and `SInt` a secret integer. Neither exposes
/// its plaintext; the only way out is [`Numeric::open`] / [`Numeric::open_int`].
/// Comparisons return secret 0/1 indicators that must be used arithmetically.
pub trait Numeric: Sized {
    /// Handle to a secret fixed-point value
    type SFixed: Clone + Debug;
    /// Handle to a secret integer value
    type SInt: Clone + Debug;

    /// Run `build` inside a nested scope with the given composition hint.
    fn scope<T, B>(&mut self, composition: Composition, build: B) -> T
    where
        B: FnOnce(&mut Self) -> T;

    /// Build independent sub-computations.
    fn par<T, B>(&mut self, build: B) -> T
    where
        B: FnOnce(&mut Self) -> T,
    {
        self.scope(Composition::Parallel, build)
    }

    /// Build dependent sub-computations, one stage after the other.
    fn seq<T, B>(&mut self, build: B) -> T
    where
        B: FnOnce(&mut Self) -> T,
    {
        self.scope(Composition::Sequential, build)
    }

    /// A public constant injected as a secret value.
    fn known(&mut self, value: f64) -> Self::SFixed;

    /// `a + b`
    fn add(&mut self, a: &Self::SFixed, b: &Self::SFixed) -> Self::SFixed;

    /// `a - b`
    fn sub(&mut self, a: &Self::SFixed, b: &Self::SFixed) -> Self::SFixed;

    /// `a * b`
    fn mult(&mut self, a: &Self::SFixed, b: &Self::SFixed) -> Self::SFixed;

    /// `1 / a`
    fn reciprocal(&mut self, a: &Self::SFixed) -> Self::SFixed;

    /// `sqrt(a)`
    fn sqrt(&mut self, a: &Self::SFixed) -> Self::SFixed;

    /// `e^a`
    fn exp(&mut self, a: &Self::SFixed) -> Self::SFixed;

    /// Secret indicator of `a <= b`.
    fn leq(&mut self, a: &Self::SFixed, b: &Self::SFixed) -> Self::SInt;

    /// Lift a secret integer into the fixed-point domain.
    fn from_sint(&mut self, a: &Self::SInt) -> Self::SFixed;

    /// Reveal a secret fixed-point value.
    fn open(&mut self, a: &Self::SFixed) -> Result<f64, NumericError>;

    /// `a + b` where `a` is public.
    fn add_known(&mut self, a: f64, b: &Self::SFixed) -> Self::SFixed {
        let a = self.known(a);
        self.add(&a, b)
    }

    /// `a - b` where `a` is public.
    fn known_sub(&mut self, a: f64, b: &Self::SFixed) -> Self::SFixed {
        let a = self.known(a);
        self.sub(&a, b)
    }

    /// `a * b` where `a` is public.
    fn mult_known(&mut self, a: f64, b: &Self::SFixed) -> Self::SFixed {
        let a = self.known(a);
        self.mult(&a, b)
    }

    /// `a / b`, computed through the reciprocal of `b`.
    fn div(&mut self, a: &Self::SFixed, b: &Self::SFixed) -> Self::SFixed {
        self.seq(|seq| {
            let inverse = seq.reciprocal(b);
            seq.mult(a, &inverse)
        })
    }

    /// Sum of a list of secret values; the empty sum is zero.
    fn sum(&mut self, terms: &[Self::SFixed]) -> Self::SFixed {
        let zero = self.known(0.0);
        terms.iter().fold(zero, |acc, term| self.add(&acc, term))
    }

    /// A public integer injected as a secret value.
    fn known_int(&mut self, value: i64) -> Self::SInt;

    /// `a + b` over integers
    fn add_int(&mut self, a: &Self::SInt, b: &Self::SInt) -> Self::SInt;

    /// `a - b` over integers
    fn sub_int(&mut self, a: &Self::SInt, b: &Self::SInt) -> Self::SInt;

    /// `a * b` over integers
    fn mult_int(&mut self, a: &Self::SInt, b: &Self::SInt) -> Self::SInt;

    /// Secret indicator of `a == b`.
    fn equals(&mut self, a: &Self::SInt, b: &Self::SInt) -> Self::SInt;

    /// Reveal a secret integer.
    fn open_int(&mut self, a: &Self::SInt) -> Result<i64, NumericError>;

    /// Sum of a list of secret integers; the empty sum is zero.
    fn sum_int(&mut self, terms: &[Self::SInt]) -> Self::SInt {
        let zero = self.known_int(0);
        terms.iter().fold(zero, |acc, term| self.add_int(&acc, term))
    }
}
