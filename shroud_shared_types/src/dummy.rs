//! An in-process runtime that evaluates secret computations in plaintext.
//!
//! Useful for testing: values are held as fixed-point words inside opaque handles, and
//! every operation is charged to a round counter that honors the parallel/sequential
//! composition hints. Nothing here is secure.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{fixed_point::FixedPointConfig, Composition, Numeric, NumericError};

/// Number of communication rounds a real runtime would spend on each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundCosts {
    /// Secret-by-secret multiplication
    pub multiplication: usize,
    /// Less-or-equal and equality tests
    pub comparison: usize,
    /// Exponential, reciprocal and square root
    pub nonlinear: usize,
    /// Revealing a value
    pub open: usize,
}

impl Default for RoundCosts {
    fn default() -> Self {
        Self {
            multiplication: 1,
            comparison: 1,
            nonlinear: 1,
            open: 1,
        }
    }
}

/// Counts of the operations evaluated so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DummyStats {
    /// Secret-by-secret multiplications
    pub multiplications: usize,
    /// Comparisons of any kind
    pub comparisons: usize,
    /// Exponentials, reciprocals and square roots
    pub nonlinear: usize,
    /// Values revealed
    pub openings: usize,
}

/// Secret fixed-point handle of the [`DummyNumeric`] runtime
#[derive(Clone)]
pub struct DummyFixed(i64);

/// Secret integer handle of the [`DummyNumeric`] runtime
#[derive(Clone)]
pub struct DummyInt(i64);

impl fmt::Debug for DummyFixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DummyFixed(<secret>)")
    }
}

impl fmt::Debug for DummyInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DummyInt(<secret>)")
    }
}

struct Frame {
    composition: Composition,
    depth: usize,
}

impl Frame {
    fn new(composition: Composition) -> Self {
        Self {
            composition,
            depth: 0,
        }
    }

    fn charge(&mut self, rounds: usize) {
        match self.composition {
            Composition::Parallel => self.depth = self.depth.max(rounds),
            Composition::Sequential => self.depth += rounds,
        }
    }
}

/// Plaintext runtime with round accounting
pub struct DummyNumeric {
    config: FixedPointConfig,
    costs: RoundCosts,
    stats: DummyStats,
    // --- Innermost scope last; the root scope is always sequential ---
    frames: Vec<Frame>,
}

impl Default for DummyNumeric {
    fn default() -> Self {
        Self::new(FixedPointConfig::default())
    }
}

impl DummyNumeric {
    /// Create a runtime with the given fixed-point encoding and unit round costs.
    pub fn new(config: FixedPointConfig) -> Self {
        Self::with_costs(config, RoundCosts::default())
    }

    /// Create a runtime with custom round costs.
    pub fn with_costs(config: FixedPointConfig, costs: RoundCosts) -> Self {
        Self {
            config,
            costs,
            stats: DummyStats::default(),
            frames: vec![Frame::new(Composition::Sequential)],
        }
    }

    /// The fixed-point encoding in use
    pub fn config(&self) -> &FixedPointConfig {
        &self.config
    }

    /// Operation counts since creation
    pub fn stats(&self) -> DummyStats {
        self.stats
    }

    /// Rounds a real runtime would need for everything built so far.
    pub fn rounds(&self) -> usize {
        self.frames.first().map_or(0, |root| root.depth)
    }

    fn charge(&mut self, rounds: usize) {
        if let Some(frame) = self.frames.last_mut() {
            frame.charge(rounds);
        }
    }

    fn fixed(&self, value: f64) -> DummyFixed {
        DummyFixed(self.config.encode(value))
    }

    fn value(&self, a: &DummyFixed) -> f64 {
        self.config.decode(a.0)
    }

    fn nonlinear(&mut self, a: &DummyFixed, f: impl FnOnce(f64) -> f64) -> DummyFixed {
        self.stats.nonlinear += 1;
        self.charge(self.costs.nonlinear);
        let out = f(self.value(a));
        self.fixed(out)
    }
}

impl Numeric for DummyNumeric {
    type SFixed = DummyFixed;
    type SInt = DummyInt;

    fn scope<T, B>(&mut self, composition: Composition, build: B) -> T
    where
        B: FnOnce(&mut Self) -> T,
    {
        self.frames.push(Frame::new(composition));
        let out = build(self);
        let depth = self.frames.pop().map_or(0, |frame| frame.depth);
        self.charge(depth);
        out
    }

    fn known(&mut self, value: f64) -> DummyFixed {
        self.fixed(value)
    }

    fn add(&mut self, a: &DummyFixed, b: &DummyFixed) -> DummyFixed {
        DummyFixed(a.0.saturating_add(b.0))
    }

    fn sub(&mut self, a: &DummyFixed, b: &DummyFixed) -> DummyFixed {
        DummyFixed(a.0.saturating_sub(b.0))
    }

    fn mult(&mut self, a: &DummyFixed, b: &DummyFixed) -> DummyFixed {
        self.stats.multiplications += 1;
        self.charge(self.costs.multiplication);
        DummyFixed(self.config.mul(a.0, b.0))
    }

    fn mult_known(&mut self, a: f64, b: &DummyFixed) -> DummyFixed {
        // --- Public scalars multiply shares locally, no round needed ---
        DummyFixed(self.config.mul(self.config.encode(a), b.0))
    }

    fn reciprocal(&mut self, a: &DummyFixed) -> DummyFixed {
        self.nonlinear(a, |x| 1.0 / x)
    }

    fn sqrt(&mut self, a: &DummyFixed) -> DummyFixed {
        self.nonlinear(a, |x| x.max(0.0).sqrt())
    }

    fn exp(&mut self, a: &DummyFixed) -> DummyFixed {
        self.nonlinear(a, f64::exp)
    }

    fn leq(&mut self, a: &DummyFixed, b: &DummyFixed) -> DummyInt {
        self.stats.comparisons += 1;
        self.charge(self.costs.comparison);
        DummyInt(i64::from(a.0 <= b.0))
    }

    fn from_sint(&mut self, a: &DummyInt) -> DummyFixed {
        DummyFixed(self.config.from_integer(a.0))
    }

    fn open(&mut self, a: &DummyFixed) -> Result<f64, NumericError> {
        self.stats.openings += 1;
        self.charge(self.costs.open);
        let value = self.value(a);
        trace!(module = "DummyNumeric", "Opening fixed: {}", value);
        Ok(value)
    }

    fn known_int(&mut self, value: i64) -> DummyInt {
        DummyInt(value)
    }

    fn add_int(&mut self, a: &DummyInt, b: &DummyInt) -> DummyInt {
        DummyInt(a.0.wrapping_add(b.0))
    }

    fn sub_int(&mut self, a: &DummyInt, b: &DummyInt) -> DummyInt {
        DummyInt(a.0.wrapping_sub(b.0))
    }

    fn mult_int(&mut self, a: &DummyInt, b: &DummyInt) -> DummyInt {
        self.stats.multiplications += 1;
        self.charge(self.costs.multiplication);
        DummyInt(a.0.wrapping_mul(b.0))
    }

    fn equals(&mut self, a: &DummyInt, b: &DummyInt) -> DummyInt {
        self.stats.comparisons += 1;
        self.charge(self.costs.comparison);
        DummyInt(i64::from(a.0 == b.0))
    }

    fn open_int(&mut self, a: &DummyInt) -> Result<i64, NumericError> {
        self.stats.openings += 1;
        self.charge(self.costs.open);
        trace!(module = "DummyNumeric", "Opening int: {}", a.0);
        Ok(a.0)
    }
}
