// Copyright © 2024.  Modulus Labs, Inc.

// Restricted Use License

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the ìSoftwareî), to use the Software internally for evaluation, non-production purposes only.  Any redistribution, reproduction, modification, sublicensing, publication, or other use of the Software is strictly prohibited.  In addition, usage of the Software is subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED ìAS ISî, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.


//! Fixed-point encoding of reals into 64-bit words.
//!
//! A value `v` is stored as `round(v * 2^precision)`. Products are widened to 128 bits
//! and shifted back down with round-to-nearest, so long chains of multiplications do
//! not drift downwards.

use serde::{Deserialize, Serialize};

use crate::NumericError;

/// Largest precision that still leaves a sign bit and one integer bit.
pub const MAX_PRECISION: u32 = 62;

fn default_precision() -> u32 {
    32
}

/// Number of fractional bits used by a fixed-point encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFixedPointConfig")]
pub struct FixedPointConfig {
    precision: u32,
}

#[derive(Deserialize)]
struct RawFixedPointConfig {
    #[serde(default = "default_precision")]
    precision: u32,
}

impl TryFrom<RawFixedPointConfig> for FixedPointConfig {
    type Error = NumericError;

    fn try_from(raw: RawFixedPointConfig) -> Result<Self, Self::Error> {
        Self::new(raw.precision)
    }
}

impl Default for FixedPointConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
        }
    }
}

impl FixedPointConfig {
    /// Create a config with `precision` fractional bits.
    pub fn new(precision: u32) -> Result<Self, NumericError> {
        if precision == 0 || precision > MAX_PRECISION {
            return Err(NumericError::InvalidPrecision(precision));
        }
        Ok(Self { precision })
    }

    /// Number of fractional bits
    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// The scaling factor `2^precision`
    pub fn scale(&self) -> i64 {
        1_i64 << self.precision
    }

    /// Encode a real. Out-of-range values saturate and NaN maps to zero.
    pub fn encode(&self, value: f64) -> i64 {
        (value * self.scale() as f64).round() as i64
    }

    /// Decode back to a real.
    pub fn decode(&self, fp: i64) -> f64 {
        fp as f64 / self.scale() as f64
    }

    /// Multiply two encodings, rounding back to the same scale.
    pub fn mul(&self, a: i64, b: i64) -> i64 {
        let half = 1_i128 << (self.precision - 1);
        let wide = (a as i128 * b as i128 + half) >> self.precision;
        wide.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    /// Encode an integer exactly (saturating on overflow).
    pub fn from_integer(&self, value: i64) -> i64 {
        value.saturating_mul(self.scale())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_roundtrip() {
        let config = FixedPointConfig::default();
        for value in [3.14159, -7.777, 0.001, 0.0, 1234.5] {
            let recovered = config.decode(config.encode(value));
            assert!(
                (value - recovered).abs() < 1e-6,
                "Roundtrip error too large for {}: got {}",
                value,
                recovered
            );
        }
    }

    #[test]
    fn test_mul_fractions() {
        let config = FixedPointConfig::default();
        let product = config.mul(config.encode(0.5), config.encode(-0.5));
        assert_eq!(config.decode(product), -0.25);
    }

    #[test]
    fn test_mul_rounds_to_nearest() {
        let config = FixedPointConfig::new(4).unwrap();
        // 3/16 * 3/16 = 9/256, which is 0.5625/16: nearest is 1/16, truncation gives 0
        assert_eq!(config.mul(3, 3), 1);
        // -9/256 rounds to -1/16 as well
        assert_eq!(config.mul(-3, 3), -1);
        // 1/16 * 7/16 = 7/256 is below half a step
        assert_eq!(config.mul(1, 7), 0);

        // Repeated scaling by a fraction stays unbiased
        let config = FixedPointConfig::default();
        let factor = config.encode(0.999);
        let mut value = config.encode(1.0);
        for _ in 0..1000 {
            value = config.mul(value, factor);
        }
        assert!((config.decode(value) - 0.999_f64.powi(1000)).abs() < 1e-6);
    }

    #[test]
    fn test_encode_saturates() {
        let config = FixedPointConfig::default();
        assert_eq!(config.encode(f64::INFINITY), i64::MAX);
        assert_eq!(config.encode(f64::NEG_INFINITY), i64::MIN);
        assert_eq!(config.encode(f64::NAN), 0);
    }

    #[test]
    fn test_invalid_precision() {
        assert_eq!(
            FixedPointConfig::new(0),
            Err(NumericError::InvalidPrecision(0))
        );
        assert!(FixedPointConfig::new(MAX_PRECISION + 1).is_err());
        assert_eq!(FixedPointConfig::new(16).map(|c| c.scale()), Ok(65536));
    }

    #[test]
    fn test_config_from_json_uses_default_precision() {
        let config: FixedPointConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, FixedPointConfig::default());
        let config: FixedPointConfig = serde_json::from_str(r#"{"precision": 16}"#).unwrap();
        assert_eq!(config.precision(), 16);
        assert!(serde_json::from_str::<FixedPointConfig>(r#"{"precision": 80}"#).is_err());
    }
}
