//! Floating-point precisions accepted as prediction scores.
//!
//! Ranking and aggregation always run in `f64`; the final value is cast back to the
//! precision of the scores it was computed from.

use half::f16;
use std::fmt::Debug;

/// A prediction score type.
pub trait Score: Copy + PartialOrd + Debug + Send + Sync + 'static {
    /// Short dtype name used in logs and reports.
    const DTYPE: &'static str;

    /// Relative tolerance to use when comparing against a full-precision result.
    const TOLERANCE: f64;

    fn to_f64(self) -> f64;

    fn from_f64(value: f64) -> Self;
}

impl Score for f16 {
    const DTYPE: &'static str = "f16";
    const TOLERANCE: f64 = 1e-2;

    fn to_f64(self) -> f64 {
        f16::to_f64(self)
    }

    fn from_f64(value: f64) -> Self {
        f16::from_f64(value)
    }
}

impl Score for f32 {
    const DTYPE: &'static str = "f32";
    const TOLERANCE: f64 = 1e-5;

    fn to_f64(self) -> f64 {
        f64::from(self)
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Score for f64 {
    const DTYPE: &'static str = "f64";
    const TOLERANCE: f64 = 1e-12;

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }
}

/// Convert a slice of scores to another precision.
pub fn cast_scores<S: Score, T: Score>(scores: &[S]) -> Vec<T> {
    scores.iter().map(|s| T::from_f64(s.to_f64())).collect()
}
