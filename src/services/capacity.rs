//! Weight and capacity checks, applied before any state is written.
//!
//! Every mutating path follows "check, then commit": the validator runs
//! against the would-be parent aggregate first, and nothing is ever rolled
//! back because nothing was written.

/// Whether a parent with the given recorded aggregate weight and ceiling can
/// absorb a weight change of `delta`.
///
/// No ceiling means anything fits. The comparison is inclusive: landing
/// exactly on the ceiling is allowed.
pub fn can_accommodate(parent_weight: Option<f64>, parent_max_weight: Option<f64>, delta: f64) -> bool {
    match parent_max_weight {
        None => true,
        Some(limit) => parent_weight.unwrap_or(0.0) + delta <= limit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_ceiling_accepts_anything() {
        assert!(can_accommodate(Some(1000.0), None, 1_000_000.0));
        assert!(can_accommodate(None, None, f64::MAX));
    }

    #[test]
    fn within_ceiling() {
        assert!(can_accommodate(Some(8.0), Some(10.0), 2.0));
        assert!(can_accommodate(None, Some(10.0), 10.0));
    }

    #[test]
    fn over_ceiling() {
        assert!(!can_accommodate(Some(8.0), Some(10.0), 5.0));
        assert!(!can_accommodate(None, Some(4.0), 4.5));
    }

    #[test]
    fn negative_delta_always_fits_under_a_ceiling() {
        assert!(can_accommodate(Some(12.0), Some(10.0), -3.0));
    }
}
