//! Custom test assertions

use meterline::{GenerationPlan, GovernanceError};

/// Assert two values are approximately equal (for floats)
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_approx_eq!($left, $right, 1e-9_f64)
    };
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let (left, right): (f64, f64) = ($left, $right);
        assert!(
            (left - right).abs() < $epsilon,
            "assertion failed: {} is not approximately {}",
            left,
            right
        );
    }};
}

/// Assertions for admission outcomes
pub trait AdmissionAssertions {
    fn assert_rate_limited(&self);
    fn assert_quota_exceeded(&self);
    fn assert_budget_exceeded(&self);
}

impl<T: std::fmt::Debug> AdmissionAssertions for Result<T, GovernanceError> {
    fn assert_rate_limited(&self) {
        assert!(
            matches!(self, Err(GovernanceError::RateLimited { .. })),
            "Expected rate limit denial, got {:?}",
            self
        );
    }

    fn assert_quota_exceeded(&self) {
        assert!(
            matches!(self, Err(GovernanceError::QuotaExceeded(_))),
            "Expected quota denial, got {:?}",
            self
        );
    }

    fn assert_budget_exceeded(&self) {
        assert!(
            matches!(self, Err(GovernanceError::BudgetExceeded { .. })),
            "Expected budget denial, got {:?}",
            self
        );
    }
}

/// Name of a plan variant, for readable failures
pub fn plan_name(plan: &GenerationPlan) -> &'static str {
    match plan {
        GenerationPlan::NoGeneration => "no_generation",
        GenerationPlan::ServeCached { .. } => "serve_cached",
        GenerationPlan::ServeStale { .. } => "serve_stale",
        GenerationPlan::Generate { .. } => "generate",
    }
}
