//! A nested module surface for auto-mocking.

use mimic_mock::{impl_auto_mock, FnSlot};

/// Arithmetic helpers with a nested namespace.
pub struct Calc {
    pub sum: FnSlot<(i64, i64), i64>,
    pub advanced: Advanced,
    /// Anonymous closure assigned to a member.
    pub lambda_log2: FnSlot<(f64,), f64>,
}

pub struct Advanced {
    pub log2: FnSlot<(f64,), f64>,
}

impl_auto_mock!(Calc { sum, advanced, lambda_log2 });
impl_auto_mock!(Advanced { log2 });

impl Calc {
    pub fn new() -> Self {
        Self {
            sum: FnSlot::new("calc.sum", |(a, b): (i64, i64)| Ok(a + b)),
            advanced: Advanced {
                log2: FnSlot::new("calc.advanced.log2", |(x,): (f64,)| Ok(x.log2())),
            },
            lambda_log2: FnSlot::new("calc.lambda_log2", |(x,): (f64,)| Ok(x.log2())),
        }
    }
}

impl Default for Calc {
    fn default() -> Self {
        Self::new()
    }
}
