//! Efficiency calculator - pure derivation of defect and yield percentages
//!
//! Yield ("bekido") is actual output as a percentage of the theoretical
//! maximum output a machine could produce in one shift: the shift length in
//! seconds divided by the machine cycle time. A zero cycle time means the
//! theoretical maximum is treated as zero and yield is zero, never
//! infinite.
//!
//! Both percentages are rounded to two decimal places here, stored, and
//! treated as authoritative afterwards; reporting code never recomputes
//! them from raw quantities.

use serde::Serialize;

/// Derived percentages for one checklist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Efficiency {
    /// NG ratio over the reported total, in percent.
    pub defect_percent: f64,

    /// OK output over theoretical maximum output, in percent.
    pub yield_percent: f64,
}

/// Derive both percentages from submitted quantities and machine rates.
///
/// Negative inputs are the caller's problem; this layer only guards the
/// zero denominators.
pub fn derive(
    ok_quantity: i64,
    ng_quantity: i64,
    total_quantity: i64,
    mct_seconds: f64,
    working_hours: f64,
) -> Efficiency {
    let defect_percent = if total_quantity > 0 {
        (ng_quantity as f64 / total_quantity as f64) * 100.0
    } else {
        0.0
    };

    let yield_percent = if mct_seconds > 0.0 && working_hours > 0.0 {
        let theoretical_max = (working_hours * 3600.0) / mct_seconds;
        (ok_quantity as f64 / theoretical_max) * 100.0
    } else {
        0.0
    };

    Efficiency {
        defect_percent: round2(defect_percent),
        yield_percent: round2(yield_percent),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
