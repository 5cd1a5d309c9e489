use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Validated inputs for a single projection.
///
/// `error_rate_manual` stays on the 0-100 percentage scale; the engine converts
/// it to a fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoiInputs {
    pub monthly_invoice_volume: f64,
    pub num_ap_staff: f64,
    pub avg_hours_per_invoice: f64,
    pub hourly_wage: f64,
    pub error_rate_manual: f64,
    pub error_cost: f64,
    pub time_horizon_months: u32,
    pub one_time_implementation_cost: f64,
}

impl RoiInputs {
    /// Checks the data-model bounds. The volume check runs first so a bad
    /// volume always reports the same message.
    pub fn validate(&self) -> Result<(), String> {
        if !self.monthly_invoice_volume.is_finite() || self.monthly_invoice_volume <= 0.0 {
            return Err("Invalid invoice volume".to_string());
        }

        for (name, value) in [
            ("num_ap_staff", self.num_ap_staff),
            ("avg_hours_per_invoice", self.avg_hours_per_invoice),
            ("hourly_wage", self.hourly_wage),
            ("error_cost", self.error_cost),
            (
                "one_time_implementation_cost",
                self.one_time_implementation_cost,
            ),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a number >= 0"));
            }
        }

        if !self.error_rate_manual.is_finite() || !(0.0..=100.0).contains(&self.error_rate_manual)
        {
            return Err("error_rate_manual must be between 0 and 100".to_string());
        }

        if self.time_horizon_months == 0 {
            return Err("time_horizon_months must be > 0".to_string());
        }

        Ok(())
    }
}

/// Unrounded engine output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiProjection {
    pub cost_manual: f64,
    pub cost_auto: f64,
    pub error_savings: f64,
    pub monthly_savings: f64,
    pub cumulative_savings: f64,
    pub net_savings: f64,
    pub payback_months: f64,
    pub roi_percentage: f64,
    pub time_horizon_months: u32,
}

impl RoiProjection {
    /// Renders the projection with fixed decimal places: currency to 2,
    /// months and percentages to 1.
    pub fn formatted(&self) -> RoiResults {
        RoiResults {
            monthly_savings: fixed(self.monthly_savings, 2),
            cumulative_savings: fixed(self.cumulative_savings, 2),
            net_savings: fixed(self.net_savings, 2),
            payback_months: fixed(self.payback_months, 1),
            roi_percentage: fixed(self.roi_percentage, 1),
            cost_manual: fixed(self.cost_manual, 2),
            cost_auto: fixed(self.cost_auto, 2),
            error_savings: fixed(self.error_savings, 2),
            time_horizon_months: self.time_horizon_months,
        }
    }

    /// Whether every figure is a real number. Finite inputs can still
    /// overflow to infinity once multiplied together.
    pub fn is_finite(&self) -> bool {
        [
            self.cost_manual,
            self.cost_auto,
            self.error_savings,
            self.monthly_savings,
            self.cumulative_savings,
            self.net_savings,
            self.payback_months,
            self.roi_percentage,
        ]
        .iter()
        .all(|value| value.is_finite())
    }
}

/// Projection as it is returned to clients and persisted with a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoiResults {
    pub monthly_savings: String,
    pub cumulative_savings: String,
    pub net_savings: String,
    pub payback_months: String,
    pub roi_percentage: String,
    pub cost_manual: String,
    pub cost_auto: String,
    pub error_savings: String,
    pub time_horizon_months: u32,
}

/// Rounds the exact binary value with ties away from zero, so `40.25` renders
/// as `40.3` at one place.
fn fixed(value: f64, places: usize) -> String {
    let rendered = match Decimal::from_f64_retain(value) {
        Some(exact) => {
            let rounded = exact
                .round_dp_with_strategy(places as u32, RoundingStrategy::MidpointAwayFromZero);
            format!("{rounded:.places$}")
        }
        // Non-finite or beyond the decimal range; no fractional ties exist there.
        None => format!("{value:.places$}"),
    };
    // "-0.00" carries no information once rounded.
    if rendered.starts_with('-') && rendered[1..].chars().all(|c| c == '0' || c == '.') {
        rendered[1..].to_string()
    } else {
        rendered
    }
}
