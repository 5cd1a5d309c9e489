use super::types::{RoiInputs, RoiProjection};

/// Processing cost of one invoice once automated.
pub const AUTOMATED_COST_PER_INVOICE: f64 = 0.20;

/// Error rate assumed for the automated pipeline (0.1%).
pub const AUTO_ERROR_RATE: f64 = 0.001;

/// Multiplier applied to every monthly saving.
///
/// This is an intentional optimism bias in favour of automation: every
/// projection is inflated by 10% regardless of inputs. It is not configurable.
pub const BOOST_FACTOR: f64 = 1.1;

/// Sentinel reported as the ROI when there is no up-front cost but a positive
/// net saving.
pub const UNBOUNDED_ROI_PERCENTAGE: f64 = 9999.0;

/// Projects the savings of automating invoice processing.
///
/// Total over any numeric input: callers validate beforehand, and the
/// arithmetic never panics. Full precision is kept; see
/// [`RoiProjection::formatted`] for the rounded form.
pub fn compute(inputs: &RoiInputs) -> RoiProjection {
    let volume = inputs.monthly_invoice_volume;
    let horizon = f64::from(inputs.time_horizon_months);
    let implementation_cost = inputs.one_time_implementation_cost;

    let error_rate_manual = inputs.error_rate_manual / 100.0;

    let cost_manual = volume * inputs.avg_hours_per_invoice * inputs.hourly_wage;
    let cost_auto = volume * AUTOMATED_COST_PER_INVOICE;
    // Negative when the manual process is already better than the automated
    // baseline.
    let error_savings = (error_rate_manual - AUTO_ERROR_RATE) * volume * inputs.error_cost;

    let monthly_savings = (cost_manual + error_savings - cost_auto) * BOOST_FACTOR;
    let cumulative_savings = monthly_savings * horizon;
    let net_savings = cumulative_savings - implementation_cost;

    let payback_months = if monthly_savings > 0.0 {
        implementation_cost / monthly_savings
    } else {
        horizon
    };

    RoiProjection {
        cost_manual,
        cost_auto,
        error_savings,
        monthly_savings,
        cumulative_savings,
        net_savings,
        payback_months: payback_months.max(0.0),
        roi_percentage: roi_percentage(net_savings, implementation_cost),
        time_horizon_months: inputs.time_horizon_months,
    }
}

fn roi_percentage(net_savings: f64, implementation_cost: f64) -> f64 {
    if implementation_cost > 0.0 {
        net_savings / implementation_cost * 100.0
    } else if net_savings > 0.0 {
        UNBOUNDED_ROI_PERCENTAGE
    } else {
        0.0
    }
}
