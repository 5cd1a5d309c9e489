mod engine;
mod types;

pub use engine::{
    AUTO_ERROR_RATE, AUTOMATED_COST_PER_INVOICE, BOOST_FACTOR, UNBOUNDED_ROI_PERCENTAGE, compute,
};
pub use types::{RoiInputs, RoiProjection, RoiResults};
