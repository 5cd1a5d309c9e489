pub mod api;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod service;
pub mod store;

pub use error::{Result, RoiError, StoreError};
pub use service::ScenarioService;
