//! Report generation for risk analyses
//!
//! Both generators take the same slice of [`RiskReport`](crate::analysis::RiskReport) values
//! and write into any `core::fmt::Write` sink:
//! - **Console**: human-readable summary with colored risk levels and wrapped recommendations
//! - **JSON**: the batch envelope, a summary of risk-level counts plus one entry per repository

mod console;
mod json;

pub use console::generate as generate_console;
pub use json::generate as generate_json;
