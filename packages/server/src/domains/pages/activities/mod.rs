//! Pipeline stages, one collaborator call each.

pub mod analyze;
pub mod capture;

pub use analyze::{analyze_page, missing_inputs};
pub use capture::{capture_page, CapturedPage};
