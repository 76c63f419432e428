pub mod page_result;
pub mod role;

pub use page_result::{
    AnalysisResults, CaptureOptions, MeasuredHeights, PageAnalysis, PageOutcome, PageResult,
    RegionImages,
};
pub use role::{homepage_index, is_homepage, resolve_roles, AnalysisRole, Region};
