// Page Segmenter - Core
//
// Batch screenshot segmentation: each URL is captured by an external tool,
// split into header/body/footer regions and analysed, with progress streamed
// to observers as server-sent events.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
