// HTTP routes
pub mod health;
pub mod jobs;
pub mod pages;
pub mod stream;
pub mod validation;

pub use health::*;
pub use jobs::*;
pub use pages::*;
pub use stream::*;
