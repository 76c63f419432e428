//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod jobs;
pub mod output_parser;
pub mod scheduled_tasks;
pub mod subprocess;
pub mod test_dependencies;

pub use deps::ServerDeps;
pub use jobs::{EventBroadcaster, JobEvent, JobManager, JobStore};
pub use subprocess::{Invocation, ProcessOutcome, ProcessRunner, SubprocessRunner};
