mod result;
mod state;

pub use result::RunResult;
pub use state::{ContainerAction, Failure, RepoSize, ResticStep, ServiceState, Status, Step};

pub const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
