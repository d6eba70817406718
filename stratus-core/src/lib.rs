pub mod config;
pub mod context;
pub mod exec;
pub mod model;
pub mod ops;
pub mod restic;
pub mod secrets;
pub mod settings;
pub mod tag;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
