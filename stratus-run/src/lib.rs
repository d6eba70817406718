pub mod guard;
pub mod notifications;
pub mod report;
pub mod retry;
pub mod run;
pub mod workflow;

pub use run::{load, Orchestrator};
pub use workflow::{BackupWorkflow, Workflow};
