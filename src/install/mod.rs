//! Install orchestration for a single backend

mod orchestrator;
mod runner;

pub use orchestrator::{InstallOptions, InstallOutcome, Orchestrator};
pub use runner::{CommandRunner, ShellRunner};
