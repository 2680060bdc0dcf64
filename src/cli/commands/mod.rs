//! CLI command implementations

pub mod backends;
pub mod clean;
pub mod install;

pub use backends::execute as backends;
pub use clean::execute as clean;
pub use install::execute as install;
