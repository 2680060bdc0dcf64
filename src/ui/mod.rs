//! UI module for consistent CLI output
//!
//! Uses `cliclack` log lines and `indicatif` bars in interactive terminals,
//! with automatic fallback to plain `[OK]`/`[FAIL]` lines in CI.
//!
//! # Example
//!
//! ```rust,ignore
//! use depcache::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Cleaning cache...");
//! // ... do work ...
//! spinner.stop("cleaned 3 files from cache directory");
//!
//! ui::step_ok_detail(&ctx, "npm", "restored from local cache");
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_error, outro_success, step_error_detail, step_info, step_ok_detail,
    step_warn_hint,
};
pub use progress::{format_bytes, TaskSpinner, TransferBars};
