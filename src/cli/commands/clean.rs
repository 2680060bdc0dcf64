//! Clean command - delete cached archives

use crate::cache::LocalTier;
use crate::config::Config;
use crate::error::{DepcacheError, DepcacheResult};
use crate::ui::{TaskSpinner, UiContext};

/// Execute the clean command
pub async fn execute(config: &Config) -> DepcacheResult<()> {
    let ctx = UiContext::detect();
    let local = LocalTier::new(config.cache_directory());
    let root = local.root().to_path_buf();

    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Cleaning {}...", root.display()));

    let result = tokio::task::spawn_blocking(move || local.clean())
        .await
        .map_err(|e| DepcacheError::Internal(format!("clean task failed: {e}")))?;

    match result {
        Ok(removed) => {
            spinner.stop(&format!("cleaned {} files from cache directory", removed));
            Ok(())
        }
        Err(e) => {
            spinner.stop_error("Clean failed");
            Err(DepcacheError::io(format!("cleaning {}", root.display()), e))
        }
    }
}
