//! Backends command - list supported package managers

use crate::backend::BackendRegistry;
use crate::error::DepcacheResult;
use crate::ui::{self, UiContext};

/// Execute the backends command
pub async fn execute() -> DepcacheResult<()> {
    let ctx = UiContext::detect();
    let registry = BackendRegistry::builtin();

    ui::intro(&ctx, "Package managers");
    for (name, manifest) in registry.describe() {
        ui::key_value(&ctx, name, manifest);
    }
    Ok(())
}
