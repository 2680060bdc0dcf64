//! Install command - restore or install dependencies

use crate::backend::{BackendConfig, BackendRegistry};
use crate::cache::{LocalTier, RemoteTier, TieredCache};
use crate::cli::args::InstallArgs;
use crate::config::Config;
use crate::coordinator::{Coordinator, RunSummary};
use crate::error::{DepcacheError, DepcacheResult};
use crate::install::{InstallOptions, InstallOutcome, ShellRunner};
use crate::remote::{S3Credentials, S3Store};
use crate::ui::{self, TransferBars, UiContext};
use std::env;
use std::sync::Arc;
use tracing::debug;

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config) -> DepcacheResult<()> {
    let ctx = UiContext::detect();
    let registry = BackendRegistry::builtin();
    let requests = args.manager_requests(&registry)?;

    let project_dir = match args.project {
        Some(ref dir) => dir.clone(),
        None => env::current_dir().map_err(|e| DepcacheError::io("getting current directory", e))?,
    };
    let project_dir = project_dir
        .canonicalize()
        .map_err(|e| DepcacheError::io(format!("resolving {}", project_dir.display()), e))?;

    let backends = requests
        .iter()
        .map(|r| {
            registry
                .create(&r.name, &project_dir)
                .map(|b| b.with_install_args(&r.args))
        })
        .collect::<DepcacheResult<Vec<BackendConfig>>>()?;

    let cache = tiered_cache(config, &ctx)?;
    let coordinator = Coordinator::new(
        cache,
        Arc::new(ShellRunner),
        InstallOptions {
            force_refresh: args.force_refresh,
        },
    );

    let summary = coordinator.run(&backends).await;
    print_summary(&ctx, &summary);
    summary.into_result().map(|_| ())
}

/// Local tier from config, plus the S3 tier when credentials are complete
fn tiered_cache(config: &Config, ctx: &UiContext) -> DepcacheResult<TieredCache> {
    let local = LocalTier::new(config.cache_directory());
    debug!("Cache directory: {}", local.root().display());

    let remote = config.remote.settings()?.map(|settings| {
        debug!(
            "Remote cache: bucket {} in {}",
            settings.bucket, settings.region
        );
        let store = S3Store::new(
            S3Credentials {
                access_key_id: settings.access_key_id,
                secret_access_key: settings.secret_access_key,
            },
            &settings.region,
            settings.endpoint.as_deref(),
        );
        RemoteTier::new(Arc::new(store), settings.bucket, TransferBars::new(ctx))
    });

    Ok(TieredCache::new(local, remote))
}

fn print_summary(ctx: &UiContext, summary: &RunSummary) {
    for report in &summary.reports {
        match &report.result {
            Ok(InstallOutcome::Skipped) => {
                ui::step_info(ctx, &format!("{}: {}", report.name, InstallOutcome::Skipped));
            }
            Ok(outcome @ InstallOutcome::InstalledCacheFailed { .. }) => {
                ui::step_warn_hint(ctx, &report.name, &outcome.to_string());
            }
            Ok(outcome) => ui::step_ok_detail(ctx, &report.name, &outcome.to_string()),
            Err(err) => ui::step_error_detail(ctx, &report.name, &err.to_string()),
        }
    }

    let failed = summary.failures().len();
    if failed == 0 {
        ui::outro_success(ctx, "Dependencies ready");
    } else {
        ui::outro_error(ctx, &format!("{} of {} failed", failed, summary.reports.len()));
    }
}
