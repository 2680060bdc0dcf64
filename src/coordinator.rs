//! Concurrent multi-backend runs
//!
//! Every backend runs to completion on its own; one backend failing never
//! cancels or affects another. The summary keeps input order.

use crate::backend::BackendConfig;
use crate::cache::TieredCache;
use crate::error::DepcacheError;
use crate::install::{CommandRunner, InstallOptions, InstallOutcome, Orchestrator};
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{error, info, info_span, Instrument};

/// Result of one backend's run
#[derive(Debug)]
pub struct BackendReport {
    pub name: String,
    pub result: Result<InstallOutcome, DepcacheError>,
}

impl BackendReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Reports for every backend, in input order
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<BackendReport>,
}

impl RunSummary {
    /// True when no backend ended fatally
    pub fn is_success(&self) -> bool {
        self.reports.iter().all(BackendReport::is_success)
    }

    /// Reports of backends that ended fatally
    pub fn failures(&self) -> Vec<&BackendReport> {
        self.reports.iter().filter(|r| !r.is_success()).collect()
    }

    /// Turn the summary into the command's exit status
    pub fn into_result(self) -> Result<Self, DepcacheError> {
        let failed: Vec<String> = self.failures().iter().map(|r| r.name.clone()).collect();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(DepcacheError::BackendsFailed {
                count: failed.len(),
                names: failed.join(", "),
            })
        }
    }
}

/// Fans a set of backends out to concurrent orchestrators
pub struct Coordinator {
    cache: TieredCache,
    runner: Arc<dyn CommandRunner>,
    options: InstallOptions,
}

impl Coordinator {
    pub fn new(cache: TieredCache, runner: Arc<dyn CommandRunner>, options: InstallOptions) -> Self {
        Self {
            cache,
            runner,
            options,
        }
    }

    /// Run every backend and wait for all of them
    pub async fn run(&self, backends: &[BackendConfig]) -> RunSummary {
        let orchestrator = Orchestrator::new(&self.cache, self.runner.as_ref(), self.options);

        let runs = backends.iter().map(|backend| {
            let orchestrator = &orchestrator;
            let span = info_span!("backend", backend = %backend.name);
            async move {
                let result = orchestrator.load_dependencies(backend).await;
                match &result {
                    Ok(outcome) => info!("{}", outcome),
                    Err(err) => error!("{}", err),
                }
                BackendReport {
                    name: backend.name.clone(),
                    result,
                }
            }
            .instrument(span)
        });

        RunSummary {
            reports: join_all(runs).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{bower, npm};
    use crate::cache::{CacheTier, LocalTier};
    use crate::testing::MockRunner;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn one_failure_fails_the_run_but_not_siblings() {
        let project = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        fs::write(
            project.path().join("package.json"),
            r#"{"name": "app", "dependencies": {"lodash": "4.17.21"}}"#,
        )
        .unwrap();
        fs::write(project.path().join("bower.json"), r#"{"name": "app"}"#).unwrap();

        let mut bower = bower::config(project.path()).unwrap();
        // Exit code 7 for bower only
        bower.install_command = "exit 7".to_string();
        let backends = vec![npm::config(project.path()).unwrap(), bower];

        let runner = Arc::new(FailingCommand {
            inner: MockRunner::new().installing_into(project.path().join("node_modules")),
            failing: "exit 7",
        });
        let coordinator = Coordinator::new(
            TieredCache::new(LocalTier::new(cache_dir.path()), None),
            runner,
            InstallOptions::default(),
        );

        let summary = coordinator.run(&backends).await;
        assert!(!summary.is_success());
        assert_eq!(summary.reports[0].name, "npm");
        assert_eq!(
            summary.reports[0].result.as_ref().unwrap(),
            &InstallOutcome::InstalledAndCached
        );
        assert_eq!(summary.failures().len(), 1);
        assert_eq!(summary.failures()[0].name, "bower");

        let err = summary.into_result().unwrap_err();
        assert_eq!(err.to_string(), "1 package manager(s) failed: bower");

        // npm's entry is reusable on the next run
        fs::remove_dir_all(project.path().join("node_modules")).unwrap();
        let rerun = coordinator.run(&backends[..1]).await;
        assert_eq!(
            rerun.reports[0].result.as_ref().unwrap(),
            &InstallOutcome::CacheHit {
                tier: CacheTier::Local
            }
        );
    }

    #[tokio::test]
    async fn skipped_backends_succeed() {
        let project = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        let backends = vec![
            npm::config(project.path()).unwrap(),
            bower::config(project.path()).unwrap(),
        ];

        let coordinator = Coordinator::new(
            TieredCache::new(LocalTier::new(cache_dir.path()), None),
            Arc::new(MockRunner::new()),
            InstallOptions::default(),
        );
        let summary = coordinator.run(&backends).await.into_result().unwrap();
        assert!(summary
            .reports
            .iter()
            .all(|r| matches!(r.result, Ok(InstallOutcome::Skipped))));
    }

    #[tokio::test]
    async fn empty_run_is_success() {
        let cache_dir = TempDir::new().unwrap();
        let coordinator = Coordinator::new(
            TieredCache::new(LocalTier::new(cache_dir.path()), None),
            Arc::new(MockRunner::new()),
            InstallOptions::default(),
        );
        assert!(coordinator.run(&[]).await.is_success());
    }

    #[tokio::test]
    async fn backends_run_concurrently() {
        let project = TempDir::new().unwrap();
        let cache_dir = TempDir::new().unwrap();
        fs::write(project.path().join("package.json"), r#"{"name": "app"}"#).unwrap();
        fs::write(project.path().join("bower.json"), r#"{"name": "app"}"#).unwrap();
        let backends = vec![
            npm::config(project.path()).unwrap(),
            bower::config(project.path()).unwrap(),
        ];

        // npm's install only finishes once bower's install has started
        let runner = Arc::new(Handoff {
            inner: MockRunner::new(),
            waiter: backends[0].install_command.clone(),
            releaser: backends[1].install_command.clone(),
            release: tokio::sync::Notify::new(),
        });
        let coordinator = Coordinator::new(
            TieredCache::new(LocalTier::new(cache_dir.path()), None),
            runner,
            InstallOptions::default(),
        );

        let summary = tokio::time::timeout(Duration::from_secs(10), coordinator.run(&backends))
            .await
            .expect("backends ran one after another");
        assert!(summary.is_success());
        assert_eq!(summary.reports.len(), 2);
    }

    /// Blocks one install command until another one runs
    struct Handoff {
        inner: MockRunner,
        waiter: String,
        releaser: String,
        release: tokio::sync::Notify,
    }

    #[async_trait::async_trait]
    impl CommandRunner for Handoff {
        async fn run(&self, command: &str, cwd: &std::path::Path) -> crate::error::DepcacheResult<i32> {
            if command == self.waiter {
                self.release.notified().await;
            } else if command == self.releaser {
                self.release.notify_one();
            }
            self.inner.run(command, cwd).await
        }

        async fn output(
            &self,
            command: &str,
            cwd: &std::path::Path,
        ) -> crate::error::DepcacheResult<Option<String>> {
            self.inner.output(command, cwd).await
        }
    }

    /// Delegates to a mock but exits non-zero for one command
    struct FailingCommand {
        inner: MockRunner,
        failing: &'static str,
    }

    #[async_trait::async_trait]
    impl CommandRunner for FailingCommand {
        async fn run(&self, command: &str, cwd: &std::path::Path) -> crate::error::DepcacheResult<i32> {
            if command == self.failing {
                return Ok(7);
            }
            self.inner.run(command, cwd).await
        }

        async fn output(
            &self,
            command: &str,
            cwd: &std::path::Path,
        ) -> crate::error::DepcacheResult<Option<String>> {
            self.inner.output(command, cwd).await
        }
    }
}
