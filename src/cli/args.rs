//! CLI argument definitions using clap derive

use crate::backend::BackendRegistry;
use crate::error::{DepcacheError, DepcacheResult};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// depcache - cache package-manager installs by manifest fingerprint
///
/// Restores node_modules, bower_components or vendor from a local or S3
/// cache when the dependency manifest is unchanged, and installs and caches
/// them when it is not.
#[derive(Parser, Debug)]
#[command(name = "depcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DEPCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .depcache.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,

    /// Local cache directory (overrides config)
    #[arg(long, global = true, env = "DEPCACHE_DIR")]
    pub cache_directory: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore or install dependencies for one or more package managers
    Install(InstallArgs),

    /// Delete every cached archive from the cache directory
    Clean,

    /// List supported package managers
    Backends,
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Ignore cached entries, reinstall and overwrite the cache
    #[arg(short = 'r', long)]
    pub force_refresh: bool,

    /// Project directory (defaults to current directory)
    #[arg(short, long)]
    pub project: Option<PathBuf>,

    /// Package managers to run, each optionally followed by extra install
    /// arguments, e.g. `npm --production bower`. Defaults to all.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "MANAGER [ARGS]")]
    pub managers: Vec<String>,
}

/// One requested package manager and its extra install arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerRequest {
    pub name: String,
    pub args: Vec<String>,
}

impl InstallArgs {
    /// Group the trailing words into manager requests.
    ///
    /// A registered name starts a new request; any other word is an argument
    /// for the request before it. A repeated name resumes its earlier request
    /// so each backend runs once. No words selects every registered backend.
    pub fn manager_requests(&self, registry: &BackendRegistry) -> DepcacheResult<Vec<ManagerRequest>> {
        if self.managers.is_empty() {
            return Ok(registry
                .names()
                .into_iter()
                .map(|name| ManagerRequest {
                    name: name.to_string(),
                    args: Vec::new(),
                })
                .collect());
        }

        let mut requests: Vec<ManagerRequest> = Vec::new();
        let mut current: Option<usize> = None;
        for word in &self.managers {
            if registry.contains(word) {
                let index = match requests.iter().position(|r| &r.name == word) {
                    Some(index) => index,
                    None => {
                        requests.push(ManagerRequest {
                            name: word.clone(),
                            args: Vec::new(),
                        });
                        requests.len() - 1
                    }
                };
                current = Some(index);
            } else if let Some(index) = current {
                requests[index].args.push(word.clone());
            } else {
                return Err(DepcacheError::UnknownBackend(word.clone()));
            }
        }
        Ok(requests)
    }
}
