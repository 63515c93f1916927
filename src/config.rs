use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::locator::ResourceLocator;
use crate::scope::{ResourceScope, SearchScope};

pub const CLASS_PATH_ENV: &str = "CLASSPATH";
pub const CONTEXT_CLASS_PATH_ENV: &str = "CLASS_KIT_CONTEXT_CLASSPATH";
pub const STAGING_DIR_ENV: &str = "CLASS_KIT_STAGING_DIR";
pub const LOG_ENV: &str = "CLASS_KIT_LOG";

pub fn resolve_class_path(cli: &Cli) -> String {
    if let Some(cp) = cli.class_path.clone() {
        return cp;
    }
    non_empty_env(CLASS_PATH_ENV).unwrap_or_else(|| ".".to_string())
}

pub fn resolve_context_class_path(cli: &Cli) -> Option<String> {
    cli.context_class_path
        .clone()
        .or_else(|| non_empty_env(CONTEXT_CLASS_PATH_ENV))
}

pub fn resolve_staging_root(cli: &Cli) -> PathBuf {
    if let Some(dir) = cli.staging_dir.clone() {
        return dir;
    }
    non_empty_env(STAGING_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir)
}

pub fn build_locator(cli: &Cli) -> Result<ResourceLocator> {
    let class_path = resolve_class_path(cli);
    let defining: Arc<dyn ResourceScope> = Arc::new(
        SearchScope::parse(&class_path).with_context(|| format!("Invalid class path: {class_path}"))?,
    );

    let context = match resolve_context_class_path(cli) {
        Some(cp) => {
            let scope = SearchScope::parse(&cp).with_context(|| format!("Invalid context class path: {cp}"))?;
            Some(Arc::new(scope) as Arc<dyn ResourceScope>)
        }
        None => None,
    };

    Ok(ResourceLocator::new(defining).with_context(context))
}

/// Logs go to stderr so stdout stays parseable.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
