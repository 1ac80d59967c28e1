//! Shared helpers for CLI commands

use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::core::accounts::AccountService;
use crate::core::{bootstrap, Config, CoreError};
use crate::entities::Account;
use crate::store::Store;

/// Open the configured store and make sure the schema exists.
///
/// Bootstrap is idempotent, so every command can run it the way the
/// original service did at process start.
pub fn open_store(global: &GlobalOpts) -> Result<Store> {
    let mut config = Config::load();
    if let Some(db) = &global.db {
        config.db_path = Some(db.clone());
    }
    let store = config.open_store().map_err(|e| miette::miette!("{}", e))?;
    bootstrap::initialize(&store).map_err(into_diag)?;
    Ok(store)
}

/// Resolve `--actor` to an account; defaults to the configured author.
pub fn resolve_actor(store: &Store, actor: Option<&str>) -> Result<Account> {
    let username = match actor {
        Some(name) => name.to_string(),
        None => Config::load().author(),
    };
    AccountService::new(store)
        .find_by_username(&username)
        .map_err(into_diag)
}

pub fn into_diag(err: CoreError) -> miette::Report {
    miette::miette!("{}", err)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).into_diagnostic()?
    );
    Ok(())
}

/// Render an optional text cell for table output.
pub fn cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}
