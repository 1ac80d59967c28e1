//! `genba init` command - create tables and seed defaults

use console::style;
use miette::Result;

use crate::cli::helpers::open_store;
use crate::cli::GlobalOpts;
use crate::core::{bootstrap, Config};

#[derive(clap::Args, Debug)]
pub struct InitArgs {}

pub fn run(_args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;

    if !global.quiet {
        println!(
            "{} Storage initialized ({} backend)",
            style("✓").green(),
            style(store.backend_name()).cyan()
        );
        if store.backend_name() == "sqlite" {
            let mut config = Config::load();
            if let Some(db) = &global.db {
                config.db_path = Some(db.clone());
            }
            println!("   {}", style(config.sqlite_path().display()).dim());
        }
        println!(
            "   Default accounts: {} / {}",
            style(bootstrap::SEED_ADMIN.0).yellow(),
            style(bootstrap::SEED_OPERATOR.0).yellow()
        );
    }
    Ok(())
}
