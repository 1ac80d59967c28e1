//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    audit::AuditArgs,
    checklist::ChecklistCommands,
    init::InitArgs,
    machine::MachineCommands,
    org::OrgCommands,
    stats::StatsCommands,
    user::UserCommands,
};

#[derive(Parser)]
#[command(name = "genba")]
#[command(author, version, about = "Factory-floor machine inspection tracker")]
#[command(
    long_about = "Track machine inspection checklists on the factory floor: operators submit \
                  OK/NG counts per shift, admins revise records under a bounded audit trail \
                  and read efficiency roll-ups."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// SQLite database file (overrides GENBA_DB_PATH; ignored when
    /// DATABASE_URL selects PostgreSQL)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize storage: create tables and seed default accounts
    Init(InitArgs),

    /// Machine management
    #[command(subcommand)]
    Machine(MachineCommands),

    /// Checklist submission, revision, and listing
    #[command(subcommand)]
    Checklist(ChecklistCommands),

    /// Account management
    #[command(subcommand)]
    User(UserCommands),

    /// Organization settings
    #[command(subcommand)]
    Org(OrgCommands),

    /// Efficiency analytics
    #[command(subcommand)]
    Stats(StatsCommands),

    /// Audit log
    Audit(AuditArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// JSON (for programming)
    Json,
}
