//! `genba audit` command - revision audit trail

use miette::Result;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{into_diag, open_store, print_json};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::audit;

#[derive(clap::Args, Debug)]
pub struct AuditArgs {
    /// Maximum entries, newest first
    #[arg(long, short = 'n', default_value_t = 50)]
    pub limit: i64,
}

pub fn run(args: AuditArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let entries = audit::recent(&store, args.limit).map_err(into_diag)?;

    match global.format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Table => {
            if entries.is_empty() {
                println!("Audit log is empty.");
                return Ok(());
            }
            let mut builder = Builder::default();
            builder.push_record(["ID", "WHEN", "ACTION", "TARGET", "BY", "OLD", "NEW"]);
            for entry in &entries {
                builder.push_record([
                    entry.id.to_string(),
                    entry
                        .logged_at
                        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    entry.action.clone(),
                    format!(
                        "{}#{}",
                        entry.table_name,
                        entry.target_id.map_or("-".to_string(), |id| id.to_string())
                    ),
                    entry
                        .user_id
                        .map_or("-".to_string(), |id| id.to_string()),
                    entry.old_values.clone().unwrap_or_else(|| "-".to_string()),
                    entry.new_values.clone().unwrap_or_else(|| "-".to_string()),
                ]);
            }
            println!("{}", builder.build().with(Style::sharp()));
            Ok(())
        }
    }
}
