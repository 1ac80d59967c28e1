//! `genba stats` command - efficiency analytics

use clap::Subcommand;
use miette::Result;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{cell, into_diag, open_store, print_json};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::stats::{efficiency_by_machine, trend_by_shift};

#[derive(Subcommand, Debug)]
pub enum StatsCommands {
    /// Production trend by date and shift
    Trend(TrendArgs),

    /// Per-machine efficiency roll-up
    Efficiency(EfficiencyArgs),
}

#[derive(clap::Args, Debug)]
pub struct TrendArgs {
    /// Trailing window in days
    #[arg(long, short = 'd', default_value_t = 7)]
    pub days: i64,
}

#[derive(clap::Args, Debug)]
pub struct EfficiencyArgs {
    /// Trailing window in days
    #[arg(long, short = 'd', default_value_t = 30)]
    pub days: i64,
}

pub fn run(cmd: StatsCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        StatsCommands::Trend(args) => run_trend(args, global),
        StatsCommands::Efficiency(args) => run_efficiency(args, global),
    }
}

fn run_trend(args: TrendArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let rows = trend_by_shift(&store, args.days).map_err(into_diag)?;

    match global.format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No submissions in the last {} days.", args.days);
                return Ok(());
            }
            let mut builder = Builder::default();
            builder.push_record(["DATE", "SHIFT", "TOTAL", "OK", "NG"]);
            for row in &rows {
                builder.push_record([
                    row.date.clone(),
                    row.shift.to_string(),
                    row.total.to_string(),
                    row.ok.to_string(),
                    row.ng.to_string(),
                ]);
            }
            println!("{}", builder.build().with(Style::sharp()));
            Ok(())
        }
    }
}

fn run_efficiency(args: EfficiencyArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let rows = efficiency_by_machine(&store, args.days).map_err(into_diag)?;

    match global.format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No machines registered.");
                return Ok(());
            }
            let mut builder = Builder::default();
            builder.push_record([
                "MACHINE",
                "MODEL",
                "PLAN",
                "OK",
                "NG",
                "SUBMISSIONS",
                "AVG BEKIDO",
            ]);
            for row in &rows {
                builder.push_record([
                    row.machine_no.clone(),
                    cell(&row.model),
                    row.prod_plan.to_string(),
                    row.total_ok.to_string(),
                    row.total_ng.to_string(),
                    row.submission_count.to_string(),
                    format!("{:.2}%", row.avg_bekido),
                ]);
            }
            println!("{}", builder.build().with(Style::sharp()));
            Ok(())
        }
    }
}
