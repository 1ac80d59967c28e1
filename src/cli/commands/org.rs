//! `genba org` command - organization settings

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{cell, into_diag, open_store, print_json, resolve_actor};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::org::{OrgPatch, OrgService};

#[derive(Subcommand, Debug)]
pub enum OrgCommands {
    /// Show the organization profile
    Show,

    /// Update profile fields
    Update(UpdateArgs),
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    #[arg(long)]
    pub company_name: Option<String>,

    #[arg(long)]
    pub logo_url: Option<String>,

    #[arg(long)]
    pub plant_no: Option<String>,

    #[arg(long)]
    pub address: Option<String>,

    /// Acting account (must be an admin)
    #[arg(long)]
    pub actor: Option<String>,
}

pub fn run(cmd: OrgCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        OrgCommands::Show => run_show(global),
        OrgCommands::Update(args) => run_update(args, global),
    }
}

fn run_show(global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let settings = OrgService::new(&store).get().map_err(into_diag)?;

    match global.format {
        OutputFormat::Json => print_json(&settings),
        OutputFormat::Table => {
            println!(
                "{}: {}",
                style("Company").bold(),
                cell(&settings.company_name)
            );
            println!("{}: {}", style("Plant").bold(), cell(&settings.plant_no));
            println!("{}: {}", style("Address").bold(), cell(&settings.address));
            println!(
                "{}: {}",
                style("Plan").bold(),
                style(settings.subscription_plan).yellow()
            );
            Ok(())
        }
    }
}

fn run_update(args: UpdateArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let actor = resolve_actor(&store, args.actor.as_deref())?;

    let settings = OrgService::new(&store)
        .update(
            actor.role,
            OrgPatch {
                company_name: args.company_name,
                logo_url: args.logo_url,
                plant_no: args.plant_no,
                address: args.address,
            },
        )
        .map_err(into_diag)?;

    match global.format {
        OutputFormat::Json => print_json(&settings),
        OutputFormat::Table => {
            println!(
                "{} Updated organization {}",
                style("✓").green(),
                style(cell(&settings.company_name)).cyan()
            );
            Ok(())
        }
    }
}
