//! `genba machine` command - machine registry management

use clap::Subcommand;
use console::style;
use miette::Result;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{cell, into_diag, open_store, print_json, resolve_actor};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::machines::{MachinePatch, MachineService, NewMachine};

#[derive(Subcommand, Debug)]
pub enum MachineCommands {
    /// Register a new machine
    Add(AddArgs),

    /// List registered machines
    List,

    /// Show one machine
    Show(ShowArgs),

    /// Update machine fields
    Update(UpdateArgs),

    /// Delete a machine (cascades its checklists)
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Unique machine number (printed on the QR label)
    #[arg(long, short = 'm')]
    pub machine_no: String,

    /// Production line
    #[arg(long)]
    pub line_no: Option<String>,

    /// Machine model
    #[arg(long)]
    pub model: Option<String>,

    /// Standard daily target count
    #[arg(long, default_value_t = 0)]
    pub prod_plan: i64,

    /// Today's revised target
    #[arg(long, default_value_t = 0)]
    pub prod_plan_actual: i64,

    /// Cycle time in seconds per unit
    #[arg(long, default_value_t = 0.0)]
    pub mct: f64,

    /// Shift length in hours
    #[arg(long, default_value_t = 8.0)]
    pub working_hours: f64,

    /// Acting account (must be an admin)
    #[arg(long)]
    pub actor: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Machine id
    pub id: i64,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Machine id
    pub id: i64,

    #[arg(long)]
    pub machine_no: Option<String>,

    #[arg(long)]
    pub line_no: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub prod_plan: Option<i64>,

    #[arg(long)]
    pub prod_plan_actual: Option<i64>,

    #[arg(long)]
    pub mct: Option<f64>,

    #[arg(long)]
    pub working_hours: Option<f64>,

    /// Acting account (must be an admin)
    #[arg(long)]
    pub actor: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Machine id
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Acting account (must be an admin)
    #[arg(long)]
    pub actor: Option<String>,
}

pub fn run(cmd: MachineCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MachineCommands::Add(args) => run_add(args, global),
        MachineCommands::List => run_list(global),
        MachineCommands::Show(args) => run_show(args, global),
        MachineCommands::Update(args) => run_update(args, global),
        MachineCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let actor = resolve_actor(&store, args.actor.as_deref())?;

    let machine = MachineService::new(&store)
        .create(
            actor.role,
            NewMachine {
                machine_no: args.machine_no,
                line_no: args.line_no,
                model: args.model,
                prod_plan: args.prod_plan,
                prod_plan_actual: args.prod_plan_actual,
                mct: args.mct,
                working_hours: args.working_hours,
            },
        )
        .map_err(into_diag)?;

    match global.format {
        OutputFormat::Json => print_json(&machine),
        OutputFormat::Table => {
            println!(
                "{} Registered machine {} (id {})",
                style("✓").green(),
                style(&machine.machine_no).cyan(),
                machine.id
            );
            Ok(())
        }
    }
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let machines = MachineService::new(&store).list().map_err(into_diag)?;

    match global.format {
        OutputFormat::Json => print_json(&machines),
        OutputFormat::Table => {
            if machines.is_empty() {
                println!("No machines registered.");
                return Ok(());
            }
            let mut builder = Builder::default();
            builder.push_record(["ID", "MACHINE", "LINE", "MODEL", "PLAN", "MCT", "HOURS"]);
            for m in &machines {
                builder.push_record([
                    m.id.to_string(),
                    m.machine_no.clone(),
                    cell(&m.line_no),
                    cell(&m.model),
                    m.prod_plan.to_string(),
                    format!("{:.1}", m.mct),
                    format!("{:.1}", m.working_hours),
                ]);
            }
            println!("{}", builder.build().with(Style::sharp()));
            Ok(())
        }
    }
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let machine = MachineService::new(&store).get(args.id).map_err(into_diag)?;

    match global.format {
        OutputFormat::Json => print_json(&machine),
        OutputFormat::Table => {
            println!("{}: {}", style("Machine").bold(), style(&machine.machine_no).cyan());
            println!("{}: {}", style("Line").bold(), cell(&machine.line_no));
            println!("{}: {}", style("Model").bold(), cell(&machine.model));
            println!("{}: {}", style("Daily plan").bold(), machine.prod_plan);
            println!("{}: {:.1}s / unit", style("Cycle time").bold(), machine.mct);
            println!("{}: {:.1}h", style("Working hours").bold(), machine.working_hours);
            println!(
                "{}: {:.0} units",
                style("Theoretical max").bold(),
                machine.theoretical_max()
            );
            Ok(())
        }
    }
}

fn run_update(args: UpdateArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let actor = resolve_actor(&store, args.actor.as_deref())?;

    let machine = MachineService::new(&store)
        .update(
            actor.role,
            args.id,
            MachinePatch {
                machine_no: args.machine_no,
                line_no: args.line_no,
                model: args.model,
                prod_plan: args.prod_plan,
                prod_plan_actual: args.prod_plan_actual,
                mct: args.mct,
                working_hours: args.working_hours,
            },
        )
        .map_err(into_diag)?;

    match global.format {
        OutputFormat::Json => print_json(&machine),
        OutputFormat::Table => {
            println!(
                "{} Updated machine {}",
                style("✓").green(),
                style(&machine.machine_no).cyan()
            );
            Ok(())
        }
    }
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let actor = resolve_actor(&store, args.actor.as_deref())?;

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Delete machine {} and all of its checklists?",
                args.id
            ))
            .default(false)
            .interact()
            .map_err(|e| miette::miette!("{}", e))?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    MachineService::new(&store)
        .delete(actor.role, args.id)
        .map_err(into_diag)?;
    if !global.quiet {
        println!("{} Deleted machine {}", style("✓").green(), args.id);
    }
    Ok(())
}
