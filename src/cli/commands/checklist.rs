//! `genba checklist` command - submission, revision, and listing

use clap::Subcommand;
use console::style;
use miette::Result;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{cell, into_diag, open_store, print_json, resolve_actor};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::lifecycle::{ChecklistPatch, ChecklistService, SubmitChecklist};
use crate::entities::{Checklist, ChecklistSummary};

#[derive(Subcommand, Debug)]
pub enum ChecklistCommands {
    /// Submit a new checklist for a machine
    Submit(SubmitArgs),

    /// Revise a submitted checklist (admin, max 3 edits)
    Revise(ReviseArgs),

    /// Retake the photo on a checklist (submitter or admin, no edit slot)
    Retake(RetakeArgs),

    /// Show one checklist with its edit history
    Show(ShowArgs),

    /// List checklists
    List(ListArgs),

    /// Hard-delete a checklist (admin)
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct SubmitArgs {
    /// Machine id (from the scanned QR code)
    #[arg(long, short = 'm')]
    pub machine: i64,

    /// OK (good) unit count
    #[arg(long)]
    pub ok: i64,

    /// NG (defective) unit count
    #[arg(long)]
    pub ng: i64,

    /// Total count; defaults to ok+ng
    #[arg(long)]
    pub total: Option<i64>,

    /// Submitting device description
    #[arg(long)]
    pub device: Option<String>,

    /// Geolocation string from the device
    #[arg(long)]
    pub location: Option<String>,

    /// Stored path of the checklist photo
    #[arg(long)]
    pub image: Option<String>,

    /// Submitting account
    #[arg(long)]
    pub actor: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ReviseArgs {
    /// Checklist id
    pub id: i64,

    #[arg(long)]
    pub ok: Option<i64>,

    #[arg(long)]
    pub ng: Option<i64>,

    #[arg(long)]
    pub total: Option<i64>,

    #[arg(long)]
    pub remarks: Option<String>,

    /// Replacement photo path
    #[arg(long)]
    pub image: Option<String>,

    /// Approval proof path
    #[arg(long)]
    pub proof: Option<String>,

    /// Acting account (must be an admin)
    #[arg(long)]
    pub actor: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RetakeArgs {
    /// Checklist id
    pub id: i64,

    /// New photo path
    #[arg(long)]
    pub image: String,

    /// Acting account (submitter or admin)
    #[arg(long)]
    pub actor: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Checklist id
    pub id: i64,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only checklists for this machine id
    #[arg(long)]
    pub machine: Option<i64>,

    /// Only the acting account's own submissions
    #[arg(long)]
    pub mine: bool,

    /// Maximum rows
    #[arg(long, short = 'n', default_value_t = 50)]
    pub limit: i64,

    /// Acting account (used with --mine)
    #[arg(long)]
    pub actor: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Checklist id
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Acting account (must be an admin)
    #[arg(long)]
    pub actor: Option<String>,
}

pub fn run(cmd: ChecklistCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ChecklistCommands::Submit(args) => run_submit(args, global),
        ChecklistCommands::Revise(args) => run_revise(args, global),
        ChecklistCommands::Retake(args) => run_retake(args, global),
        ChecklistCommands::Show(args) => run_show(args, global),
        ChecklistCommands::List(args) => run_list(args, global),
        ChecklistCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_submit(args: SubmitArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let actor = resolve_actor(&store, args.actor.as_deref())?;

    let checklist = ChecklistService::new(&store)
        .submit(SubmitChecklist {
            machine_id: args.machine,
            user_id: actor.id,
            ok_quantity: args.ok,
            ng_quantity: args.ng,
            total_quantity: args.total,
            device_info: args.device,
            location: args.location,
            image_path: args.image,
        })
        .map_err(into_diag)?;

    match global.format {
        OutputFormat::Json => print_json(&checklist),
        OutputFormat::Table => {
            println!(
                "{} Submitted checklist {} (shift {})",
                style("✓").green(),
                style(checklist.id).cyan(),
                style(checklist.shift).yellow()
            );
            println!(
                "   bekido {:.2}% | defect {:.2}%",
                checklist.bekido_percent, checklist.avg_ng_percent
            );
            Ok(())
        }
    }
}

fn run_revise(args: ReviseArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let actor = resolve_actor(&store, args.actor.as_deref())?;

    let checklist = ChecklistService::new(&store)
        .revise(
            args.id,
            actor.id,
            actor.role,
            ChecklistPatch {
                ok_quantity: args.ok,
                ng_quantity: args.ng,
                total_quantity: args.total,
                remarks: args.remarks,
                image_path: args.image,
                proof_path: args.proof,
                ..Default::default()
            },
        )
        .map_err(into_diag)?;

    match global.format {
        OutputFormat::Json => print_json(&checklist),
        OutputFormat::Table => {
            println!(
                "{} Revised checklist {} (edit {}/3)",
                style("✓").green(),
                style(checklist.id).cyan(),
                checklist.edit_count
            );
            println!(
                "   bekido {:.2}% | defect {:.2}%",
                checklist.bekido_percent, checklist.avg_ng_percent
            );
            Ok(())
        }
    }
}

fn run_retake(args: RetakeArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let actor = resolve_actor(&store, args.actor.as_deref())?;

    ChecklistService::new(&store)
        .replace_image(args.id, actor.id, actor.role, &args.image)
        .map_err(into_diag)?;
    if !global.quiet {
        println!(
            "{} Updated photo on checklist {}",
            style("✓").green(),
            args.id
        );
    }
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let checklist = ChecklistService::new(&store)
        .get(args.id)
        .map_err(into_diag)?;

    match global.format {
        OutputFormat::Json => print_json(&checklist),
        OutputFormat::Table => {
            print_checklist(&checklist);
            Ok(())
        }
    }
}

fn print_checklist(checklist: &Checklist) {
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {}  {}: {}",
        style("Checklist").bold(),
        style(checklist.id).cyan(),
        style("Shift").bold(),
        checklist.shift
    );
    println!(
        "{}: ok {} / ng {} / total {}",
        style("Quantities").bold(),
        checklist.ok_quantity,
        checklist.ng_quantity,
        checklist.total_quantity
    );
    println!(
        "{}: bekido {:.2}% | defect {:.2}%",
        style("Efficiency").bold(),
        checklist.bekido_percent,
        checklist.avg_ng_percent
    );
    println!("{}: {}", style("Photo").bold(), cell(&checklist.image_path));
    if checklist.approval_proof_path.is_some() {
        println!(
            "{}: {}",
            style("Proof").bold(),
            cell(&checklist.approval_proof_path)
        );
    }
    if let Some(remarks) = &checklist.remarks {
        println!("{}: {}", style("Remarks").bold(), remarks);
    }
    let lock_note = if checklist.is_locked() { " (locked)" } else { "" };
    println!(
        "{}: {}/3{}",
        style("Edits").bold(),
        checklist.edit_count,
        lock_note
    );
    if !checklist.edit_history.is_empty() {
        println!("{}", style("History:").bold());
        for (i, snap) in checklist.edit_history.iter().enumerate() {
            println!(
                "  {}. ok {} / ng {} / total {} by user {} at {}",
                i + 1,
                snap.ok,
                snap.ng,
                snap.total,
                snap.edited_by,
                snap.edited_at.format("%Y-%m-%d %H:%M")
            );
        }
    }
    println!("{}", style("─".repeat(60)).dim());
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let service = ChecklistService::new(&store);

    let summaries = if args.mine {
        let actor = resolve_actor(&store, args.actor.as_deref())?;
        service
            .for_submitter(actor.id, args.limit)
            .map_err(into_diag)?
    } else if let Some(machine_id) = args.machine {
        service.for_machine(machine_id).map_err(into_diag)?
    } else {
        service.recent(args.limit).map_err(into_diag)?
    };

    match global.format {
        OutputFormat::Json => print_json(&summaries),
        OutputFormat::Table => {
            if summaries.is_empty() {
                println!("No checklists found.");
                return Ok(());
            }
            print_summary_table(&summaries);
            Ok(())
        }
    }
}

fn print_summary_table(summaries: &[ChecklistSummary]) {
    let mut builder = Builder::default();
    builder.push_record([
        "ID", "MACHINE", "OPERATOR", "SHIFT", "OK", "NG", "TOTAL", "BEKIDO", "EDITS",
    ]);
    for s in summaries {
        let c = &s.checklist;
        builder.push_record([
            c.id.to_string(),
            s.machine_no.clone(),
            cell(&s.username),
            c.shift.to_string(),
            c.ok_quantity.to_string(),
            c.ng_quantity.to_string(),
            c.total_quantity.to_string(),
            format!("{:.2}%", c.bekido_percent),
            c.edit_count.to_string(),
        ]);
    }
    println!("{}", builder.build().with(Style::sharp()));
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let actor = resolve_actor(&store, args.actor.as_deref())?;

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Permanently delete checklist {}?", args.id))
            .default(false)
            .interact()
            .map_err(|e| miette::miette!("{}", e))?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    ChecklistService::new(&store)
        .delete(args.id, actor.role)
        .map_err(into_diag)?;
    if !global.quiet {
        println!("{} Deleted checklist {}", style("✓").green(), args.id);
    }
    Ok(())
}
