//! `genba user` command - account management

use clap::Subcommand;
use console::style;
use miette::Result;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{into_diag, open_store, print_json, resolve_actor};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::accounts::{AccountService, NewAccount};
use crate::entities::Role;

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Register an account
    Add(AddArgs),

    /// List accounts
    List,

    /// Delete an account
    Delete(DeleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    #[arg(long, short = 'u')]
    pub username: String,

    #[arg(long, short = 'e')]
    pub email: String,

    /// Must be 8+ characters with a digit and a special character
    #[arg(long, short = 'p')]
    pub password: String,

    /// Account role
    #[arg(long, default_value = "operator")]
    pub role: Role,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Account id
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Acting account (must be an admin)
    #[arg(long)]
    pub actor: Option<String>,
}

pub fn run(cmd: UserCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        UserCommands::Add(args) => run_add(args, global),
        UserCommands::List => run_list(global),
        UserCommands::Delete(args) => run_delete(args, global),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let account = AccountService::new(&store)
        .register(NewAccount {
            username: args.username,
            email: args.email,
            password: args.password,
            role: args.role,
        })
        .map_err(into_diag)?;

    match global.format {
        OutputFormat::Json => print_json(&account),
        OutputFormat::Table => {
            println!(
                "{} Registered {} account {} (id {})",
                style("✓").green(),
                account.role,
                style(&account.username).cyan(),
                account.id
            );
            Ok(())
        }
    }
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let accounts = AccountService::new(&store).list().map_err(into_diag)?;

    match global.format {
        OutputFormat::Json => print_json(&accounts),
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["ID", "USERNAME", "EMAIL", "ROLE"]);
            for account in &accounts {
                builder.push_record([
                    account.id.to_string(),
                    account.username.clone(),
                    account.email.clone(),
                    account.role.to_string(),
                ]);
            }
            println!("{}", builder.build().with(Style::sharp()));
            Ok(())
        }
    }
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let store = open_store(global)?;
    let actor = resolve_actor(&store, args.actor.as_deref())?;

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Delete account {}?", args.id))
            .default(false)
            .interact()
            .map_err(|e| miette::miette!("{}", e))?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    AccountService::new(&store)
        .delete(actor.role, args.id)
        .map_err(into_diag)?;
    if !global.quiet {
        println!("{} Deleted account {}", style("✓").green(), args.id);
    }
    Ok(())
}
