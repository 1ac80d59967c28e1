use clap::Parser;
use genba::cli::{Cli, Commands};
use miette::Result;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    // Install miette's fancy error handler for readable diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => genba::cli::commands::init::run(args, &global),
        Commands::Machine(cmd) => genba::cli::commands::machine::run(cmd, &global),
        Commands::Checklist(cmd) => genba::cli::commands::checklist::run(cmd, &global),
        Commands::User(cmd) => genba::cli::commands::user::run(cmd, &global),
        Commands::Org(cmd) => genba::cli::commands::org::run(cmd, &global),
        Commands::Stats(cmd) => genba::cli::commands::stats::run(cmd, &global),
        Commands::Audit(args) => genba::cli::commands::audit::run(args, &global),
    }
}
