mod config;
mod create;
mod cron;
mod diff;
mod edit;
mod error;
mod install;
mod list;
mod materialize;
mod placeholder;
mod reconcile;
mod request;
mod systemctl;
mod templates;
mod timer;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::request::{RawRequest, Scope};

#[derive(Parser)]
#[command(
    name = "mkunit",
    about = "Generate and install systemd service/timer units from templates"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Config file (default: ~/.config/mkunit/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a service (and optionally a timer) unit and install it
    ///
    /// mkunit create "Backup Home" "tar -czf /tmp/b.tar.gz /home/user" --frequency 1d
    #[command(group(ArgGroup::new("schedule").args(["frequency", "calendar", "cron"])))]
    Create {
        /// Unit name; whitespace becomes '_' and it is lower-cased
        name: String,
        /// Command line for ExecStart=
        command: String,
        /// Description= of the service
        #[arg(short, long)]
        description: Option<String>,
        /// Install system-wide (/etc/systemd/system) instead of per user
        #[arg(long, conflicts_with = "user")]
        system: bool,
        /// Install for the current user (default)
        #[arg(long)]
        user: bool,
        /// Template name
        #[arg(short, long)]
        template: Option<String>,
        /// Run every SPAN (systemd time span, e.g. 15min, 1d)
        #[arg(short, long, value_name = "SPAN")]
        frequency: Option<String>,
        /// Run on a systemd calendar expression (e.g. "Mon *-*-* 09:00:00")
        #[arg(short, long, value_name = "EXPR")]
        calendar: Option<String>,
        /// Run on a cron expression (e.g. "0 9 * * 1-5" or @daily)
        #[arg(long, value_name = "CRON")]
        cron: Option<String>,
        /// Never create a timer
        #[arg(long, conflicts_with = "schedule")]
        no_timer: bool,
        /// Start the service after installing
        #[arg(short, long)]
        start: bool,
        /// Enable and start the timer after installing
        #[arg(short, long)]
        enable: bool,
        /// Open the generated files in $EDITOR before installing
        #[arg(long)]
        edit: bool,
        /// Overwrite existing files without asking
        #[arg(short, long)]
        yes: bool,
        /// Print the generated units and exit
        #[arg(long)]
        dry_run: bool,
        /// Additional template directory, searched first
        #[arg(long, value_name = "DIR")]
        template_dir: Option<PathBuf>,
    },
    /// List available templates
    Templates {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Additional template directory, searched first
        #[arg(long, value_name = "DIR")]
        template_dir: Option<PathBuf>,
    },
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = config::Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Create {
            name,
            command,
            description,
            system,
            user,
            template,
            frequency,
            calendar,
            cron,
            no_timer,
            start,
            enable,
            edit,
            yes,
            dry_run,
            template_dir,
        } => {
            let scope = if system {
                Some(Scope::System)
            } else if user {
                Some(Scope::User)
            } else {
                None
            };
            let calendar = match cron {
                Some(expr) => Some(cron::to_calendar(&expr)?),
                None => calendar,
            };
            let request = RawRequest {
                name,
                command,
                description,
                scope,
                frequency,
                calendar,
                template,
                no_timer,
                start,
                enable,
            };
            create::run(
                create::CreateOptions {
                    request,
                    template_dir,
                    edit,
                    yes,
                    dry_run,
                },
                &config,
            )?
        }
        Commands::Templates { json, template_dir } => {
            let store = create::template_store(template_dir, &config);
            list::run(&store, json)?
        }
    }

    Ok(())
}
