pub mod render;
pub mod report;
pub mod session;

use std::{io::IsTerminal, path::PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use report::{process_report_command, ReportCommand};
use render::TerminalBoard;
use session::{LineCommands, HELP};
use tracing::level_filters::LevelFilter;

use crate::{
    config::TrackerConfig,
    storage::json_store::JsonFileStore,
    tracker::start_tracker,
    utils::{
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX, SESSION_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "deptime", version, long_about = None)]
#[command(about = "Tracks time spent per department, one running timer at a time", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console", global = true)]
    log_console: bool,
    #[arg(long = "log-filter", global = true)]
    log: Option<LevelFilter>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Start an interactive session. Timers keep running while it is open")]
    Run {
        #[arg(long, help = "Draw the board without colors")]
        plain: bool,
    },
    #[command(about = "Print recorded time for a range of days")]
    Report {
        #[command(flatten)]
        command: ReportCommand,
    },
    #[command(about = "List configured departments with their function keys")]
    Departments {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = match args.dir {
        Some(dir) => ensure_dir(dir)?,
        None => create_application_default_path()?,
    };
    let prefix = match args.commands {
        Commands::Run { .. } => SESSION_PREFIX,
        _ => CLI_PREFIX,
    };
    enable_logging(prefix, &app_dir, args.log, args.log_console)?;

    let config = TrackerConfig::load(&app_dir)?;

    match args.commands {
        Commands::Run { plain } => {
            println!("{HELP}");
            let colored = !plain && std::io::stdout().is_terminal();
            let board = TerminalBoard::new(std::io::stdout(), colored);
            let commands = LineCommands::stdin(config.departments.clone());
            start_tracker(app_dir, config, board, commands).await
        }
        Commands::Report { command } => {
            process_report_command(command, JsonFileStore::new(app_dir)?, &config).await
        }
        Commands::Departments {} => {
            for (index, department) in config.departments.iter().enumerate() {
                println!("F{}\t{}", index + 1, department);
            }
            Ok(())
        }
    }
}
