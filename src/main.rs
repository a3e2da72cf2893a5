use clap::Parser;

use commands::GlobalArgs;

mod commands;
mod tty;

use commands::{init, plan, run, steps};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "stagehand")]
#[command(version = VERSION)]
#[command(about = "Run dependency-ordered build and publish steps")]
struct Cli {
    /// Pipeline config file (default: stagehand.json/.yml in the current directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run a target step and everything it depends on
    Run(run::RunArgs),
    /// Show the resolved execution order without running anything
    Plan(plan::PlanArgs),
    /// List configured steps
    Steps(steps::StepsArgs),
    /// Write a starter stagehand.json
    Init(init::InitArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs { config: cli.config };

    let (json_result, exit_code) = commands::run_json(cli.command, &global);

    if let Err(err) = stagehand::output::print_json_result(json_result) {
        eprintln!("{}", err);
        return std::process::ExitCode::from(1);
    }

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
