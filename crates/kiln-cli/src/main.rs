//! Kiln CLI entry point: argument parsing, mode resolution, logging and
//! command dispatch.

use std::process::ExitCode;

use clap::Parser;
use kiln_cli::cli::{Cli, Command};
use kiln_cli::config::{Project, resolve_mode};
use kiln_cli::{commands, error, logger, ui};
use kiln_core::Mode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    ui::init(args.quiet, args.no_color);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = u8::try_from(err.exit_code()).unwrap_or(1);
            eprintln!("{:?}", error::cli_error_to_miette(err));
            ExitCode::from(code)
        }
    }
}

async fn run(args: Cli) -> kiln_cli::Result<()> {
    let node_env = std::env::var("NODE_ENV").ok();
    let (project_args, default_mode) = match &args.command {
        Command::Build(build) => (&build.project, Mode::Production),
        Command::Serve(serve) => (&serve.project, Mode::Development),
    };
    let mode = resolve_mode(project_args.mode, node_env.as_deref(), default_mode);
    let project = Project::load(project_args, mode)?;

    logger::init_logger(
        args.verbose,
        args.quiet,
        args.no_color,
        project.config.settings.log_level.as_deref(),
    );

    match args.command {
        Command::Build(build) => commands::build_execute(build, project).await,
        Command::Serve(serve) => commands::serve_execute(serve, project).await,
    }
}
