use anyhow::Context;
use clap::Parser;
use jsprof::cli::{Cli, Command};
use jsprof::commands::tree::TreeOptions;
use jsprof::error::exit_code;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::from(exit_code::SUCCESS as u8),
        Err(e) => {
            eprintln!("Error: {e:#}");
            if let Some(jsprof_err) = e.downcast_ref::<jsprof::Error>() {
                ExitCode::from(jsprof_err.exit_code() as u8)
            } else {
                ExitCode::from(exit_code::GENERAL_ERROR as u8)
            }
        }
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Validate CLI arguments
    cli.validate()
        .map_err(|e| anyhow::anyhow!("{}", e))
        .context("Invalid arguments")?;

    let interface = cli.requested_interface();

    match &cli.command {
        Command::Tree {
            file,
            depth,
            min_samples,
            json,
        } => {
            let options = TreeOptions {
                max_depth: *depth,
                min_samples: *min_samples,
            };
            jsprof::commands::tree::run(file, interface, options, *json)
                .with_context(|| format!("Failed to print tree for {}", file.display()))?;
        }
        Command::Top {
            file,
            top,
            threshold,
            json,
            csv,
        } => {
            jsprof::commands::top::run(file, interface, *top, *threshold, *json, *csv)
                .with_context(|| format!("Failed to rank call sites in {}", file.display()))?;
        }
        Command::Node { file, path } => {
            jsprof::commands::node::run(file, interface, path)
                .with_context(|| format!("Failed to read node in {}", file.display()))?;
        }
        Command::View { file } => {
            jsprof::commands::view::run(file, interface)
                .with_context(|| format!("Failed to open {}", file.display()))?;
        }
        Command::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "jsprof", &mut std::io::stdout());
        }
    }

    Ok(())
}
