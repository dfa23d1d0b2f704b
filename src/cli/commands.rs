//! Command dispatch

use anyhow::{Context, Result};
use tracing::instrument;

use crate::builder::TreeBuilder;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::session::ExperimentSession;
use crate::ui::TerminalUi;

pub fn execute_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Run {
            robot,
            db_file,
            no_delay,
        }) => run(robot, db_file.as_deref(), *no_delay),
        Some(Commands::Show { file }) => show(file),
        Some(Commands::Config { command }) => config_command(command),
        // Completion is handled in main before dispatch
        Some(Commands::Completion { .. }) | None => Ok(()),
    }
}

#[instrument]
fn run(robot: &str, db_file: Option<&std::path::Path>, no_delay: bool) -> Result<()> {
    let mut settings = Settings::load().context("failed to load settings")?;
    if no_delay {
        settings.narration_delay_ms = 0;
    }
    let db_file = db_file
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| settings.results_file.clone());

    output::info("AIT Prototype #1 Simulator");

    let mut session = ExperimentSession::new(settings, TerminalUi::new());
    session
        .run(robot, &db_file)
        .with_context(|| format!("experiment session for '{robot}' failed"))?;
    Ok(())
}

#[instrument]
fn show(file: &std::path::Path) -> Result<()> {
    let subgoals = TreeBuilder::new()
        .build_from_file(file)
        .with_context(|| format!("cannot load resource file {}", file.display()))?;

    for subgoal in &subgoals {
        output::header(&subgoal.title);
        println!("{}", subgoal.tree.to_display_tree(subgoal.root));
        if !subgoal.bank.is_empty() {
            let names: Vec<_> = subgoal
                .bank
                .iter()
                .filter_map(|&c| subgoal.tree.name_of(c))
                .collect();
            output::detail(&format!("bank: {}", names.join(", ")));
        }
    }
    Ok(())
}

fn config_command(command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load().context("failed to load settings")?;
            println!("{}", toml::to_string_pretty(&settings)?);
            Ok(())
        }
        ConfigCommands::Init => {
            let path = Settings::write_template().context("failed to write config template")?;
            output::action("Created", &path.display());
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::info(&path.display()),
                None => output::warning("cannot determine config directory"),
            }
            Ok(())
        }
    }
}
