//! Command dispatch

use std::io::{self, Read};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::arena::SortedTree;
use crate::cli::args::{Cli, Commands, ConfigCommands, SortArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::outline::{find_by_labels, parse_outline};
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Sort { file, sort }) => _sort(cli, file, sort),
        Some(Commands::Rename {
            file,
            path,
            label,
            sort,
        }) => _rename(cli, file, path, label, sort),
        Some(Commands::Config { command }) => _config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::InvalidArgs(
            "no command given, see --help".to_string(),
        )),
    }
}

fn load_settings(cli: &Cli, sort: &SortArgs) -> CliResult<Settings> {
    let settings = Settings::load(cli.config.as_deref())?.with_overrides(
        sort.key,
        sort.descending_override(),
        sort.case_insensitive_override(),
        sort.indent,
    );
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn read_input(file: &Path) -> CliResult<String> {
    if file == Path::new("-") {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| CliError::io("read stdin", e))?;
        Ok(input)
    } else {
        std::fs::read_to_string(file)
            .map_err(|e| CliError::io(format!("read {}", file.display()), e))
    }
}

fn root_label(file: &Path) -> String {
    if file == Path::new("-") {
        return ".".to_string();
    }
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string())
}

/// Reads `file` and builds the sorted tree the settings describe.
pub fn build_tree(file: &Path, settings: &Settings) -> CliResult<SortedTree<String>> {
    let input = read_input(file)?;
    let tree = parse_outline(
        &input,
        settings.indent,
        &root_label(file),
        &settings.to_ordering(),
    )?;
    Ok(tree)
}

#[instrument(skip(cli))]
fn _sort(cli: &Cli, file: &Path, sort: &SortArgs) -> CliResult<()> {
    let settings = load_settings(cli, sort)?;
    let tree = build_tree(file, &settings)?;
    output::info(&tree.to_tree_string());
    Ok(())
}

#[instrument(skip(cli))]
fn _rename(cli: &Cli, file: &Path, path: &str, label: &str, sort: &SortArgs) -> CliResult<()> {
    let settings = load_settings(cli, sort)?;
    let mut tree = build_tree(file, &settings)?;
    let node = find_by_labels(&tree, path).ok_or_else(|| CliError::NodeNotFound(path.to_string()))?;
    if Some(node) == tree.root() {
        return Err(CliError::InvalidArgs("cannot rename the root".to_string()));
    }
    tree.update(node, |current| *current = label.to_string())?;
    output::success(&format!("renamed {} to {}", path, label));
    output::info(&tree.to_tree_string());
    Ok(())
}

#[instrument(skip(cli))]
fn _config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.config.as_deref())?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => {
                return Err(CliError::InvalidArgs(
                    "no home directory to derive the config path from".to_string(),
                ))
            }
        },
    }
    Ok(())
}
