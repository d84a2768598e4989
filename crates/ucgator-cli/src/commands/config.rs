use std::path::Path;

use ucgator_core::config::ClientConfig;

use crate::cli::ConfigCommands;
use crate::commands::common::resolve_config_path;
use crate::error::CliError;

pub fn run_config(
    command: ConfigCommands,
    config_override: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), CliError> {
    let path = resolve_config_path(config_override)?;
    match command {
        ConfigCommands::Show => {
            let mut config = ClientConfig::load_from_path(&path)?;
            config.apply_overrides(lookup);
            println!("# {}", path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::SetApiUrl { url } => {
            update_config(&path, |config| config.api_base_url = Some(url))?;
            println!("Saved API base URL to {}", path.display());
        }
        ConfigCommands::SetProbeUrl { url } => {
            update_config(&path, |config| config.probe_url = Some(url))?;
            println!("Saved probe URL to {}", path.display());
        }
    }
    Ok(())
}

/// Load the file without environment overrides, edit, validate and save.
pub fn update_config(
    path: &Path,
    edit: impl FnOnce(&mut ClientConfig),
) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::load_from_path(path)?;
    edit(&mut config);
    config.normalize();
    config.save_to_path(path)?;
    Ok(config)
}
