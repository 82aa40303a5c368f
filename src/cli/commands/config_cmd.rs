//! Configuration commands.

use console::style;

use crate::config::Config;

/// Print the effective configuration as YAML.
pub fn cmd_config_show(config: &Config) -> anyhow::Result<()> {
    match &config.source_path {
        Some(path) => eprintln!("{} Loaded from {}", style("→").dim(), path.display()),
        None => eprintln!("{} Using built-in defaults", style("!").yellow()),
    }
    print!("{}", serde_yaml::to_string(config)?);
    Ok(())
}
