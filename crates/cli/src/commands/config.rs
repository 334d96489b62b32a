//! config command - Inspect and create the configuration file
//!
//! Secrets are always redacted on output. Environment variables from the
//! process (or `.env`) are applied before `show` prints anything.

use clap::Subcommand;
use cx_core::{Config, ConfigManager, Error, Result};
use serde_json::json;

use super::context::fail;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration with secrets redacted
    Show,

    /// Print the configuration file location
    Path,

    /// Write a default configuration file
    Init(InitArgs),
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn execute(cmd: ConfigCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let result = ConfigManager::new().and_then(|manager| match cmd {
        ConfigCommands::Show => show(&manager, &formatter),
        ConfigCommands::Path => {
            print_path(&manager, &formatter);
            Ok(())
        }
        ConfigCommands::Init(args) => init(&manager, args.force, &formatter),
    });

    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => fail(&formatter, "Configuration error", &e),
    }
}

fn show(manager: &ConfigManager, formatter: &Formatter) -> Result<()> {
    let config = manager.load_with_env()?.redacted();

    if formatter.is_json() {
        formatter.json(&config);
    } else {
        formatter.println(toml::to_string_pretty(&config)?.trim_end());
    }
    Ok(())
}

fn print_path(manager: &ConfigManager, formatter: &Formatter) {
    let path = manager.config_path().display().to_string();
    if formatter.is_json() {
        formatter.json(&json!({ "path": path }));
    } else {
        formatter.println(&path);
    }
}

fn init(manager: &ConfigManager, force: bool, formatter: &Formatter) -> Result<()> {
    let path = manager.config_path();
    if path.exists() && !force {
        return Err(Error::Config(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }

    manager.save(&Config::default())?;
    formatter.success(&format!("Wrote {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn quiet() -> Formatter {
        Formatter::new(OutputConfig {
            quiet: true,
            ..Default::default()
        })
    }

    #[test]
    fn test_init_writes_default_and_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.toml"));

        init(&manager, false, &quiet()).unwrap();
        assert!(manager.config_path().exists());

        let err = init(&manager, false, &quiet()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        init(&manager, true, &quiet()).unwrap();
    }

    #[test]
    fn test_redacted_config_renders_as_toml() {
        let mut config = Config::default();
        config.s3.secret_key = Some("hunter2".into());

        let rendered = toml::to_string_pretty(&config.redacted()).unwrap();
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
