use std::path::{Path, PathBuf};

use {
    anyhow::{Context, Result},
    herald_config::{HeraldConfig, Severity, ValidationResult, validate_config},
    tracing::debug,
};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// A loaded configuration and the file it came from, if any.
pub struct LoadedConfig {
    pub config: HeraldConfig,
    pub path: Option<PathBuf>,
}

/// Load the explicit `--config` file, or discover one in the standard
/// locations. Parse errors are reported rather than replaced by defaults.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => herald_config::find_config_file(),
    };

    let Some(path) = path else {
        debug!("no config file found, using defaults");
        return Ok(LoadedConfig {
            config: HeraldConfig::default(),
            path: None,
        });
    };

    let config = herald_config::load_config(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    debug!(path = %path.display(), "loaded config");
    Ok(LoadedConfig {
        config,
        path: Some(path),
    })
}

pub fn handle_validate(explicit: Option<&Path>) -> Result<()> {
    let loaded = load(explicit)?;

    if let Some(ref path) = loaded.path {
        eprintln!("Checking {}\n", path.display());
    } else {
        eprintln!("No config file found; checking defaults.\n");
    }

    let result = validate_config(&loaded.config);
    print_diagnostics(&result);

    if result.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_diagnostics(result: &ValidationResult) {
    for d in &result.diagnostics {
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if !result.diagnostics.is_empty() {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.toml");
        std::fs::write(
            &path,
            "agent_id = 9\n[publish]\nmessage = \"{{ title }}\"\noutput_mode = \"merge\"\n",
        )
        .unwrap();

        let loaded = load(Some(&path)).unwrap();
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.agent_id, 9);
        assert_eq!(loaded.config.publish.message, "{{ title }}");
    }

    #[test]
    fn explicit_path_errors_are_surfaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("herald.toml");
        std::fs::write(&path, "agent_id = [").unwrap();
        assert!(load(Some(&path)).is_err());
        assert!(load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
