pub mod merge;
pub mod schema;

pub use schema::*;

use crate::cli::{Cli, Commands};
use crate::error::ConfigError;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Name of the per-workspace config file.
pub const WORKSPACE_CONFIG_FILE: &str = "agentloop.toml";

/// Load configuration by merging global, workspace, and CLI sources.
/// Precedence: CLI > workspace config > global config (or `--config`) > defaults.
///
/// Missing config files are handled gracefully (defaults apply). An explicit
/// `--config` file that cannot be read or parsed is an error.
pub fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    // Layer 1: Global config, or the explicitly named file.
    let global = match cli_config_path(cli) {
        Some(path) => load_toml_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?
            .unwrap_or_default(),
        None => load_global_config(),
    };

    // Determine workspace path from CLI or global config, for loading workspace config.
    let workspace_path = cli_workspace(cli)
        .or_else(|| global.workspace.clone())
        .unwrap_or_else(|| PathBuf::from("./workspace"));

    // Layer 2: Workspace config (workspace/agentloop.toml)
    let workspace = load_workspace_config(&workspace_path);

    // Layer 3: CLI args (converted to PartialConfig)
    let cli_partial = cli_to_partial(cli);

    let config = cli_partial
        .with_fallback(workspace)
        .with_fallback(global)
        .finalize();

    Ok(config)
}

/// Load global config from the platform-specific config directory.
/// Returns empty PartialConfig if file not found or unreadable.
fn load_global_config() -> PartialConfig {
    match global_config_path() {
        Some(p) => lenient(&p, load_toml_file(&p)),
        None => {
            tracing::debug!("Could not determine global config directory");
            PartialConfig::default()
        }
    }
}

/// Load workspace config from workspace/agentloop.toml.
///
/// The file lives inside the sandbox root where the model can write it, so it
/// cannot change `max_depth`, the denylist or the security log location.
fn load_workspace_config(workspace_path: &Path) -> PartialConfig {
    let config_path = workspace_path.join(WORKSPACE_CONFIG_FILE);
    without_safety_overrides(&config_path, lenient(&config_path, load_toml_file(&config_path)))
}

fn without_safety_overrides(path: &Path, mut partial: PartialConfig) -> PartialConfig {
    let mut ignored = Vec::new();
    if partial.max_depth.take().is_some() {
        ignored.push("limits.max_depth");
    }
    if partial.blocked_substrings.take().is_some() {
        ignored.push("safety.blocked_substrings");
    }
    if partial.security_log_path.take().is_some() {
        ignored.push("safety.security_log");
    }
    if !ignored.is_empty() {
        tracing::warn!(
            path = %path.display(),
            keys = ?ignored,
            "Ignoring safety settings in workspace config; set them globally or via --config"
        );
    }
    partial
}

/// Downgrade a config load failure to a warning and fall back to defaults.
fn lenient(path: &Path, loaded: Result<Option<PartialConfig>, ConfigError>) -> PartialConfig {
    match loaded {
        Ok(partial) => partial.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), "Ignoring config: {e}");
            PartialConfig::default()
        }
    }
}

/// Load and parse a TOML config file into a PartialConfig.
/// Returns `Ok(None)` when the file does not exist.
pub fn load_toml_file(path: &Path) -> Result<Option<PartialConfig>, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(None);
        }
        Err(e) => return Err(ConfigError::IoError(e)),
    };

    let parse_error = |message: String| ConfigError::ParseError {
        path: path.to_path_buf(),
        message,
    };
    let file: ConfigFile = toml::from_str(&contents).map_err(|e| parse_error(e.to_string()))?;
    let partial = file.to_partial().map_err(parse_error)?;

    tracing::info!("Loaded config from {}", path.display());
    Ok(Some(partial))
}

/// Resolve the platform-specific global config path.
/// Linux: ~/.config/agentloop/agentloop.toml
/// macOS: ~/Library/Application Support/agentloop/agentloop.toml
fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "agentloop")
        .map(|dirs| dirs.config_dir().join(WORKSPACE_CONFIG_FILE))
}

fn cli_config_path(cli: &Cli) -> Option<&Path> {
    match &cli.command {
        Commands::Run { config, .. } | Commands::Agents { config, .. } => config.as_deref(),
    }
}

fn cli_workspace(cli: &Cli) -> Option<PathBuf> {
    match &cli.command {
        Commands::Run { workspace, .. } | Commands::Agents { workspace, .. } => workspace.clone(),
    }
}

/// Convert CLI arguments to a PartialConfig for merging.
fn cli_to_partial(cli: &Cli) -> PartialConfig {
    match &cli.command {
        Commands::Run {
            model,
            workspace,
            timeout,
            max_turns,
            ..
        } => PartialConfig {
            model: model.clone(),
            workspace: workspace.clone(),
            shell_timeout_secs: *timeout,
            max_turns: *max_turns,
            ..Default::default()
        },
        Commands::Agents { workspace, .. } => PartialConfig {
            workspace: workspace.clone(),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::agent_types::ToolPermission;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let loaded = load_toml_file(&tmp.path().join("nope.toml")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn parses_sections_and_agent_types() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(WORKSPACE_CONFIG_FILE);
        std::fs::write(
            &path,
            r#"
[general]
model = "openai::gpt-4o"

[limits]
shell_timeout_secs = 5
max_turns = 12

[safety]
blocked_substrings = [{ pattern = "curl", reason = "no network" }]

[agent_types.test]
description = "Runs the test suite"
tools = ["bash", "read_file"]
prompt = "Run tests and report results. Do not modify code."

[agent_types.fixer]
description = "Fixes things"
tools = "*"
prompt = "Fix it."
"#,
        )
        .unwrap();

        let partial = load_toml_file(&path).unwrap().unwrap();
        assert_eq!(partial.model.as_deref(), Some("openai::gpt-4o"));
        assert_eq!(partial.shell_timeout_secs, Some(5));
        assert_eq!(partial.max_turns, Some(12));
        assert_eq!(
            partial.blocked_substrings,
            Some(vec![("curl".to_string(), "no network".to_string())])
        );

        let types = partial.agent_types.unwrap();
        let test = types.iter().find(|t| t.name == "test").unwrap();
        assert!(matches!(&test.tools, ToolPermission::Only(set) if set.len() == 2));
        let fixer = types.iter().find(|t| t.name == "fixer").unwrap();
        assert_eq!(fixer.tools, ToolPermission::AllBaseTools);
    }

    #[test]
    fn workspace_file_cannot_loosen_safety_limits() {
        let tmp = TempDir::new().unwrap();
        let ws = tmp.path().join("ws");
        std::fs::create_dir_all(&ws).unwrap();
        std::fs::write(
            ws.join(WORKSPACE_CONFIG_FILE),
            "[limits]\nmax_depth = 99\nmax_turns = 9\n\n[safety]\nblocked_substrings = []\nsecurity_log = \"log.txt\"\n",
        )
        .unwrap();
        let explicit = tmp.path().join("explicit.toml");
        std::fs::write(&explicit, "").unwrap();

        let cli = Cli::try_parse_from([
            "agentloop",
            "run",
            "--workspace",
            ws.to_str().unwrap(),
            "--config",
            explicit.to_str().unwrap(),
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();

        assert_eq!(config.max_depth, 1);
        assert_eq!(config.blocked_substrings, crate::sandbox::defaults::default_blocklist());
        assert!(!config.security_log_path.starts_with(&ws));
        // Non-safety keys still apply.
        assert_eq!(config.max_turns, 9);
    }

    #[test]
    fn explicit_config_may_set_safety_limits() {
        let tmp = TempDir::new().unwrap();
        let explicit = tmp.path().join("explicit.toml");
        std::fs::write(&explicit, "[limits]\nmax_depth = 2\n").unwrap();

        let cli = Cli::try_parse_from([
            "agentloop",
            "run",
            "--workspace",
            tmp.path().join("ws").to_str().unwrap(),
            "--config",
            explicit.to_str().unwrap(),
        ])
        .unwrap();
        assert_eq!(load_config(&cli).unwrap().max_depth, 2);
    }

    #[test]
    fn bad_wildcard_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(WORKSPACE_CONFIG_FILE);
        std::fs::write(
            &path,
            "[agent_types.odd]\ndescription = \"x\"\ntools = \"all\"\nprompt = \"y\"\n",
        )
        .unwrap();

        let err = load_toml_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
