use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;

use super::diagnostics::Diagnostic;
use super::diagnostics::Diagnostics;
use super::diagnostics::Error;
use super::diagnostics::ValidationError;
use super::diagnostics::Warning;
use super::located::Located;
use super::partial::PartialCardConfig;
use super::partial::PartialConfig;
use super::partial::PartialHostConfig;
use super::partial::PartialLoggingConfig;
use crate::card::CardConfig;
use crate::state::ROOM_PREFIX;
use crate::state::is_room_id;
use crate::tree::DisplayOptions;

#[derive(Debug, Default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub card: CardConfig,
    pub host: HostConfig,
}

// Deserialize because PartialLoggingConfig reads it through Located
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: LogLevel,

    /// Per-target levels, keyed by module path (e.g. `powermon::tree`)
    pub overrides: HashMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Subscriber filter for this config.
    pub fn targets(&self) -> Targets {
        Targets::new()
            .with_default(LevelFilter::from(self.level))
            .with_targets(
                self.overrides
                    .iter()
                    .map(|(target, level)| (target.clone(), LevelFilter::from(*level))),
            )
    }
}

/// Where the host dumps are read from.
///
/// Relative paths are resolved against the config file that named them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub states: Option<PathBuf>,
    pub registry: Option<PathBuf>,
}

fn resolve_path(located: Located<PathBuf>) -> PathBuf {
    let base = located
        .source()
        .file_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let path = located.into_inner();
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

impl Config {
    /// Load configuration from multiple TOML files with import resolution
    ///
    /// Returns `Ok((Config, diagnostics))` when only warnings were produced,
    /// `Err(diagnostics)` when any error was.
    pub fn from_files(paths: &[PathBuf]) -> Result<(Self, Diagnostics), Diagnostics> {
        // Step 1: Load files with import resolution
        let configs = PartialConfig::load_with_imports(paths)
            .map_err(|e| Diagnostics(vec![Diagnostic::Error(Error::Load(e))]))?;

        // Step 2: Merge partial configs
        let (partial, mut diagnostics) = PartialConfig::merge(configs);

        // Step 3: Convert from partial to final config
        let config = match Self::try_from_partial(partial) {
            Ok(config) => config,
            Err(errors) => {
                diagnostics.extend(errors);
                Self::default()
            }
        };

        // Step 4: Validate cross-field constraints
        diagnostics.extend(config.validate());

        // Step 5: Return result based on error status
        if diagnostics.iter().any(Diagnostic::is_error) {
            Err(Diagnostics(diagnostics))
        } else {
            Ok((config, Diagnostics(diagnostics)))
        }
    }

    /// Convert a merged PartialConfig, checking field-level constraints.
    pub fn try_from_partial(partial: PartialConfig) -> Result<Self, Vec<Diagnostic>> {
        let mut errors = Vec::new();

        let logging = partial
            .logging
            .map(Self::logging_from_partial)
            .unwrap_or_default();

        let card = match partial.card {
            Some(card) => Self::card_from_partial(card, &mut errors),
            None => CardConfig::default(),
        };

        let host = partial
            .host
            .map(|PartialHostConfig { states, registry }| HostConfig {
                states: states.map(resolve_path),
                registry: registry.map(resolve_path),
            })
            .unwrap_or_default();

        if errors.is_empty() {
            Ok(Config {
                logging,
                card,
                host,
            })
        } else {
            Err(errors)
        }
    }

    fn logging_from_partial(partial: PartialLoggingConfig) -> LoggingConfig {
        LoggingConfig {
            level: partial.level.map(|l| *l.get_ref()).unwrap_or_default(),
            overrides: partial
                .overrides
                .map(|hm| hm.into_iter().map(|(k, v)| (k, *v.get_ref())).collect())
                .unwrap_or_default(),
        }
    }

    fn card_from_partial(partial: PartialCardConfig, errors: &mut Vec<Diagnostic>) -> CardConfig {
        let flag = |field: Option<Located<bool>>| field.map(Located::into_inner).unwrap_or(true);

        let room = partial.room.and_then(|room| {
            if room.trim().is_empty() {
                errors.push(Diagnostic::Error(Error::Validation(ValidationError {
                    field_path: "card.room".to_string(),
                    message: "room must not be empty; omit it to leave the card unconfigured"
                        .to_string(),
                    span: Some(room.span().clone()),
                    source: Some(room.source().clone()),
                })));
                None
            } else {
                Some(room.into_inner())
            }
        });

        CardConfig {
            card_type: None,
            room,
            options: DisplayOptions {
                show_name: flag(partial.show_name),
                show_icon: flag(partial.show_icon),
                show_untracked_values: flag(partial.show_untracked_values),
                combine_value_untracked: flag(partial.combine_value_untracked),
                clean_subelement_names: flag(partial.clean_subelement_names),
                show_children: flag(partial.show_children),
            },
        }
    }

    /// Checks that only produce warnings.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if let Some(room) = self.card.room() {
            if !is_room_id(room) {
                diagnostics.push(Diagnostic::Warning(Warning::RoomConvention(ValidationError {
                    field_path: "card.room".to_string(),
                    message: format!(
                        "'{}' does not start with '{}'; its children will not be treated as a room",
                        room, ROOM_PREFIX
                    ),
                    span: None,
                    source: None,
                })));
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tracing::Level;

    use super::*;
    use crate::config::LoadError;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_merge_non_overlapping_configs() {
        let dir = tempfile::tempdir().unwrap();
        let base = write(
            dir.path(),
            "base.toml",
            r#"
[logging]
level = "warn"

[card]
room = "sensor.energy_power_monitor_kitchen_power"
show_icon = false
"#,
        );
        let extra = write(
            dir.path(),
            "extra.toml",
            r#"
[logging.overrides]
"powermon::tree" = "debug"

[card]
show_children = false
"#,
        );

        let (config, diagnostics) = Config::from_files(&[base, extra]).unwrap();
        assert!(diagnostics.is_empty());
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert_eq!(
            config.logging.overrides.get("powermon::tree"),
            Some(&LogLevel::Debug)
        );
        assert_eq!(
            config.card.room(),
            Some("sensor.energy_power_monitor_kitchen_power")
        );
        assert!(!config.card.options.show_icon);
        assert!(!config.card.options.show_children);
        assert!(config.card.options.show_name);
        assert!(config.card.options.combine_value_untracked);
    }

    #[test]
    fn test_conflict_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let base = write(dir.path(), "base.toml", "[logging]\nlevel = \"info\"\n");
        let extra = write(dir.path(), "extra.toml", "[logging]\nlevel = \"debug\"\n");

        let diagnostics = Config::from_files(&[base, extra]).unwrap_err();
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            &diagnostics.0[0],
            Diagnostic::Error(Error::Merge(m)) if m.field_path == "logging.level"
        ));
    }

    #[test]
    fn test_imports_resolve_relative_to_importer() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "conf.d/card.toml",
            "[card]\nroom = \"sensor.energy_power_monitor_garage_power\"\n",
        );
        let main = write(
            dir.path(),
            "main.toml",
            "imports = [\"conf.d/card.toml\"]\n\n[logging]\nlevel = \"trace\"\n",
        );

        let (config, _) = Config::from_files(&[main]).unwrap();
        assert_eq!(
            config.card.room(),
            Some("sensor.energy_power_monitor_garage_power")
        );
        assert_eq!(config.logging.level, LogLevel::Trace);
    }

    #[test]
    fn test_shared_import_is_not_a_cycle() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "common.toml", "[logging]\nlevel = \"debug\"\n");
        let a = write(dir.path(), "a.toml", "imports = [\"common.toml\"]\n");
        let b = write(dir.path(), "b.toml", "imports = [\"common.toml\"]\n");

        // Loading common.toml twice defines logging.level twice
        let diagnostics = Config::from_files(&[a, b]).unwrap_err();
        assert!(
            diagnostics
                .iter()
                .all(|d| matches!(d, Diagnostic::Error(Error::Merge(_))))
        );
    }

    #[test]
    fn test_import_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let root = write(dir.path(), "root.toml", "imports = [\"a.toml\"]\n");
        write(dir.path(), "a.toml", "imports = [\"b.toml\"]\n");
        write(dir.path(), "b.toml", "imports = [\"c.toml\"]\n");
        write(dir.path(), "c.toml", "imports = [\"a.toml\"]\n");

        let diagnostics = Config::from_files(&[root]).unwrap_err();
        assert_eq!(diagnostics.len(), 1);
        let Diagnostic::Error(Error::Load(LoadError::ImportCycle { path, cycle })) =
            &diagnostics.0[0]
        else {
            panic!("expected an import cycle");
        };

        // Only the files on the loop, in the order they import each other
        let base = dir.path().canonicalize().unwrap();
        assert_eq!(path, &base.join("a.toml"));
        assert_eq!(
            cycle,
            &vec![base.join("a.toml"), base.join("b.toml"), base.join("c.toml")]
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let diagnostics = Config::from_files(&[dir.path().join("absent.toml")]).unwrap_err();
        assert!(matches!(
            &diagnostics.0[0],
            Diagnostic::Error(Error::Load(LoadError::Io { .. }))
        ));
    }

    #[test]
    fn test_unknown_field_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.toml", "[card]\nshow_everything = true\n");

        let diagnostics = Config::from_files(&[path]).unwrap_err();
        assert!(matches!(
            &diagnostics.0[0],
            Diagnostic::Error(Error::Load(LoadError::Parse { .. }))
        ));
    }

    #[test]
    fn test_empty_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "empty.toml", "");

        let (config, diagnostics) = Config::from_files(&[path]).unwrap();
        assert_eq!(config.card, CardConfig::default());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics.0[0].is_warning());
    }

    #[test]
    fn test_empty_room_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "card.toml", "[card]\nroom = \"\"\n");

        let diagnostics = Config::from_files(&[path.clone()]).unwrap_err();
        let Diagnostic::Error(Error::Validation(err)) = &diagnostics.0[0] else {
            panic!("expected a validation error");
        };
        assert_eq!(err.field_path, "card.room");
        assert!(err.span.is_some());
        assert_eq!(err.source.as_ref().map(|s| s.file_path.clone()), Some(path));
    }

    #[test]
    fn test_room_without_prefix_warns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "card.toml", "[card]\nroom = \"sensor.kitchen\"\n");

        let (config, diagnostics) = Config::from_files(&[path]).unwrap();
        assert_eq!(config.card.room(), Some("sensor.kitchen"));
        assert!(matches!(
            &diagnostics.0[..],
            [Diagnostic::Warning(Warning::RoomConvention(_))]
        ));
    }

    #[test]
    fn test_host_paths_resolve_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "conf/host.toml",
            "[host]\nstates = \"dumps/states.json\"\nregistry = \"/var/lib/registry.json\"\n",
        );

        let (config, _) = Config::from_files(&[path]).unwrap();
        assert_eq!(
            config.host.states,
            Some(dir.path().join("conf").join("dumps/states.json"))
        );
        assert_eq!(
            config.host.registry,
            Some(PathBuf::from("/var/lib/registry.json"))
        );
    }

    #[test]
    fn test_logging_targets() {
        let logging = LoggingConfig {
            level: LogLevel::Warn,
            overrides: HashMap::from([("powermon::tree".to_string(), LogLevel::Debug)]),
        };

        let targets = logging.targets();
        assert!(targets.would_enable("powermon::tree", &Level::DEBUG));
        assert!(!targets.would_enable("powermon::card", &Level::INFO));
        assert!(targets.would_enable("powermon::card", &Level::WARN));
    }
}
