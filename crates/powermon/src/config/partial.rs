use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use super::LogLevel;
use super::diagnostics::Diagnostic;
use super::diagnostics::Error;
use super::diagnostics::LoadError;
use super::diagnostics::MergeError;
use super::diagnostics::SourceInfo;
use super::diagnostics::Warning;
use super::located::Located;

/// One config file as written, before merging.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    #[serde(default)]
    pub imports: Vec<String>,

    pub logging: Option<PartialLoggingConfig>,
    pub card: Option<PartialCardConfig>,
    pub host: Option<PartialHostConfig>,

    /// Source information for error reporting (not serialized)
    #[serde(skip)]
    pub source: Option<SourceInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialLoggingConfig {
    pub level: Option<Located<LogLevel>>,
    pub overrides: Option<HashMap<String, Located<LogLevel>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialCardConfig {
    pub room: Option<Located<String>>,
    pub show_name: Option<Located<bool>>,
    pub show_icon: Option<Located<bool>>,
    pub show_untracked_values: Option<Located<bool>>,
    pub combine_value_untracked: Option<Located<bool>>,
    pub clean_subelement_names: Option<Located<bool>>,
    pub show_children: Option<Located<bool>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialHostConfig {
    /// State dump, relative to the file that names it
    pub states: Option<Located<PathBuf>>,

    /// Entity registry dump, relative to the file that names it
    pub registry: Option<Located<PathBuf>>,
}

fn locate<T>(field: &mut Option<Located<T>>, source: &SourceInfo) {
    if let Some(value) = field {
        value.set_source(source);
    }
}

/// Keep the first definition of a field; report any later one as a conflict.
fn merge_field<T>(
    slot: &mut Option<Located<T>>,
    incoming: Option<Located<T>>,
    field_path: &str,
    what: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let Some(incoming) = incoming else {
        return;
    };

    match slot {
        Some(first) => diagnostics.push(Diagnostic::Error(Error::Merge(MergeError {
            field_path: field_path.to_string(),
            message: format!("{} defined in multiple config files", what),
            conflicts: vec![first.to_conflict_location(), incoming.to_conflict_location()],
        }))),
        None => *slot = Some(incoming),
    }
}

impl PartialCardConfig {
    fn fields_mut(&mut self) -> [(&'static str, &mut Option<Located<bool>>); 6] {
        [
            ("show_name", &mut self.show_name),
            ("show_icon", &mut self.show_icon),
            ("show_untracked_values", &mut self.show_untracked_values),
            ("combine_value_untracked", &mut self.combine_value_untracked),
            ("clean_subelement_names", &mut self.clean_subelement_names),
            ("show_children", &mut self.show_children),
        ]
    }

    fn into_fields(self) -> [Option<Located<bool>>; 6] {
        [
            self.show_name,
            self.show_icon,
            self.show_untracked_values,
            self.combine_value_untracked,
            self.clean_subelement_names,
            self.show_children,
        ]
    }
}

impl PartialConfig {
    /// Load a single config file without processing imports
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let mut config: PartialConfig = toml::from_str(&content).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let source = SourceInfo {
            file_path: path.to_path_buf(),
            content,
        };
        config.attach_source(&source);
        config.source = Some(source);

        Ok(config)
    }

    fn attach_source(&mut self, source: &SourceInfo) {
        if let Some(logging) = &mut self.logging {
            locate(&mut logging.level, source);
            for value in logging.overrides.iter_mut().flat_map(HashMap::values_mut) {
                value.set_source(source);
            }
        }
        if let Some(card) = &mut self.card {
            locate(&mut card.room, source);
            for (_, field) in card.fields_mut() {
                locate(field, source);
            }
        }
        if let Some(host) = &mut self.host {
            locate(&mut host.states, source);
            locate(&mut host.registry, source);
        }
    }

    fn is_empty(&self) -> bool {
        self.logging.is_none() && self.card.is_none() && self.host.is_none() && self.imports.is_empty()
    }

    /// Load config files with import resolution
    ///
    /// Each config file is loaded, then its imports are recursively processed.
    /// Cycle detection prevents infinite loops.
    ///
    /// Returns a Vec of all loaded configs in order (imports first, then parent)
    pub fn load_with_imports(paths: &[PathBuf]) -> Result<Vec<Self>, LoadError> {
        let mut visited = HashSet::new();
        let mut chain = Vec::new();
        let mut all_configs = Vec::new();

        for path in paths {
            Self::load_recursive(path, &mut visited, &mut chain, &mut all_configs)?;
        }

        Ok(all_configs)
    }

    fn load_recursive(
        path: &Path,
        visited: &mut HashSet<PathBuf>,
        chain: &mut Vec<PathBuf>,
        configs: &mut Vec<Self>,
    ) -> Result<(), LoadError> {
        let canonical_path = path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf());

        if visited.contains(&canonical_path) {
            // Files from the first visit of the repeated one, in import order
            let start = chain
                .iter()
                .position(|p| *p == canonical_path)
                .unwrap_or_default();
            return Err(LoadError::ImportCycle {
                path: canonical_path,
                cycle: chain[start..].to_vec(),
            });
        }

        visited.insert(canonical_path.clone());
        chain.push(canonical_path.clone());

        let config = Self::from_file(path)?;

        // Imports first (depth-first), resolved from the importing file's directory
        for import_path in &config.imports {
            let import_path_buf = PathBuf::from(import_path);
            let resolved_path = if import_path_buf.is_absolute() {
                import_path_buf
            } else {
                let parent_dir = path.parent().unwrap_or_else(|| Path::new("."));
                parent_dir.join(import_path_buf)
            };

            Self::load_recursive(&resolved_path, visited, chain, configs)?;
        }

        configs.push(config);

        // Sibling branches may import the same file
        visited.remove(&canonical_path);
        chain.pop();

        Ok(())
    }

    /// Merge multiple partial configs together
    ///
    /// Uses first-wins semantics: the first occurrence of a field is kept.
    /// Conflicts are collected as errors but merging continues, so every
    /// conflict is reported at once.
    pub fn merge<I>(configs: I) -> (Self, Vec<Diagnostic>)
    where
        I: IntoIterator<Item = Self>,
    {
        let mut result = PartialConfig::default();
        let mut diagnostics = Vec::new();

        for config in configs {
            result.imports.extend(config.imports.iter().cloned());

            if config.is_empty() {
                let file_path = config
                    .source
                    .as_ref()
                    .map(|s| s.file_path.clone())
                    .unwrap_or_else(|| PathBuf::from("<unknown>"));
                diagnostics.push(Diagnostic::Warning(Warning::EmptyConfig { file_path }));
            }

            if result.source.is_none() {
                result.source = config.source.clone();
            }

            if let Some(logging) = config.logging {
                let target = result.logging.get_or_insert_with(Default::default);
                merge_field(
                    &mut target.level,
                    logging.level,
                    "logging.level",
                    "Logging level",
                    &mut diagnostics,
                );

                if let Some(overrides) = logging.overrides {
                    let target_overrides = target.overrides.get_or_insert_with(HashMap::new);
                    for (key, value) in overrides {
                        let mut slot = target_overrides.remove(&key);
                        merge_field(
                            &mut slot,
                            Some(value),
                            &format!("logging.overrides.{}", key),
                            &format!("Logging override for '{}'", key),
                            &mut diagnostics,
                        );
                        if let Some(value) = slot {
                            target_overrides.insert(key, value);
                        }
                    }
                }
            }

            if let Some(card) = config.card {
                let target = result.card.get_or_insert_with(Default::default);
                merge_field(&mut target.room, card.room.clone(), "card.room", "Room", &mut diagnostics);

                for ((name, slot), incoming) in target.fields_mut().into_iter().zip(card.into_fields()) {
                    merge_field(
                        slot,
                        incoming,
                        &format!("card.{}", name),
                        &format!("Card option '{}'", name),
                        &mut diagnostics,
                    );
                }
            }

            if let Some(host) = config.host {
                let target = result.host.get_or_insert_with(Default::default);
                merge_field(
                    &mut target.states,
                    host.states,
                    "host.states",
                    "State dump path",
                    &mut diagnostics,
                );
                merge_field(
                    &mut target.registry,
                    host.registry,
                    "host.registry",
                    "Registry dump path",
                    &mut diagnostics,
                );
            }
        }

        (result, diagnostics)
    }
}
