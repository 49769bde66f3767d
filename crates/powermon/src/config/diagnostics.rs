use std::ops::Range;
use std::path::PathBuf;

/// Source information for where a diagnostic came from
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub file_path: PathBuf,
    pub content: String,
}

impl SourceInfo {
    pub(crate) fn unknown() -> Self {
        Self {
            file_path: PathBuf::from("<unknown>"),
            content: String::new(),
        }
    }
}

/// A diagnostic message that can be either a warning or an error
#[derive(Debug, Clone)]
pub enum Diagnostic {
    Warning(Warning),
    Error(Error),
}

/// Warning messages that don't prevent config loading
#[derive(Debug, Clone)]
pub enum Warning {
    EmptyConfig { file_path: PathBuf },

    /// A configured room id that does not follow the room naming convention.
    RoomConvention(ValidationError),
}

/// Error messages that indicate problems with the config
#[derive(Debug, Clone)]
pub enum Error {
    Merge(MergeError),
    Validation(ValidationError),
    Load(LoadError),
}

/// Error type for merge conflicts
#[derive(Debug, Clone)]
pub struct MergeError {
    pub field_path: String,
    pub message: String,
    pub conflicts: Vec<MergeConflictLocation>,
}

#[derive(Debug, Clone)]
pub struct MergeConflictLocation {
    pub file_path: PathBuf,
    pub span: Range<usize>,
    pub content: String,
}

/// Error type for validation failures
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field_path: String,
    pub message: String,
    pub span: Option<Range<usize>>,
    pub source: Option<SourceInfo>,
}

/// Error type for config loading failures (parse errors, IO errors, etc.)
///
/// Errors are kept as strings so diagnostics stay `Clone`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error(
        "\x1b[31mError\x1b[0m: Failed to read config file\n  ┌─ {}:1:1\n  │\n  = {}\n",
        .path.display(),
        .error
    )]
    Io { path: PathBuf, error: String },

    #[error(
        "\x1b[31mError\x1b[0m: Failed to parse config file\n  ┌─ {}:1:1\n  │\n  = {}\n",
        .path.display(),
        .error
    )]
    Parse { path: PathBuf, error: String },

    #[error(
        "\x1b[31mError\x1b[0m: Import cycle detected\n  ┌─ {}:1:1\n  │\n  = Import cycle involves {} file(s)\n",
        .path.display(),
        .cycle.len()
    )]
    ImportCycle { path: PathBuf, cycle: Vec<PathBuf> },
}

/// A collection of diagnostics (warnings and/or errors)
#[derive(Debug, Clone, Default)]
pub struct Diagnostics(pub Vec<Diagnostic>);

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(Diagnostic::is_error)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_diagnostics(&self.0))
    }
}

impl std::error::Error for Diagnostics {}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_diagnostics(std::slice::from_ref(self)))
    }
}

impl Diagnostic {
    /// Returns true if this diagnostic is an error
    pub fn is_error(&self) -> bool {
        matches!(self, Diagnostic::Error(_))
    }

    /// Returns true if this diagnostic is a warning
    pub fn is_warning(&self) -> bool {
        matches!(self, Diagnostic::Warning(_))
    }
}

/// Report a validation problem, pointing at its span when one is known.
fn write_validation(
    output: &mut Vec<u8>,
    kind: ariadne::ReportKind<'_>,
    color: ariadne::Color,
    heading: &str,
    validation_error: &ValidationError,
) {
    use ariadne::Label;
    use ariadne::Report;
    use ariadne::Source;

    if let (Some(span), Some(source_info)) = (&validation_error.span, &validation_error.source) {
        let file_id = source_info.file_path.to_string_lossy().to_string();
        let report = Report::build(kind, (file_id.clone(), span.clone()))
            .with_message(format!("{} in '{}'", heading, validation_error.field_path))
            .with_label(
                Label::new((file_id.clone(), span.clone()))
                    .with_message(&validation_error.message)
                    .with_color(color),
            )
            .finish();

        let source = Source::from(source_info.content.clone());
        report.write((file_id, source), &mut *output).ok();
    } else {
        // Format manually since ariadne doesn't render notes well without source
        use std::io::Write;
        let file_path = validation_error
            .source
            .as_ref()
            .map(|s| s.file_path.display().to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        let label = if matches!(kind, ariadne::ReportKind::Warning) {
            "\x1b[33mWarning\x1b[0m"
        } else {
            "\x1b[31mError\x1b[0m"
        };

        writeln!(
            output,
            "{}: {} in '{}'",
            label, heading, validation_error.field_path
        )
        .ok();
        writeln!(output, "  ┌─ {}:1:1", file_path).ok();
        writeln!(output, "  │").ok();
        writeln!(output, "  = {}", validation_error.message).ok();
        writeln!(output).ok();
    }
}

/// Format all diagnostics for display using Ariadne
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    use ariadne::Color;
    use ariadne::Label;
    use ariadne::Report;
    use ariadne::ReportKind;
    use ariadne::Source;

    let mut output = Vec::new();

    for diagnostic in diagnostics {
        match diagnostic {
            Diagnostic::Warning(warning) => match warning {
                Warning::EmptyConfig { file_path } => {
                    use std::io::Write;
                    writeln!(
                        &mut output,
                        "\x1b[33mWarning\x1b[0m: Empty configuration file"
                    )
                    .ok();
                    writeln!(&mut output, "  ┌─ {}:1:1", file_path.display()).ok();
                    writeln!(&mut output, "  │").ok();
                    writeln!(
                        &mut output,
                        "  = Config file '{}' is empty and has no effect",
                        file_path.display()
                    )
                    .ok();
                    writeln!(&mut output).ok();
                }
                Warning::RoomConvention(validation_error) => write_validation(
                    &mut output,
                    ReportKind::Warning,
                    Color::Yellow,
                    "Unexpected room",
                    validation_error,
                ),
            },
            Diagnostic::Error(error) => match error {
                Error::Merge(merge_error) => {
                    let Some(first_conflict) = merge_error.conflicts.first() else {
                        continue;
                    };
                    let mut report = Report::build(
                        ReportKind::Error,
                        (
                            first_conflict.file_path.to_string_lossy().to_string(),
                            first_conflict.span.clone(),
                        ),
                    )
                    .with_message(format!(
                        "Merge conflict in field '{}'",
                        merge_error.field_path
                    ))
                    .with_note(&merge_error.message);

                    for (idx, conflict) in merge_error.conflicts.iter().enumerate() {
                        let label_msg = if idx == 0 {
                            "first definition here"
                        } else {
                            "conflicts with this definition"
                        };

                        report = report.with_label(
                            Label::new((
                                conflict.file_path.to_string_lossy().to_string(),
                                conflict.span.clone(),
                            ))
                            .with_message(label_msg)
                            .with_color(if idx == 0 { Color::Red } else { Color::Yellow }),
                        );
                    }

                    let finished_report = report.finish();

                    // One rendering per source file; labels in other files are
                    // reported as unavailable by ariadne.
                    let mut written_files = std::collections::HashSet::new();
                    for conflict in &merge_error.conflicts {
                        let file_id = conflict.file_path.to_string_lossy().to_string();
                        if written_files.insert(file_id.clone()) {
                            let source = Source::from(conflict.content.clone());
                            finished_report.write((file_id, source), &mut output).ok();
                        }
                    }
                }
                Error::Validation(validation_error) => write_validation(
                    &mut output,
                    ReportKind::Error,
                    Color::Red,
                    "Validation error",
                    validation_error,
                ),
                Error::Load(load_error) => {
                    use std::io::Write;
                    write!(&mut output, "{}", load_error).ok();
                }
            },
        }
    }

    String::from_utf8_lossy(&output).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Strip ANSI escape sequences so output is stable and readable.
    fn strip_ansi(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                for c2 in chars.by_ref() {
                    if c2 == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_diagnostic_kinds() {
        let error = Diagnostic::Error(Error::Validation(ValidationError {
            field_path: "card.room".to_string(),
            message: "room must not be empty".to_string(),
            span: None,
            source: None,
        }));
        assert!(error.is_error());
        assert!(!error.is_warning());

        let warning = Diagnostic::Warning(Warning::EmptyConfig {
            file_path: PathBuf::from("card.toml"),
        });
        assert!(warning.is_warning());
        assert!(!warning.is_error());

        assert!(Diagnostics(vec![warning.clone()]).len() == 1);
        assert!(!Diagnostics(vec![warning]).has_errors());
        assert!(Diagnostics(vec![error]).has_errors());
    }

    #[test]
    fn test_format_empty_config_warning() {
        let diagnostics = vec![Diagnostic::Warning(Warning::EmptyConfig {
            file_path: PathBuf::from("/tmp/empty.toml"),
        })];

        let output = format_diagnostics(&diagnostics);
        let expected = "\u{1b}[33mWarning\u{1b}[0m: Empty configuration file
  ┌─ /tmp/empty.toml:1:1
  │
  = Config file '/tmp/empty.toml' is empty and has no effect

";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_format_validation_error_without_span() {
        let diagnostics = vec![Diagnostic::Error(Error::Validation(ValidationError {
            field_path: "card.room".to_string(),
            message: "room must not be empty".to_string(),
            span: None,
            source: Some(SourceInfo {
                file_path: PathBuf::from("/tmp/card.toml"),
                content: String::new(),
            }),
        }))];

        let output = format_diagnostics(&diagnostics);
        let expected = "\u{1b}[31mError\u{1b}[0m: Validation error in 'card.room'\n  ┌─ /tmp/card.toml:1:1\n  │\n  = room must not be empty\n\n";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_format_room_warning_without_span() {
        let diagnostics = vec![Diagnostic::Warning(Warning::RoomConvention(ValidationError {
            field_path: "card.room".to_string(),
            message: "'sensor.kitchen' is not a room sensor".to_string(),
            span: None,
            source: None,
        }))];

        let output = format_diagnostics(&diagnostics);
        let expected = "\u{1b}[33mWarning\u{1b}[0m: Unexpected room in 'card.room'\n  ┌─ <unknown>:1:1\n  │\n  = 'sensor.kitchen' is not a room sensor\n\n";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_format_validation_error_with_span() {
        let content = "[card]\nroom = \"\"\n";
        let diagnostics = vec![Diagnostic::Error(Error::Validation(ValidationError {
            field_path: "card.room".to_string(),
            message: "room must not be empty".to_string(),
            span: Some(14..16),
            source: Some(SourceInfo {
                file_path: PathBuf::from("/tmp/card.toml"),
                content: content.to_string(),
            }),
        }))];

        let output = strip_ansi(&format_diagnostics(&diagnostics));
        assert!(output.contains("Validation error in 'card.room'"));
        assert!(output.contains("/tmp/card.toml:2:8"));
        assert!(output.contains("room must not be empty"));
    }

    #[test]
    fn test_format_merge_error() {
        let conflicts = vec![
            MergeConflictLocation {
                file_path: PathBuf::from("/tmp/base.toml"),
                span: 14..45,
                content: "[card]\nroom = \"sensor.energy_power_monitor_a\"\n".to_string(),
            },
            MergeConflictLocation {
                file_path: PathBuf::from("/tmp/override.toml"),
                span: 14..45,
                content: "[card]\nroom = \"sensor.energy_power_monitor_b\"\n".to_string(),
            },
        ];

        let diagnostics = vec![Diagnostic::Error(Error::Merge(MergeError {
            field_path: "card.room".to_string(),
            message: "Room defined in multiple config files".to_string(),
            conflicts,
        }))];

        let output = strip_ansi(&format_diagnostics(&diagnostics));
        assert!(output.contains("Merge conflict in field 'card.room'"));
        assert!(output.contains("/tmp/base.toml:2:8"));
        assert!(output.contains("/tmp/override.toml:2:8"));
        assert!(output.contains("first definition here"));
        assert!(output.contains("conflicts with this definition"));
        assert!(output.contains("Room defined in multiple config files"));
    }

    #[test]
    fn test_load_error_display() {
        let io = LoadError::Io {
            path: PathBuf::from("/tmp/card.toml"),
            error: "file not found".to_string(),
        };
        assert_eq!(
            io.to_string(),
            "\u{1b}[31mError\u{1b}[0m: Failed to read config file\n  ┌─ /tmp/card.toml:1:1\n  │\n  = file not found\n"
        );

        let parse = LoadError::Parse {
            path: PathBuf::from("/tmp/card.toml"),
            error: "invalid TOML syntax".to_string(),
        };
        assert!(parse.to_string().contains("Failed to parse"));

        let cycle = LoadError::ImportCycle {
            path: PathBuf::from("/tmp/a.toml"),
            cycle: vec![PathBuf::from("/tmp/a.toml"), PathBuf::from("/tmp/b.toml")],
        };
        let display = cycle.to_string();
        assert!(display.contains("Import cycle detected"));
        assert!(display.contains("/tmp/a.toml"));
        assert!(display.contains("2 file(s)"));
    }
}
