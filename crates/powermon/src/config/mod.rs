//! Layered TOML configuration for the `powermon` binary.
//!
//! Files are loaded with their imports, merged first-wins, converted and
//! validated. Every problem found along the way is collected as a
//! [`Diagnostic`] and rendered with source snippets by [`format_diagnostics`].

mod config;
mod diagnostics;
mod located;
mod partial;

pub use config::Config;
pub use config::HostConfig;
pub use config::LogLevel;
pub use config::LoggingConfig;
pub use diagnostics::Diagnostic;
pub use diagnostics::Diagnostics;
pub use diagnostics::Error;
pub use diagnostics::LoadError;
pub use diagnostics::MergeConflictLocation;
pub use diagnostics::MergeError;
pub use diagnostics::SourceInfo;
pub use diagnostics::ValidationError;
pub use diagnostics::Warning;
pub use diagnostics::format_diagnostics;
pub use located::Located;
pub use partial::PartialCardConfig;
pub use partial::PartialConfig;
pub use partial::PartialHostConfig;
pub use partial::PartialLoggingConfig;
