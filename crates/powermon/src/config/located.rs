use std::ops::Deref;
use std::ops::Range;

use serde::Deserialize;

use super::diagnostics::MergeConflictLocation;
use super::diagnostics::SourceInfo;

/// A config value together with where it was written.
///
/// Deserialized through `toml::Spanned<T>`; the source file is attached after
/// the file has been parsed.
#[derive(Debug, Clone)]
pub struct Located<T> {
    value: T,
    /// Byte span in the source file
    span: Range<usize>,
    source: SourceInfo,
}

impl<T> Located<T> {
    pub fn new(value: T, span: Range<usize>, source: SourceInfo) -> Self {
        Self {
            value,
            span,
            source,
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }

    pub fn span(&self) -> &Range<usize> {
        &self.span
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    /// Attach the file this value was read from.
    pub fn set_source(&mut self, source: &SourceInfo) {
        self.source = source.clone();
    }

    pub fn to_conflict_location(&self) -> MergeConflictLocation {
        MergeConflictLocation {
            file_path: self.source.file_path.clone(),
            span: self.span.clone(),
            content: self.source.content.clone(),
        }
    }
}

impl<T> Deref for Located<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<'de, T> Deserialize<'de> for Located<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let spanned = toml::Spanned::<T>::deserialize(deserializer)?;
        let span = spanned.span().clone();

        Ok(Located {
            value: spanned.into_inner(),
            span,
            source: SourceInfo::unknown(),
        })
    }
}

impl<T: PartialEq> PartialEq for Located<T> {
    fn eq(&self, other: &Self) -> bool {
        // Only compare values, not location information
        self.value == other.value
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[derive(Deserialize)]
    struct Doc {
        room: Located<String>,
    }

    #[test]
    fn test_located_span() {
        let content = "room = \"sensor.energy_power_monitor_kitchen\"\n";
        let mut doc: Doc = toml::from_str(content).unwrap();
        assert_eq!(doc.room.get_ref(), "sensor.energy_power_monitor_kitchen");
        assert!(content[doc.room.span().clone()].contains("sensor.energy_power_monitor_kitchen"));
        assert_eq!(doc.room.source().file_path, PathBuf::from("<unknown>"));

        let source = SourceInfo {
            file_path: PathBuf::from("card.toml"),
            content: content.to_string(),
        };
        doc.room.set_source(&source);
        let location = doc.room.to_conflict_location();
        assert_eq!(location.file_path, PathBuf::from("card.toml"));
        assert_eq!(&location.span, doc.room.span());
    }
}
