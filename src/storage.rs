//! Script documents on disk.
//!
//! A script is stored as a single YAML document holding a versioned
//! [`ScriptRecord`]. Loading rebuilds the domain model and rejects documents
//! that break its structural rules.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use tracing::instrument;

use crate::domain::{Config, Script};

/// Serializable records for every entity of the model.
pub mod record;
pub use record::{InvalidRecord, ScriptRecord};

/// Errors that can occur when loading a script document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The document was not found.
    #[error("script document not found")]
    NotFound,
    /// An I/O error occurred.
    #[error("failed to read script document")]
    Io(#[from] io::Error),
    /// The YAML could not be parsed.
    #[error("failed to parse script document")]
    Yaml(#[from] serde_yaml::Error),
    /// The document parsed but breaks a rule of the model.
    #[error("invalid script document: {0}")]
    Invalid(#[from] InvalidRecord),
}

/// Errors that can occur when saving a script document.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// An I/O error occurred.
    #[error("failed to write script document")]
    Io(#[from] io::Error),
    /// The script could not be serialized.
    #[error("failed to serialize script document")]
    Yaml(#[from] serde_yaml::Error),
}

/// Read a script document from `reader`.
///
/// # Errors
///
/// Returns an error if the YAML is malformed or describes an invalid script.
pub fn read<R: Read>(reader: R, config: Config) -> Result<Script, LoadError> {
    let record: ScriptRecord = serde_yaml::from_reader(reader)?;
    Ok(record.into_script(config)?)
}

/// Write a script document to `writer`.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write<W: Write>(script: &Script, writer: W) -> Result<(), SaveError> {
    serde_yaml::to_writer(writer, &ScriptRecord::from(script))?;
    Ok(())
}

/// Load a script document from `path`.
///
/// # Errors
///
/// Returns [`LoadError::NotFound`] if there is no file at `path`, or another
/// [`LoadError`] if it cannot be read or is not a valid script.
#[instrument(skip(config))]
pub fn load(path: &Path, config: Config) -> Result<Script, LoadError> {
    let file = File::open(path).map_err(|io_error| match io_error.kind() {
        io::ErrorKind::NotFound => LoadError::NotFound,
        _ => LoadError::Io(io_error),
    })?;
    let script = read(BufReader::new(file), config)?;
    tracing::debug!(lines = script.line_count(), "loaded script");
    Ok(script)
}

/// Save a script document to `path`.
///
/// Parent directories are created automatically if they don't exist.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
#[instrument(skip(script))]
pub fn save(script: &Script, path: &Path) -> Result<(), SaveError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    write(script, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Render a script as pretty-printed JSON, using the same records as the
/// YAML document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json(script: &Script) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&ScriptRecord::from(script))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::domain::{CuePosition, LineNumber, kinds::CueType};

    fn sample() -> Script {
        let mut script = Script::new("Twelfth Night");
        let line = script
            .append_line("If music be the food of love, play on.")
            .unwrap()
            .id();
        script.append_line("Give me excess of it").unwrap();
        script
            .attach_cue(line, CuePosition::before(0), CueType::SoundGo, "SQ 1")
            .unwrap();
        script
    }

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("script.yaml");
        let script = sample();

        save(&script, &path).unwrap();
        let loaded = load(&path, Config::default()).unwrap();

        assert_eq!(loaded, script);
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = load(&tmp.path().join("absent.yaml"), Config::default()).unwrap_err();
        assert!(matches!(err, LoadError::NotFound));
    }

    #[test]
    fn malformed_yaml_is_reported() {
        let err = read("_version: '1'\nid: [".as_bytes(), Config::default()).unwrap_err();
        assert!(matches!(err, LoadError::Yaml(_)));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let document = "_version: '9'\nid: 5c8b7e1e-8a3f-4f0e-9d8c-3a1b2c3d4e5f\nname: x\ndateAdded: 2024-01-01T00:00:00Z\n";
        assert!(matches!(
            read(document.as_bytes(), Config::default()).unwrap_err(),
            LoadError::Yaml(_)
        ));
    }

    #[test]
    fn invalid_document_is_reported() {
        let document = "\
_version: '1'
id: 5c8b7e1e-8a3f-4f0e-9d8c-3a1b2c3d4e5f
name: Broken
dateAdded: 2024-01-01T00:00:00Z
lines:
- id: 6d9c8f2f-9b4a-4a1f-8e9d-4b2c3d4e5f60
  lineNumber: 1
  content: hello
  elements: []
";
        let err = read(document.as_bytes(), Config::default()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid(InvalidRecord::NoElements(n)) if n == LineNumber::FIRST
        ));
    }

    #[test]
    fn line_number_zero_is_rejected_while_parsing() {
        let document = "\
_version: '1'
id: 5c8b7e1e-8a3f-4f0e-9d8c-3a1b2c3d4e5f
name: Broken
dateAdded: 2024-01-01T00:00:00Z
lines:
- id: 6d9c8f2f-9b4a-4a1f-8e9d-4b2c3d4e5f60
  lineNumber: 0
  content: hello
  elements:
  - id: 7e0d9a3a-0c5b-4b2a-9f0e-5c3d4e5f6071
    position: 0
    content: hello
    elementType: word
";
        let err = read(document.as_bytes(), Config::default()).unwrap_err();
        assert!(matches!(err, LoadError::Yaml(_)));
    }

    #[test]
    fn json_uses_the_same_field_names() {
        let json = to_json(&sample()).unwrap();
        assert!(json.contains("\"_version\": \"1\""));
        assert!(json.contains("\"lineNumber\": 2"));
        assert!(json.contains("\"cueType\": \"sound_go\""));
    }
}
