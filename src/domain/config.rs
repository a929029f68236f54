use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::decompose::DecomposeOptions;

/// Configuration for script editing.
///
/// This struct holds settings that control how line text is decomposed, how
/// cues follow their words when a line is edited, and what validation
/// reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Whether tokens made only of punctuation are typed as punctuation
    /// rather than as words.
    pub classify_punctuation: bool,

    /// How far (in elements) a cue's anchor word is searched for when its
    /// line is re-decomposed.
    ///
    /// A cue whose word is not found within this distance of its old index
    /// is orphaned.
    rebase_window: usize,

    /// Whether validation reports sections that partially overlap.
    ///
    /// Nested sections are never reported.
    pub warn_crossing_sections: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classify_punctuation: true,
            rebase_window: default_rebase_window(),
            warn_crossing_sections: true,
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the cue rebase search radius.
    #[must_use]
    pub const fn rebase_window(&self) -> usize {
        self.rebase_window
    }

    /// Sets the cue rebase search radius.
    pub const fn set_rebase_window(&mut self, window: usize) {
        self.rebase_window = window;
    }

    /// The decomposition options implied by this configuration.
    #[must_use]
    pub const fn decompose_options(&self) -> DecomposeOptions {
        DecomposeOptions {
            classify_punctuation: self.classify_punctuation,
        }
    }
}

const fn default_rebase_window() -> usize {
    3
}

const fn default_true() -> bool {
    true
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_true")]
        classify_punctuation: bool,

        /// Search radius, in elements, for rebasing cue anchors.
        #[serde(default = "default_rebase_window")]
        rebase_window: usize,

        #[serde(default = "default_true")]
        warn_crossing_sections: bool,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                classify_punctuation,
                rebase_window,
                warn_crossing_sections,
            } => Self {
                classify_punctuation,
                rebase_window,
                warn_crossing_sections,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            classify_punctuation: config.classify_punctuation,
            rebase_window: config.rebase_window,
            warn_crossing_sections: config.warn_crossing_sections,
        }
    }
}
