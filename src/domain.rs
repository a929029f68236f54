//! Domain models for script annotation.
//!
//! This module contains the core domain types: scripts, their lines and
//! line elements, the cues anchored to those elements, and the sections laid
//! over the lines.

/// Splitting line text into addressable elements.
pub mod decompose;

/// Closed vocabularies with stable wire values.
pub mod kinds;

pub mod presentation;

mod line_number;
pub use line_number::{InvalidLineNumber, LineNumber};

/// Cues and their anchors.
pub mod cue;
pub use cue::{AnchorStatus, Cue, CuePosition, HapticTarget};

/// Lines and line elements.
pub mod line;
pub use line::{Line, LineElement, RebaseReport};

/// Sections and their line ranges.
pub mod section;
pub use section::{Section, SectionRange, SectionStatus};

pub mod script;
pub use script::{Error, Script};

pub mod validation;
pub use validation::Diagnostic;

mod config;
pub use config::Config;
