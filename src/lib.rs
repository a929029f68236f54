//! Script annotation for stage management.
//!
//! A [`Script`] is an ordered set of numbered [`Line`]s. Each line is
//! decomposed into [`LineElement`]s so that [`Cue`]s can be anchored before
//! or after a single word, and [`Section`]s group ranges of lines into acts,
//! scenes and songs. Scripts are stored as versioned YAML documents.

pub mod domain;
pub use domain::{
    AnchorStatus, Config, Cue, CuePosition, Diagnostic, Error, HapticTarget, Line, LineElement,
    LineNumber, RebaseReport, Script, Section, SectionRange, SectionStatus,
};

/// Reading and writing script documents.
pub mod storage;
pub use storage::LoadError;
