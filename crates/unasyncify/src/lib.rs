//! Run the twin generator over a configured Python project.
//!
//! Files are transformed in memory first; nothing is written unless every
//! file transformed cleanly.

mod files;
mod run;
mod scaffold;

pub use files::gather_files;
pub use run::{RunError, RunMode, RunSummary, StagedFile, run, stage};
pub use scaffold::{TEMPLATE, ensure_codegen_template, render_template};
