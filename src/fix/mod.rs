//! Automatic rewriting of ad-hoc logging calls.

mod edits;
mod fixer;
mod naming;
mod types;

pub use edits::{apply_edits, EditError, TextEdit};
pub use fixer::{FixPlan, Fixer};
pub use naming::{logger_name_for, module_logger_name};
pub use types::{ChangeType, FixChange, FixErrorKind, FixOptions, FixResult};
