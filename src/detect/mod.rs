//! Detection of ad-hoc logging calls.

mod detector;
mod exclusion;
mod suppress;
mod types;

pub use detector::Detector;
pub(crate) use detector::{active_calls, parse_and_extract, syntax_error_message};
pub use exclusion::{relative_path, ExclusionClassifier};
pub use suppress::{filter_calls, parse_suppressions, Suppression};
pub use types::{
    Classification, ExclusionReason, FileAnalysisResult, FileErrorKind, Severity, Violation,
};
