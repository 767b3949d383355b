pub mod predictions;
pub mod results;

pub use predictions::{import_predictions_file, merge_predictions, PredictionsImportOptions};
pub use results::{import_results_file, merge_results, ResultsImportOptions};

use crate::error::Diagnostic;

/// Outcome of one import call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Records taken from the text.
    pub imported: usize,
    /// Records that did not exist before.
    pub created: usize,
    /// Stored records dropped or overwritten by this import.
    pub replaced: usize,
    /// Recoverable problems, in source order.
    pub diagnostics: Vec<Diagnostic>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
