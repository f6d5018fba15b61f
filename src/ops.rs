//! Edit-producing operations.

use crate::edit::Edit;
use crate::state::AnalysisState;
use crate::workflow::RefactorOp;

/// Renames every method declared as `target` to `replacement`.
///
/// Plans a `Replace` over each matching method-name span. Converges:
/// after the edits apply and the facts refresh, no declaration named
/// `target` remains, so the next planning pass is empty and the workflow
/// reaches `Done`.
pub struct RenameMethod {
    pub target: String,
    pub replacement: String,
}

impl RefactorOp for RenameMethod {
    fn name(&self) -> &str {
        "rename-method"
    }

    fn plan(&mut self, state: &AnalysisState) -> Vec<Edit> {
        state
            .facts
            .methods
            .iter()
            .filter(|method| method.name == self.target)
            .map(|method| {
                Edit::replace(
                    method.name_span,
                    self.replacement.clone(),
                    format!("rename method `{}` to `{}`", self.target, self.replacement),
                )
            })
            .collect()
    }
}
