//! Count reconciliation modes
//!
//! | Mode | Pure adds | Pure removals | Modifications that flip the match |
//! |------|-----------|---------------|-----------------------------------|
//! | Faithful (default) | +1 if match | −1 if original matched | ignored |
//! | Corrected | +1 if match | −1 if original matched | +match(new) − match(original) |
//!
//! `Faithful` is the long-standing behavior: a transaction that edits a
//! feature so it starts or stops matching the filter does not change the
//! count it sees. `Corrected` must be asked for explicitly.

use serde::{Deserialize, Serialize};

/// How `count` folds staged modifications into the native count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationMode {
    /// Adjust for pure additions and pure removals only
    #[default]
    Faithful,
    /// Also adjust for replacements whose match status differs from the
    /// committed original
    Corrected,
}

impl ReconciliationMode {
    /// Check if replacements are folded into counts
    pub fn counts_replacements(&self) -> bool {
        matches!(self, ReconciliationMode::Corrected)
    }
}
