use dialoguer::console::Term;

use crate::model::GcEntry;

/// Outcome of one garbage collection sweep
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GcReport {
    pub examined: usize,
    /// Entries dropped from the registry, including orphaned ones
    pub collected: usize,
    /// Entries still inside their grace period
    pub kept: usize,
    /// Entries dropped whose directory could not be deleted
    pub orphaned: usize,
    pub entries: Vec<GcEntry>,
}

impl GcReport {
    pub fn format_with_style(&self, term: &Term) -> String {
        let num_style = |n| term.style().bold().apply_to(n);
        [
            format!("examined:  {}", num_style(self.examined)),
            format!("collected: {}", num_style(self.collected)),
            format!("kept:      {}", num_style(self.kept)),
            format!("orphaned:  {}", num_style(self.orphaned)),
        ]
        .join("\n")
    }
}
