//! Shared traits and small value types used across the domain.

/// Converts an entity into a short label for logs and messages.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Fiscal year as used by the budget office (calendar numbering is up to the deployment).
pub type FiscalYear = i32;
