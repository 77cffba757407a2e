//! fund-domain
//!
//! Pure domain models for fund and publication-reward applications
//! (Submission, BudgetPool, ApprovalDecision, Money, etc.).
//! No I/O, no storage, no locking. Only data types, invariants and enums.

pub mod amounts;
pub mod attachment;
pub mod common;
pub mod decision;
pub mod event;
pub mod money;
pub mod pool;
pub mod roles;
pub mod status;
pub mod submission;
pub mod tier;

pub use amounts::*;
pub use attachment::*;
pub use common::*;
pub use decision::*;
pub use event::*;
pub use money::*;
pub use pool::*;
pub use roles::*;
pub use status::*;
pub use submission::*;
pub use tier::*;
