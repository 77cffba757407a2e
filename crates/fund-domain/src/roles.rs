//! Author and actor roles.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of the applicant on the publication being rewarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorRole {
    FirstAuthor,
    CorrespondingAuthor,
}

impl fmt::Display for AuthorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AuthorRole::FirstAuthor => "first_author",
            AuthorRole::CorrespondingAuthor => "corresponding_author",
        };
        f.write_str(label)
    }
}

/// Role of whoever is driving a workflow action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Teacher,
    DeptHead,
    Admin,
}

impl ActorRole {
    /// Department heads and admins review; teachers apply.
    pub fn is_reviewer(self) -> bool {
        matches!(self, ActorRole::DeptHead | ActorRole::Admin)
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ActorRole::Teacher => "teacher",
            ActorRole::DeptHead => "dept_head",
            ActorRole::Admin => "admin",
        };
        f.write_str(label)
    }
}
