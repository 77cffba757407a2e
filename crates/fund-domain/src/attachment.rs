//! Attachment metadata. Binary content lives in the blob store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A file attached to a submission, ordered as the applicant declared it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_id: Uuid,
    pub submission_id: Uuid,
    pub file_name: String,
    pub mime_type: String,
    pub order: u32,
}

impl Attachment {
    pub fn new(
        submission_id: Uuid,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        order: u32,
    ) -> Self {
        Self {
            file_id: Uuid::new_v4(),
            submission_id,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            order,
        }
    }
}
