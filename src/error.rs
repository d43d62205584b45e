use thiserror::Error;

use crate::asset_graph::ObjectId;

/// Failures while loading an asset graph dump.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid asset graph JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("duplicate object id {0}")]
    DuplicateId(ObjectId),

    #[error("object {id} has unknown class '{class}'")]
    UnknownClass { id: ObjectId, class: String },

    #[error("object {id} ({class}) has invalid texture payload: {reason}")]
    InvalidPayload {
        id: ObjectId,
        class: String,
        reason: String,
    },
}
