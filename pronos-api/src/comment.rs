use uuid::Uuid;

use crate::{Author, PostId, Time, STUB_UUID};

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct CommentId(pub Uuid);

impl CommentId {
    pub fn stub() -> CommentId {
        CommentId(STUB_UUID)
    }
}

/// A comment as the backend returns it: flat, linked to its parent by id
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author: Author,
    pub content: String,
    pub created_at: Time,
    pub like_count: u64,
    pub liked_by_current_user: bool,

    /// None for top-level comments
    pub parent_id: Option<CommentId>,
}
