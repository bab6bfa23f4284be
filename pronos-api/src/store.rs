use async_trait::async_trait;

use crate::{Comment, CommentId, Error, NewPost, Post, PostId, UserId};

/// Backend holding the comments of every post
#[async_trait]
pub trait CommentStore {
    fn current_user(&self) -> UserId;

    /// All the comments of `post`, flat, in chronological order
    async fn fetch_comments(&self, post: PostId) -> Result<Vec<Comment>, Error>;

    /// Creates a comment authored by the current user
    async fn create_comment(
        &self,
        post: PostId,
        content: String,
        parent_id: Option<CommentId>,
    ) -> Result<Comment, Error>;

    async fn toggle_comment_like(&self, comment: CommentId, user: UserId) -> Result<(), Error>;
}

#[async_trait]
pub trait PostStore {
    /// All the posts, newest first
    async fn fetch_posts(&self) -> Result<Vec<Post>, Error>;
    async fn create_post(&self, post: NewPost) -> Result<PostId, Error>;
    async fn toggle_post_like(&self, post: PostId) -> Result<(), Error>;
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FollowCounts {
    pub followers: u64,
    pub following: u64,
}

#[async_trait]
pub trait FollowStore {
    /// Returns whether the current user now follows `target`
    async fn toggle_follow(&self, target: UserId) -> Result<bool, Error>;
    async fn is_following(&self, target: UserId) -> Result<bool, Error>;
    async fn follow_counts(&self, user: UserId) -> Result<FollowCounts, Error>;
}
