use std::cmp::Reverse;

use crate::api::{self, Post, PostId, PostStore};

/// The list of posts shown on the home page, newest first
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Feed {
    posts: Vec<Post>,
}

impl Feed {
    pub fn new() -> Feed {
        Feed::default()
    }

    pub fn replace(&mut self, mut posts: Vec<Post>) {
        for p in posts.iter_mut() {
            p.like_count = p.like_count.max(u64::from(p.liked_by_current_user));
        }
        posts.sort_unstable_by_key(|p| Reverse(p.created_at));
        self.posts = posts;
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn find(&self, id: &PostId) -> Option<&Post> {
        self.posts.iter().find(|p| p.id == *id)
    }

    /// Returns false if the post is not in the feed
    pub fn toggle_like(&mut self, id: &PostId) -> bool {
        let Some(p) = self.posts.iter_mut().find(|p| p.id == *id) else {
            return false;
        };
        if p.liked_by_current_user {
            p.liked_by_current_user = false;
            p.like_count = p.like_count.saturating_sub(1);
        } else {
            p.liked_by_current_user = true;
            p.like_count += 1;
        }
        true
    }

    pub async fn refresh<S>(&mut self, store: &S) -> Result<(), api::Error>
    where
        S: PostStore + ?Sized,
    {
        let posts = store.fetch_posts().await.map_err(|err| {
            tracing::error!(?err, "failed fetching the feed");
            err
        })?;
        self.replace(posts);
        Ok(())
    }

    /// Likes or unlikes `id`. The local counter is not rolled back on
    /// failure
    pub async fn like<S>(&mut self, store: &S, id: PostId) -> Result<(), api::Error>
    where
        S: PostStore + ?Sized,
    {
        if !self.toggle_like(&id) {
            return Err(api::Error::NotFound(id.0));
        }
        store.toggle_post_like(id).await.map_err(|err| {
            tracing::error!(?err, post=?id, "failed toggling like on post");
            err
        })
    }
}
