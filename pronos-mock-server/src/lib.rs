use std::{
    cmp::Reverse,
    collections::{btree_map, BTreeMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use pronos_client::api::{
    self, Author, CommentId, CommentStore, Error, FollowCounts, FollowStore, NewPost, Post,
    PostId, PostStore, UserId, Uuid,
};
use tokio::sync::mpsc;

/// In-memory backend, shared by all the clients connected to it
#[derive(Clone, Default)]
pub struct MockServer(Arc<Mutex<State>>);

#[derive(Default)]
struct State {
    users: BTreeMap<UserId, Author>,
    posts: Vec<Post>,
    comments: Vec<api::Comment>,
    comment_likes: HashSet<(CommentId, UserId)>,
    post_likes: HashSet<(PostId, UserId)>,

    /// (follower, followed)
    follows: HashSet<(UserId, UserId)>,
    feeds: Vec<(PostId, mpsc::UnboundedSender<api::Comment>)>,
    offline: bool,
}

impl State {
    fn check_online(&self) -> Result<(), Error> {
        match self.offline {
            true => Err(Error::Unknown(String::from("server is offline"))),
            false => Ok(()),
        }
    }

    fn author(&self, user: UserId) -> Result<&Author, Error> {
        self.users.get(&user).ok_or(Error::NotFound(user.0))
    }

    fn post_mut(&mut self, post: PostId) -> Result<&mut Post, Error> {
        self.posts
            .iter_mut()
            .find(|p| p.id == post)
            .ok_or(Error::NotFound(post.0))
    }

    // Stored comments do not carry the per-user like flag
    fn comment_for(&self, c: &api::Comment, user: UserId) -> api::Comment {
        api::Comment {
            liked_by_current_user: self.comment_likes.contains(&(c.id, user)),
            ..c.clone()
        }
    }

    fn add_post(
        &mut self,
        author: UserId,
        post: NewPost,
        created_at: api::Time,
    ) -> Result<PostId, Error> {
        post.validate()?;
        if self.posts.iter().any(|p| p.id == post.id) {
            return Err(Error::UuidAlreadyUsed(post.id.0));
        }
        let author = self.author(author)?.clone();
        self.posts.push(Post {
            id: post.id,
            author,
            created_at,
            analysis: post.analysis,
            confidence: post.confidence,
            image_url: post.image_url,
            video_url: post.video_url,
            prediction: post.prediction,
            like_count: 0,
            comment_count: 0,
            share_count: 0,
            liked_by_current_user: false,
        });
        Ok(post.id)
    }

    fn add_comment(&mut self, c: api::Comment) -> Result<(), Error> {
        api::validate_content(&c.content)?;
        if self.comments.iter().any(|o| o.id == c.id) {
            return Err(Error::UuidAlreadyUsed(c.id.0));
        }
        if let Some(parent) = c.parent_id {
            if !self
                .comments
                .iter()
                .any(|o| o.id == parent && o.post_id == c.post_id)
            {
                return Err(Error::NotFound(parent.0));
            }
        }
        self.post_mut(c.post_id)?.comment_count += 1;
        self.feeds.retain_mut(|(post, f)| {
            *post != c.post_id || matches!(f.send(c.clone()), Ok(()))
        });
        self.comments.push(c);
        Ok(())
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer::default()
    }

    pub fn admin_create_user(&self, u: Author) -> Result<(), Error> {
        api::validate_content(&u.username)?;
        let mut s = self.0.lock();
        if s.users.values().any(|o| o.username == u.username) {
            return Err(Error::NameAlreadyUsed(u.username));
        }
        match s.users.entry(u.id) {
            btree_map::Entry::Occupied(_) => Err(Error::UuidAlreadyUsed(u.id.0)),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(u);
                Ok(())
            }
        }
    }

    /// Stores a comment as is, eg. to seed a thread with old comments
    pub fn admin_add_comment(&self, c: api::Comment) -> Result<(), Error> {
        let mut s = self.0.lock();
        s.author(c.author.id)?;
        s.add_comment(c)
    }

    pub fn connect(&self, user: UserId) -> Result<MockClient, Error> {
        self.0.lock().author(user)?;
        Ok(MockClient {
            server: self.clone(),
            user,
        })
    }

    /// While offline, every call from a client fails
    pub fn set_offline(&self, offline: bool) {
        tracing::info!(offline, "switching mock server connectivity");
        self.0.lock().offline = offline;
    }

    /// Comments created on `post` from now on
    pub fn comment_feed(&self, post: PostId) -> mpsc::UnboundedReceiver<api::Comment> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.0.lock().feeds.push((post, sender));
        receiver
    }

    /// Return the current number of comments on `post`
    pub fn test_num_comments(&self, post: PostId) -> usize {
        self.0
            .lock()
            .comments
            .iter()
            .filter(|c| c.post_id == post)
            .count()
    }

    /// Stores a post written by `author`, dated `created_at`
    pub fn admin_add_post(
        &self,
        author: UserId,
        post: NewPost,
        created_at: api::Time,
    ) -> Result<(), Error> {
        self.0.lock().add_post(author, post, created_at)?;
        Ok(())
    }

    /// Return the stored like count of `comment`
    pub fn test_comment_likes(&self, comment: CommentId) -> Option<u64> {
        self.0
            .lock()
            .comments
            .iter()
            .find(|c| c.id == comment)
            .map(|c| c.like_count)
    }
}

/// Connection to a `MockServer` as one user
#[derive(Clone)]
pub struct MockClient {
    server: MockServer,
    user: UserId,
}

#[async_trait]
impl CommentStore for MockClient {
    fn current_user(&self) -> UserId {
        self.user
    }

    async fn fetch_comments(&self, post: PostId) -> Result<Vec<api::Comment>, Error> {
        let s = self.server.0.lock();
        s.check_online()?;
        let mut res = s
            .comments
            .iter()
            .filter(|c| c.post_id == post)
            .map(|c| s.comment_for(c, self.user))
            .collect::<Vec<_>>();
        res.sort_by_key(|c| c.created_at);
        Ok(res)
    }

    async fn create_comment(
        &self,
        post: PostId,
        content: String,
        parent_id: Option<CommentId>,
    ) -> Result<api::Comment, Error> {
        let mut s = self.server.0.lock();
        s.check_online()?;
        let c = api::Comment {
            id: CommentId(Uuid::new_v4()),
            post_id: post,
            author: s.author(self.user)?.clone(),
            content,
            created_at: Utc::now(),
            like_count: 0,
            liked_by_current_user: false,
            parent_id,
        };
        s.add_comment(c.clone())?;
        tracing::info!(comment=?c.id, ?post, "created comment");
        Ok(c)
    }

    async fn toggle_comment_like(&self, comment: CommentId, user: UserId) -> Result<(), Error> {
        let mut s = self.server.0.lock();
        s.check_online()?;
        if user != self.user {
            return Err(Error::PermissionDenied);
        }
        let liked = s.comment_likes.contains(&(comment, user));
        let c = s
            .comments
            .iter_mut()
            .find(|c| c.id == comment)
            .ok_or(Error::NotFound(comment.0))?;
        c.like_count = match liked {
            true => c.like_count.saturating_sub(1),
            false => c.like_count + 1,
        };
        match liked {
            true => s.comment_likes.remove(&(comment, user)),
            false => s.comment_likes.insert((comment, user)),
        };
        Ok(())
    }
}

#[async_trait]
impl PostStore for MockClient {
    async fn fetch_posts(&self) -> Result<Vec<Post>, Error> {
        let s = self.server.0.lock();
        s.check_online()?;
        let mut res = s
            .posts
            .iter()
            .map(|p| Post {
                liked_by_current_user: s.post_likes.contains(&(p.id, self.user)),
                ..p.clone()
            })
            .collect::<Vec<_>>();
        res.sort_unstable_by_key(|p| Reverse(p.created_at));
        Ok(res)
    }

    async fn create_post(&self, post: NewPost) -> Result<PostId, Error> {
        let mut s = self.server.0.lock();
        s.check_online()?;
        let id = s.add_post(self.user, post, Utc::now())?;
        tracing::info!(post=?id, "created post");
        Ok(id)
    }

    async fn toggle_post_like(&self, post: PostId) -> Result<(), Error> {
        let mut s = self.server.0.lock();
        s.check_online()?;
        let key = (post, self.user);
        let liked = s.post_likes.contains(&key);
        let p = s.post_mut(post)?;
        p.like_count = match liked {
            true => p.like_count.saturating_sub(1),
            false => p.like_count + 1,
        };
        match liked {
            true => s.post_likes.remove(&key),
            false => s.post_likes.insert(key),
        };
        Ok(())
    }
}

#[async_trait]
impl FollowStore for MockClient {
    async fn toggle_follow(&self, target: UserId) -> Result<bool, Error> {
        let mut s = self.server.0.lock();
        s.check_online()?;
        if target == self.user {
            return Err(Error::CannotFollowSelf);
        }
        s.author(target)?;
        let key = (self.user, target);
        match s.follows.remove(&key) {
            true => Ok(false),
            false => {
                s.follows.insert(key);
                Ok(true)
            }
        }
    }

    async fn is_following(&self, target: UserId) -> Result<bool, Error> {
        let s = self.server.0.lock();
        s.check_online()?;
        Ok(s.follows.contains(&(self.user, target)))
    }

    async fn follow_counts(&self, user: UserId) -> Result<FollowCounts, Error> {
        let s = self.server.0.lock();
        s.check_online()?;
        s.author(user)?;
        Ok(FollowCounts {
            followers: s.follows.iter().filter(|(_, to)| *to == user).count() as u64,
            following: s.follows.iter().filter(|(from, _)| *from == user).count() as u64,
        })
    }
}
