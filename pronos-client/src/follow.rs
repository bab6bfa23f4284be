use crate::api::{self, FollowCounts, FollowStore, UserId};

/// State of the follow button on someone's profile
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FollowButton {
    me: UserId,
    target: UserId,
    following: bool,
    loaded: bool,
    counts: FollowCounts,
}

impl FollowButton {
    pub fn new(me: UserId, target: UserId) -> FollowButton {
        FollowButton {
            me,
            target,
            following: false,
            loaded: false,
            counts: FollowCounts::default(),
        }
    }

    pub fn target(&self) -> UserId {
        self.target
    }

    /// The button is hidden on one's own profile
    pub fn is_self(&self) -> bool {
        self.me == self.target
    }

    pub fn is_following(&self) -> bool {
        self.following
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn counts(&self) -> FollowCounts {
        self.counts
    }

    pub fn label(&self) -> &'static str {
        match self.following {
            true => "Following",
            false => "Follow",
        }
    }

    pub async fn load<S>(&mut self, store: &S) -> Result<(), api::Error>
    where
        S: FollowStore + ?Sized,
    {
        self.counts = store.follow_counts(self.target).await?;
        if !self.is_self() {
            self.following = store.is_following(self.target).await?;
        }
        self.loaded = true;
        Ok(())
    }

    /// Returns whether `me` now follows the target
    pub async fn toggle<S>(&mut self, store: &S) -> Result<bool, api::Error>
    where
        S: FollowStore + ?Sized,
    {
        if self.is_self() {
            return Err(api::Error::CannotFollowSelf);
        }
        let now_following = store.toggle_follow(self.target).await.map_err(|err| {
            tracing::error!(?err, target=?self.target, "failed toggling follow");
            err
        })?;
        if now_following != self.following {
            self.counts.followers = match now_following {
                true => self.counts.followers + 1,
                false => self.counts.followers.saturating_sub(1),
            };
        }
        self.following = now_following;
        Ok(now_following)
    }
}
