use crate::STUB_UUID;

use uuid::Uuid;

#[derive(
    Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize,
)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn stub() -> UserId {
        UserId(STUB_UUID)
    }
}

/// Public identity shown next to posts and comments
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Author {
    pub id: UserId,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,

    /// Rank badge, eg. "Pro"
    pub badge: Option<String>,
}

impl Author {
    pub fn new(id: UserId, username: String) -> Author {
        Author {
            id,
            username,
            display_name: None,
            avatar_url: None,
            badge: None,
        }
    }

    pub fn with_badge(mut self, badge: &str) -> Author {
        self.badge = Some(String::from(badge));
        self
    }

    /// Name to display, falling back to the username
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}
