use chrono::Utc;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

mod comment;
pub use comment::{Comment, CommentId};

mod error;
pub use error::Error;

mod post;
pub use post::{Confidence, MatchLeg, NewPost, Post, PostId, Prediction, Sport};

mod store;
pub use store::{CommentStore, FollowCounts, FollowStore, PostStore};

mod user;
pub use user::{Author, UserId};

// The validate functions check that the data is acceptable for the backend.
// They do not replace the engine's own checks, which run before anything is
// sent over.

pub fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(String::from(s)));
    }
    Ok(())
}

pub fn validate_content(s: &str) -> Result<(), Error> {
    validate_string(s)?;
    if s.trim().is_empty() {
        return Err(Error::EmptyContent);
    }
    Ok(())
}

pub fn validate_odds(odds: f64) -> Result<(), Error> {
    if !odds.is_finite() || odds <= 0.0 {
        return Err(Error::InvalidOdds(format!("{odds}")));
    }
    Ok(())
}
