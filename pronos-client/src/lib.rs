mod comment;
pub use comment::{Comment, SaveState};

mod feed;
pub use feed::Feed;

mod follow;
pub use follow::FollowButton;

pub mod odds;
pub use odds::{parse_odds, CombinedOdds};

mod prediction;
pub use prediction::{FormError, LegDraft, LegField, LegId, Mode, PredictionForm};

mod thread;
pub use thread::{RenderIter, RenderRow, Thread, ThreadError};

mod time;
pub use time::time_ago;

mod view;
pub use view::{CreateRequest, FetchRequest, LikeRequest, Notice, NoticeLevel, ThreadView};

pub mod api {
    pub use pronos_api::*;
}
