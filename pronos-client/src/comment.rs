use crate::api::{self, Author, CommentId, Time};

/// Whether the backend knows about a comment
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SaveState {
    Saved,

    /// Written locally, waiting for the backend
    Pending,

    /// The backend refused it. Shown until the next refresh
    Failed,
}

/// A node of a comment thread
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    pub id: CommentId,
    pub parent_id: Option<CommentId>,
    pub author: Author,
    pub content: String,
    pub created_at: Time,

    /// Never lower than 1 while `liked` is set
    pub like_count: u64,
    pub liked: bool,

    /// Whether the replies are currently shown. Never persisted
    pub expanded: bool,

    pub state: SaveState,

    /// Replies, in chronological order
    pub children: Vec<Comment>,
}

// Reply chains have no depth limit, so they are torn down without recursing
impl Drop for Comment {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut c) = stack.pop() {
            stack.append(&mut c.children);
        }
    }
}

impl Comment {
    pub fn from_api(c: api::Comment, children: Vec<Comment>) -> Comment {
        Comment {
            id: c.id,
            parent_id: c.parent_id,
            author: c.author,
            content: c.content,
            created_at: c.created_at,
            like_count: c.like_count.max(u64::from(c.liked_by_current_user)),
            liked: c.liked_by_current_user,
            expanded: false,
            state: SaveState::Saved,
            children,
        }
    }

    pub fn is_saved(&self) -> bool {
        self.state == SaveState::Saved
    }

    pub fn is_pending(&self) -> bool {
        self.state == SaveState::Pending
    }

    pub fn has_replies(&self) -> bool {
        !self.children.is_empty()
    }

    /// Whether the replies should be rendered
    pub fn shows_replies(&self) -> bool {
        self.expanded && self.has_replies()
    }

    pub fn toggle_like(&mut self) {
        if self.liked {
            self.liked = false;
            self.like_count = self.like_count.saturating_sub(1);
        } else {
            self.liked = true;
            self.like_count += 1;
        }
    }

    /// Number of comments in this subtree, including self
    pub fn subtree_len(&self) -> usize {
        let mut len = 0;
        let mut stack = vec![self];
        while let Some(c) = stack.pop() {
            len += 1;
            stack.extend(&c.children);
        }
        len
    }

    /// Depth-first search, at any depth
    pub fn find_in<'a>(comments: &'a [Comment], id: &CommentId) -> Option<&'a Comment> {
        let mut stack = comments.iter().rev().collect::<Vec<_>>();
        while let Some(c) = stack.pop() {
            if c.id == *id {
                return Some(c);
            }
            stack.extend(c.children.iter().rev());
        }
        None
    }

    pub fn find_in_mut<'a>(comments: &'a mut [Comment], id: &CommentId) -> Option<&'a mut Comment> {
        let mut stack = comments.iter_mut().rev().collect::<Vec<_>>();
        while let Some(c) = stack.pop() {
            if c.id == *id {
                return Some(c);
            }
            stack.extend(c.children.iter_mut().rev());
        }
        None
    }
}
