use std::{
    collections::{HashMap, HashSet},
    iter::Peekable,
    slice,
};

use chrono::Utc;

use crate::{
    api::{self, Author, CommentId, PostId, Uuid},
    Comment, SaveState,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ThreadError {
    #[error("comment content is empty")]
    EmptyContent,

    #[error("parent comment {0:?} is not in this thread")]
    ParentNotFound(CommentId),

    #[error("parent comment {0:?} has not been saved")]
    ParentUnsaved(CommentId),

    #[error("the thread view has been closed")]
    Closed,
}

/// All the comments of one post, as a forest of replies.
///
/// Top-level comments and replies are both kept in chronological order:
/// fetched comments are sorted by creation date, and locally written ones
/// are appended at the end of their list.
///
/// Tree walks use explicit stacks, so reply chains can be arbitrarily deep.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Thread {
    post_id: PostId,
    roots: Vec<Comment>,
}

type ByParent = HashMap<Option<CommentId>, Vec<api::Comment>>;

struct Frame {
    owner: Option<api::Comment>,
    todo: std::vec::IntoIter<api::Comment>,
    done: Vec<Comment>,
}

impl Frame {
    fn new(owner: Option<api::Comment>, todo: Vec<api::Comment>) -> Frame {
        Frame {
            owner,
            todo: todo.into_iter(),
            done: Vec::new(),
        }
    }
}

// Turns `top` into subtrees, taking their replies out of `by_parent`
fn build(by_parent: &mut ByParent, top: Vec<api::Comment>) -> Vec<Comment> {
    let mut stack = Vec::new();
    let mut current = Frame::new(None, top);
    loop {
        match current.todo.next() {
            Some(c) => {
                let replies = by_parent.remove(&Some(c.id)).unwrap_or_default();
                stack.push(std::mem::replace(&mut current, Frame::new(Some(c), replies)));
            }
            None => match (current.owner.take(), stack.pop()) {
                (Some(owner), Some(parent)) => {
                    let children = std::mem::replace(&mut current, parent).done;
                    current.done.push(Comment::from_api(owner, children));
                }
                _ => return current.done,
            },
        }
    }
}

// `by_parent` only holds comments unreachable from the top level, so every
// one of them has an ancestor inside a parent cycle. Detaches the earliest
// comment of one such cycle, so that the rest of it hangs below it again.
fn break_cycle(by_parent: &mut ByParent) -> Option<api::Comment> {
    let links = by_parent
        .values()
        .flatten()
        .map(|c| (c.id, (c.parent_id, c.created_at)))
        .collect::<HashMap<_, _>>();
    let (start, _) = links.iter().min_by_key(|(id, (_, at))| (*at, **id))?;

    let mut path = Vec::new();
    let mut seen = HashSet::new();
    let mut cur = *start;
    while seen.insert(cur) {
        path.push(cur);
        cur = links.get(&cur)?.0?;
    }
    let cycle = &path[path.iter().position(|id| *id == cur)?..];
    let victim = *cycle
        .iter()
        .min_by_key(|id| (links.get(*id).map(|(_, at)| *at), **id))?;

    let parent = links.get(&victim)?.0;
    let siblings = by_parent.get_mut(&parent)?;
    let mut c = siblings.remove(siblings.iter().position(|c| c.id == victim)?);
    if siblings.is_empty() {
        by_parent.remove(&parent);
    }
    tracing::warn!(comment=?c.id, ?parent, "comment is part of a parent cycle");
    c.parent_id = None;
    Some(c)
}

// Splits an old tree into the set of expanded ids and the subtrees still
// waiting for the backend. Failed comments are dropped
fn split_local_state(
    mut nodes: Vec<Comment>,
    expanded: &mut HashSet<CommentId>,
    pending: &mut Vec<Comment>,
) {
    nodes.reverse();
    while let Some(mut c) = nodes.pop() {
        if c.is_pending() {
            pending.push(c);
            continue;
        }
        if c.expanded {
            expanded.insert(c.id);
        }
        nodes.extend(std::mem::take(&mut c.children).into_iter().rev());
    }
}

fn restore_expanded(nodes: &mut [Comment], expanded: &HashSet<CommentId>) {
    let mut stack = nodes.iter_mut().collect::<Vec<_>>();
    while let Some(c) = stack.pop() {
        c.expanded = expanded.contains(&c.id);
        stack.extend(c.children.iter_mut());
    }
}

fn remove_in(roots: &mut Vec<Comment>, id: &CommentId) -> Option<Comment> {
    let siblings = match Comment::find_in(roots, id)?.parent_id {
        None => roots,
        Some(parent) => &mut Comment::find_in_mut(roots, &parent)?.children,
    };
    let pos = siblings.iter().position(|c| c.id == *id)?;
    Some(siblings.remove(pos))
}

fn local_comment(
    author: Author,
    content: &str,
    parent_id: Option<CommentId>,
) -> Result<Comment, ThreadError> {
    if content.trim().is_empty() {
        return Err(ThreadError::EmptyContent);
    }
    Ok(Comment {
        id: CommentId(Uuid::new_v4()),
        parent_id,
        author,
        content: String::from(content),
        created_at: Utc::now(),
        like_count: 0,
        liked: false,
        expanded: false,
        state: SaveState::Pending,
        children: Vec::new(),
    })
}

impl Thread {
    pub fn new(post_id: PostId) -> Thread {
        Thread {
            post_id,
            roots: Vec::new(),
        }
    }

    /// Rebuilds the reply tree out of a flat list of comments.
    ///
    /// Comments whose parent is unknown end up as top-level comments. When
    /// parents loop back onto themselves, the earliest comment of the loop
    /// becomes top-level and the others stay below it.
    pub fn from_flat(post_id: PostId, mut comments: Vec<api::Comment>) -> Thread {
        comments.sort_by_key(|c| c.created_at);

        let mut seen = HashSet::new();
        comments.retain(|c| {
            let is_new = seen.insert(c.id);
            if !is_new {
                tracing::warn!(comment=?c.id, "dropping duplicate comment");
            }
            is_new
        });

        let mut by_parent = ByParent::new();
        for mut c in comments {
            let key = match c.parent_id {
                None => None,
                Some(p) if p != c.id && seen.contains(&p) => Some(p),
                Some(p) => {
                    tracing::warn!(comment=?c.id, parent=?p, "parent of comment is not in thread");
                    c.parent_id = None;
                    None
                }
            };
            by_parent.entry(key).or_default().push(c);
        }

        let top = by_parent.remove(&None).unwrap_or_default();
        let mut roots = build(&mut by_parent, top);
        while let Some(c) = break_cycle(&mut by_parent) {
            roots.extend(build(&mut by_parent, vec![c]));
        }
        roots.sort_by_key(|c| c.created_at);

        Thread { post_id, roots }
    }

    pub fn post_id(&self) -> PostId {
        self.post_id
    }

    pub fn roots(&self) -> &[Comment] {
        &self.roots
    }

    /// Number of comments at all depths
    pub fn len(&self) -> usize {
        self.roots.iter().map(|c| c.subtree_len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn find(&self, id: &CommentId) -> Option<&Comment> {
        Comment::find_in(&self.roots, id)
    }

    pub fn add_top_level_comment(
        &mut self,
        author: Author,
        content: &str,
    ) -> Result<CommentId, ThreadError> {
        let c = local_comment(author, content, None)?;
        let id = c.id;
        self.roots.push(c);
        Ok(id)
    }

    /// Appends a reply to `parent`, expanding it so the reply is visible
    pub fn add_reply(
        &mut self,
        parent: CommentId,
        author: Author,
        content: &str,
    ) -> Result<CommentId, ThreadError> {
        let c = local_comment(author, content, Some(parent))?;
        let id = c.id;
        let p = Comment::find_in_mut(&mut self.roots, &parent)
            .ok_or(ThreadError::ParentNotFound(parent))?;
        p.children.push(c);
        p.expanded = true;
        Ok(id)
    }

    /// Returns false if `id` is not in the thread
    pub fn toggle_like(&mut self, id: &CommentId) -> bool {
        match Comment::find_in_mut(&mut self.roots, id) {
            Some(c) => {
                c.toggle_like();
                true
            }
            None => false,
        }
    }

    /// Returns false if `id` is not in the thread or has no replies
    pub fn toggle_expanded(&mut self, id: &CommentId) -> bool {
        match Comment::find_in_mut(&mut self.roots, id) {
            Some(c) if c.has_replies() => {
                c.expanded = !c.expanded;
                true
            }
            _ => false,
        }
    }

    pub fn set_all_expanded(&mut self, expanded: bool) {
        let mut stack = self.roots.iter_mut().collect::<Vec<_>>();
        while let Some(c) = stack.pop() {
            c.expanded = expanded && c.has_replies();
            stack.extend(c.children.iter_mut());
        }
    }

    /// Visible comments, depth-first
    pub fn render(&self) -> RenderIter<'_> {
        RenderIter {
            levels: vec![self.roots.iter().peekable()],
            ancestors_last: Vec::new(),
        }
    }

    /// Adds a comment coming from the backend. Returns false if it was
    /// already there
    pub fn insert(&mut self, c: api::Comment) -> bool {
        if self.find(&c.id).is_some() {
            return false;
        }
        self.place(Comment::from_api(c, Vec::new()));
        true
    }

    fn place(&mut self, mut node: Comment) {
        match node
            .parent_id
            .and_then(|p| Comment::find_in_mut(&mut self.roots, &p))
        {
            Some(parent) => parent.children.push(node),
            None => {
                if let Some(p) = node.parent_id.take() {
                    tracing::warn!(comment=?node.id, parent=?p, "parent of comment is not in thread");
                }
                self.roots.push(node);
            }
        }
    }

    /// Replaces the tree with freshly fetched comments, keeping which
    /// comments are expanded and the comments still being sent
    pub fn reconcile(&mut self, comments: Vec<api::Comment>) {
        let mut expanded = HashSet::new();
        let mut pending = Vec::new();
        split_local_state(std::mem::take(&mut self.roots), &mut expanded, &mut pending);

        let mut fresh = Thread::from_flat(self.post_id, comments);
        restore_expanded(&mut fresh.roots, &expanded);
        for p in pending {
            fresh.place(p);
        }
        *self = fresh;
    }

    /// Swaps the local comment `local` for its saved version `c`.
    ///
    /// Returns false if `c` was already in the thread, in which case the
    /// local copy is dropped.
    pub fn acknowledge(&mut self, local: &CommentId, c: api::Comment) -> bool {
        if self.find(&c.id).is_some() {
            if self.find(local).map_or(false, |l| !l.is_saved()) {
                remove_in(&mut self.roots, local);
            }
            return false;
        }
        match Comment::find_in_mut(&mut self.roots, local) {
            Some(node) => {
                node.id = c.id;
                node.content = c.content;
                node.created_at = c.created_at;
                node.like_count = c.like_count.max(u64::from(c.liked_by_current_user));
                node.liked = c.liked_by_current_user;
                node.state = SaveState::Saved;
                for child in node.children.iter_mut() {
                    child.parent_id = Some(c.id);
                }
                true
            }
            None => self.insert(c),
        }
    }

    /// Gives up on saving the pending comment `id`. It stays displayed until
    /// the next reconcile, which drops it
    pub fn mark_failed(&mut self, id: &CommentId) -> bool {
        match Comment::find_in_mut(&mut self.roots, id) {
            Some(c) if c.is_pending() => {
                c.state = SaveState::Failed;
                true
            }
            _ => false,
        }
    }

    /// Pending comment that `c` is probably the saved version of
    pub fn pending_match(&self, c: &api::Comment) -> Option<CommentId> {
        let mut stack = self.roots.iter().rev().collect::<Vec<_>>();
        while let Some(n) = stack.pop() {
            if n.is_pending()
                && n.author.id == c.author.id
                && n.parent_id == c.parent_id
                && n.content == c.content
            {
                return Some(n.id);
            }
            stack.extend(n.children.iter().rev());
        }
        None
    }
}

/// One visible comment, with what is needed to draw the lines linking it to
/// its ancestors
#[derive(Clone, Debug)]
pub struct RenderRow<'a> {
    pub comment: &'a Comment,
    pub depth: usize,

    /// Whether this comment is the last one of its list
    pub is_last: bool,

    /// For each ancestor from the top-level one down, whether it is the last
    /// one of its list. Has `depth` elements
    pub ancestors_last: Vec<bool>,
}

impl RenderRow<'_> {
    pub fn reply_count(&self) -> usize {
        self.comment.children.len()
    }

    /// Vertical rails to draw left of the connector, one per nesting level
    /// below the top-level comment: true when the rail keeps going down
    pub fn rails(&self) -> impl Iterator<Item = bool> + '_ {
        self.ancestors_last.iter().skip(1).map(|last| !last)
    }

    /// Text version of the connector lines
    pub fn prefix(&self) -> String {
        if self.depth == 0 {
            return String::new();
        }
        let mut res = String::new();
        for rail in self.rails() {
            res.push_str(match rail {
                true => "│  ",
                false => "   ",
            });
        }
        res.push_str(match self.is_last {
            true => "└─ ",
            false => "├─ ",
        });
        res
    }
}

/// Lazy depth-first walk over the visible comments of a thread
pub struct RenderIter<'a> {
    levels: Vec<Peekable<slice::Iter<'a, Comment>>>,
    ancestors_last: Vec<bool>,
}

impl<'a> Iterator for RenderIter<'a> {
    type Item = RenderRow<'a>;

    fn next(&mut self) -> Option<RenderRow<'a>> {
        loop {
            let level = self.levels.last_mut()?;
            let comment = match level.next() {
                Some(c) => c,
                None => {
                    self.levels.pop();
                    self.ancestors_last.pop();
                    continue;
                }
            };
            let is_last = level.peek().is_none();
            let row = RenderRow {
                comment,
                depth: self.levels.len() - 1,
                is_last,
                ancestors_last: self.ancestors_last.clone(),
            };
            if comment.shows_replies() {
                self.levels.push(comment.children.iter().peekable());
                self.ancestors_last.push(is_last);
            }
            return Some(row);
        }
    }
}
