use std::collections::VecDeque;

use crate::{
    api::{self, Author, CommentId, CommentStore, PostId, UserId},
    Comment, Thread, ThreadError,
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Short-lived message for the user, eg. a toast
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

// Generation of the view a request was sent from
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Ticket(u64);

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FetchRequest {
    ticket: Ticket,
    pub post_id: PostId,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateRequest {
    ticket: Ticket,
    pub post_id: PostId,
    pub local_id: CommentId,
    pub parent_id: Option<CommentId>,
    pub content: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LikeRequest {
    ticket: Ticket,
    pub comment_id: CommentId,
    pub user: UserId,
}

/// The comment sheet of one post, as seen by one user.
///
/// Every mutation is applied locally right away. Requests to the backend are
/// handed out as `*Request` values, and their answers fed back through the
/// matching `finish_*` method. Answers that arrive after `close` are ignored.
pub struct ThreadView {
    me: Author,
    thread: Thread,
    generation: u64,
    closed: bool,
    fetches_in_flight: usize,
    draft: String,
    reply_to: Option<CommentId>,
    notices: VecDeque<Notice>,
}

impl ThreadView {
    pub fn open(post_id: PostId, me: Author) -> ThreadView {
        ThreadView {
            me,
            thread: Thread::new(post_id),
            generation: 0,
            closed: false,
            fetches_in_flight: 0,
            draft: String::new(),
            reply_to: None,
            notices: VecDeque::new(),
        }
    }

    pub fn post_id(&self) -> PostId {
        self.thread.post_id()
    }

    pub fn me(&self) -> &Author {
        &self.me
    }

    pub fn thread(&self) -> &Thread {
        &self.thread
    }

    pub fn is_loading(&self) -> bool {
        self.fetches_in_flight > 0
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Detaches the view: all the requests still in flight will be ignored
    pub fn close(&mut self) {
        self.generation += 1;
        self.closed = true;
        self.fetches_in_flight = 0;
    }

    fn ticket(&self) -> Ticket {
        Ticket(self.generation)
    }

    fn accepts(&self, ticket: Ticket, what: &str) -> bool {
        let current = !self.closed && ticket == self.ticket();
        if !current {
            tracing::debug!(post=?self.post_id(), "discarding stale {what} answer");
        }
        current
    }

    fn fail(&mut self, message: &str, err: api::Error) {
        tracing::error!(?err, post=?self.post_id(), "{message}");
        self.notices.push_back(Notice {
            level: NoticeLevel::Error,
            message: format!("{message}: {err}"),
        });
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft = String::from(text);
    }

    /// Whether the send button should be enabled
    pub fn can_send(&self) -> bool {
        !self.closed && !self.draft.trim().is_empty()
    }

    pub fn reply_target(&self) -> Option<&Comment> {
        self.reply_to.and_then(|id| self.thread.find(&id))
    }

    /// Picks the comment the draft answers to. Returns false, leaving the
    /// target unchanged, if the comment is not in the thread
    pub fn set_reply_target(&mut self, id: Option<CommentId>) -> bool {
        if let Some(id) = id {
            if self.thread.find(&id).is_none() {
                return false;
            }
        }
        self.reply_to = id;
        true
    }

    pub fn toggle_expanded(&mut self, id: &CommentId) -> bool {
        self.thread.toggle_expanded(id)
    }

    pub fn begin_fetch(&mut self) -> Option<FetchRequest> {
        if self.closed {
            return None;
        }
        self.fetches_in_flight += 1;
        Some(FetchRequest {
            ticket: self.ticket(),
            post_id: self.post_id(),
        })
    }

    /// Returns false if the answer was discarded
    pub fn finish_fetch(
        &mut self,
        req: FetchRequest,
        res: Result<Vec<api::Comment>, api::Error>,
    ) -> bool {
        if !self.accepts(req.ticket, "fetch") {
            return false;
        }
        self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
        match res {
            Ok(comments) => self.thread.reconcile(comments),
            Err(err) => self.fail("Could not load the comments", err),
        }
        true
    }

    /// Adds the draft to the thread, as a reply to the current reply target
    /// if any
    pub fn send_draft(&mut self) -> Result<CreateRequest, ThreadError> {
        if self.closed {
            return Err(ThreadError::Closed);
        }
        let local_id = match self.reply_to {
            Some(parent) => {
                if self.thread.find(&parent).map_or(false, |c| !c.is_saved()) {
                    return Err(ThreadError::ParentUnsaved(parent));
                }
                self.thread.add_reply(parent, self.me.clone(), &self.draft)?
            }
            None => self
                .thread
                .add_top_level_comment(self.me.clone(), &self.draft)?,
        };
        Ok(CreateRequest {
            ticket: self.ticket(),
            post_id: self.post_id(),
            local_id,
            parent_id: self.reply_to.take(),
            content: std::mem::take(&mut self.draft),
        })
    }

    /// Returns false if the answer was discarded
    pub fn finish_create(
        &mut self,
        req: CreateRequest,
        res: Result<api::Comment, api::Error>,
    ) -> bool {
        if !self.accepts(req.ticket, "create") {
            return false;
        }
        match res {
            Ok(c) => {
                self.thread.acknowledge(&req.local_id, c);
                self.notices.push_back(Notice {
                    level: NoticeLevel::Success,
                    message: String::from("Comment added"),
                });
            }
            Err(err) => {
                self.thread.mark_failed(&req.local_id);
                self.fail("Could not add the comment", err);
            }
        }
        true
    }

    /// Returns None if the comment is unknown or not saved
    pub fn toggle_like(&mut self, id: &CommentId) -> Option<LikeRequest> {
        if self.closed || !self.thread.find(id)?.is_saved() {
            return None;
        }
        self.thread.toggle_like(id);
        Some(LikeRequest {
            ticket: self.ticket(),
            comment_id: *id,
            user: self.me.id,
        })
    }

    /// Returns false if the answer was discarded
    pub fn finish_like(&mut self, req: LikeRequest, res: Result<(), api::Error>) -> bool {
        if !self.accepts(req.ticket, "like") {
            return false;
        }
        if let Err(err) = res {
            self.fail("Could not update the like", err);
        }
        true
    }

    /// Adds a comment pushed by the backend. Returns false if it was already
    /// known or belongs to another post
    pub fn receive_remote(&mut self, c: api::Comment) -> bool {
        if self.closed || c.post_id != self.post_id() {
            return false;
        }
        match self.thread.pending_match(&c) {
            Some(local) => self.thread.acknowledge(&local, c),
            None => self.thread.insert(c),
        }
    }

    pub async fn refresh<S>(&mut self, store: &S)
    where
        S: CommentStore + ?Sized,
    {
        if let Some(req) = self.begin_fetch() {
            let res = store.fetch_comments(req.post_id).await;
            self.finish_fetch(req, res);
        }
    }

    /// Sends the draft, then reloads the thread if it was saved
    pub async fn send<S>(&mut self, store: &S) -> Result<(), ThreadError>
    where
        S: CommentStore + ?Sized,
    {
        let req = self.send_draft()?;
        let res = store
            .create_comment(req.post_id, req.content.clone(), req.parent_id)
            .await;
        let saved = res.is_ok();
        self.finish_create(req, res);
        if saved {
            self.refresh(store).await;
        }
        Ok(())
    }

    /// Toggles the like on `id`, then reloads the thread if it was saved
    pub async fn like<S>(&mut self, store: &S, id: &CommentId)
    where
        S: CommentStore + ?Sized,
    {
        if let Some(req) = self.toggle_like(id) {
            let res = store.toggle_comment_like(req.comment_id, req.user).await;
            let saved = res.is_ok();
            self.finish_like(req, res);
            if saved {
                self.refresh(store).await;
            }
        }
    }
}
