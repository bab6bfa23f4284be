use chrono::{Duration, Utc};
use pronos_client::{
    api::{
        self, Author, CommentId, CommentStore, Confidence, Error, NewPost, PostId, Prediction,
        UserId, Uuid,
    },
    Feed, FollowButton, FormError, LegField, NoticeLevel, PredictionForm, ThreadView,
};
use pronos_mock_server::{MockClient, MockServer};

struct World {
    server: MockServer,
    me: Author,
    them: Author,
    post: PostId,
}

fn single(id: PostId, analysis: &str) -> NewPost {
    NewPost {
        id,
        analysis: String::from(analysis),
        confidence: Confidence::default(),
        image_url: None,
        video_url: None,
        prediction: Prediction::Single {
            sport: None,
            match_teams: None,
            prediction_text: None,
            odds: 2.1,
        },
    }
}

impl World {
    fn new() -> World {
        let server = MockServer::new();
        let me = Author::new(UserId(Uuid::new_v4()), String::from("@prono_king"));
        let them = Author::new(UserId(Uuid::new_v4()), String::from("@football_fan"));
        server.admin_create_user(me.clone()).unwrap();
        server.admin_create_user(them.clone()).unwrap();
        let post = PostId(Uuid::new_v4());
        server
            .admin_add_post(them.id, single(post, "Over 2.5 goals"), Utc::now())
            .unwrap();
        World {
            server,
            me,
            them,
            post,
        }
    }

    fn client(&self, who: &Author) -> MockClient {
        self.server.connect(who.id).unwrap()
    }

    fn seed(&self, author: &Author, parent_id: Option<CommentId>, minutes_ago: i64) -> CommentId {
        let id = CommentId(Uuid::new_v4());
        self.server
            .admin_add_comment(api::Comment {
                id,
                post_id: self.post,
                author: author.clone(),
                content: format!("seeded {minutes_ago}"),
                created_at: Utc::now() - Duration::minutes(minutes_ago),
                like_count: 0,
                liked_by_current_user: false,
                parent_id,
            })
            .unwrap();
        id
    }
}

#[tokio::test]
async fn refresh_builds_tree_from_server() {
    let w = World::new();
    let c1 = w.seed(&w.them, None, 60);
    let c4 = w.seed(&w.me, None, 50);
    let c2 = w.seed(&w.me, Some(c1), 40);
    let c3 = w.seed(&w.them, Some(c2), 30);

    let client = w.client(&w.me);
    let mut view = ThreadView::open(w.post, w.me.clone());
    view.refresh(&client).await;
    assert!(view.take_notices().is_empty());
    assert!(!view.is_loading());

    let visible = |v: &ThreadView| v.thread().render().map(|r| r.comment.id).collect::<Vec<_>>();
    assert_eq!(visible(&view), vec![c1, c4]);
    view.toggle_expanded(&c1);
    view.toggle_expanded(&c2);
    assert_eq!(visible(&view), vec![c1, c2, c3, c4]);

    // expansion survives a refresh
    w.seed(&w.them, Some(c1), 10);
    view.refresh(&client).await;
    assert_eq!(view.thread().len(), 5);
    assert_eq!(view.thread().render().count(), 5);
}

#[tokio::test]
async fn send_and_reply_round_trip() {
    let w = World::new();
    let mine = w.client(&w.me);
    let theirs = w.client(&w.them);

    let mut view = ThreadView::open(w.post, w.me.clone());
    view.set_draft("Easy win for the home side");
    view.send(&mine).await.unwrap();
    assert_eq!(w.server.test_num_comments(w.post), 1);
    let root = view.thread().roots()[0].clone();
    assert!(root.is_saved());
    assert_eq!(view.take_notices()[0].level, NoticeLevel::Success);

    let mut other = ThreadView::open(w.post, w.them.clone());
    other.refresh(&theirs).await;
    assert!(other.set_reply_target(Some(root.id)));
    other.set_draft("Not so sure");
    other.send(&theirs).await.unwrap();

    view.refresh(&mine).await;
    let reply = &view.thread().find(&root.id).unwrap().children[0];
    assert_eq!(reply.author.id, w.them.id);
    assert_eq!(reply.parent_id, Some(root.id));
}

#[tokio::test]
async fn likes_reach_the_server() {
    let w = World::new();
    let c = w.seed(&w.them, None, 5);
    let mine = w.client(&w.me);
    let mut view = ThreadView::open(w.post, w.me.clone());
    view.refresh(&mine).await;

    view.like(&mine, &c).await;
    assert_eq!(w.server.test_comment_likes(c), Some(1));
    let node = view.thread().find(&c).unwrap();
    assert_eq!((node.like_count, node.liked), (1, true));

    view.like(&mine, &c).await;
    assert_eq!(w.server.test_comment_likes(c), Some(0));
    assert!(!view.thread().find(&c).unwrap().liked);

    // another user cannot like on someone else's behalf
    assert_eq!(
        mine.toggle_comment_like(c, w.them.id).await,
        Err(Error::PermissionDenied)
    );
}

#[tokio::test]
async fn offline_failures_become_notices() {
    let w = World::new();
    let c = w.seed(&w.them, None, 5);
    let mine = w.client(&w.me);
    let mut view = ThreadView::open(w.post, w.me.clone());
    view.refresh(&mine).await;

    w.server.set_offline(true);
    view.set_draft("lost in the void");
    view.send(&mine).await.unwrap();
    view.like(&mine, &c).await;
    view.refresh(&mine).await;

    let notices = view.take_notices();
    assert_eq!(notices.len(), 3);
    assert!(notices.iter().all(|n| n.level == NoticeLevel::Error));
    // optimistic state is kept
    assert_eq!(view.thread().len(), 2);
    assert!(view.thread().find(&c).unwrap().liked);

    w.server.set_offline(false);
    view.refresh(&mine).await;
    assert_eq!(view.thread().len(), 1);
    assert!(!view.thread().find(&c).unwrap().liked);
}

#[tokio::test]
async fn late_answers_are_dropped_after_close() {
    let w = World::new();
    let mine = w.client(&w.me);
    let mut view = ThreadView::open(w.post, w.me.clone());

    let fetch = view.begin_fetch().unwrap();
    view.set_draft("sent right before leaving");
    let create = view.send_draft().unwrap();
    view.close();

    let created = mine
        .create_comment(create.post_id, create.content.clone(), create.parent_id)
        .await;
    assert!(!view.finish_create(create, created));
    let fetched = mine.fetch_comments(fetch.post_id).await;
    assert!(!view.finish_fetch(fetch, fetched));
    assert!(view.take_notices().is_empty());
    assert_eq!(w.server.test_num_comments(w.post), 1);
}

#[tokio::test]
async fn live_feed_delivers_other_users_comments() {
    let w = World::new();
    let mut feed = w.server.comment_feed(w.post);
    let theirs = w.client(&w.them);
    let mut view = ThreadView::open(w.post, w.me.clone());

    let mut other = ThreadView::open(w.post, w.them.clone());
    other.set_draft("first!");
    other.send(&theirs).await.unwrap();

    let pushed = feed.recv().await.unwrap();
    assert!(view.receive_remote(pushed.clone()));
    assert!(!view.receive_remote(pushed));
    assert_eq!(view.thread().roots()[0].content, "first!");
}

#[tokio::test]
async fn feed_and_follow() {
    let w = World::new();
    let mine = w.client(&w.me);
    let older = PostId(Uuid::new_v4());
    w.server
        .admin_add_post(
            w.them.id,
            single(older, "Under 1.5"),
            Utc::now() - Duration::days(1),
        )
        .unwrap();

    let mut feed = Feed::new();
    feed.refresh(&mine).await.unwrap();
    let ids = feed.posts().iter().map(|p| p.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![w.post, older]);

    feed.like(&mine, older).await.unwrap();
    feed.refresh(&mine).await.unwrap();
    let p = feed.find(&older).unwrap();
    assert_eq!((p.like_count, p.liked_by_current_user), (1, true));

    let mut follow = FollowButton::new(w.me.id, w.them.id);
    follow.load(&mine).await.unwrap();
    assert!(!follow.is_following());
    assert!(follow.toggle(&mine).await.unwrap());
    assert_eq!(follow.counts().followers, 1);
    follow.load(&mine).await.unwrap();
    assert!(follow.is_following());
    assert_eq!(follow.counts().followers, 1);
    assert!(!follow.toggle(&mine).await.unwrap());
    assert_eq!(follow.counts().followers, 0);

    let mut me = FollowButton::new(w.me.id, w.me.id);
    assert_eq!(me.toggle(&mine).await, Err(Error::CannotFollowSelf));
}

#[tokio::test]
async fn prediction_form_submission() {
    let w = World::new();
    let mine = w.client(&w.me);

    let mut form = PredictionForm::new();
    form.analysis = String::from("Both favourites at home");
    let first = form.legs()[0].id;
    let second = form.add_leg();
    let third = form.add_leg();
    for (leg, teams, odds) in [
        (first, "PSG vs OM", "1.45"),
        (second, "OL vs LOSC", "1.65"),
        (third, "RCL vs SRFC", "1,35"),
    ] {
        form.update_leg(leg, LegField::Teams, teams);
        form.update_leg(leg, LegField::Prediction, "home win");
        form.update_leg(leg, LegField::Odds, odds);
    }
    assert_eq!(form.combined_odds().to_string(), "3.23");

    let id = form.submit(&mine).await.unwrap();
    assert_eq!(form, PredictionForm::new());

    let mut feed = Feed::new();
    feed.refresh(&mine).await.unwrap();
    let post = feed.find(&id).unwrap();
    assert_eq!(post.author.id, w.me.id);
    assert!(matches!(
        post.prediction,
        Prediction::Combined { ref legs, total_odds } if legs.len() == 3 && total_odds == 3.23
    ));

    w.server.set_offline(true);
    let mut form = PredictionForm::new();
    form.analysis = String::from("Will not go through");
    let leg = form.legs()[0].id;
    form.update_leg(leg, LegField::Odds, "2");
    assert!(matches!(
        form.submit(&mine).await,
        Err(FormError::Rejected(Error::Unknown(_)))
    ));
    assert!(!form.is_submitting());
    assert_eq!(form.analysis, "Will not go through");
}
