use chrono::{Duration, Utc};
use pronos_api::{Author, Comment, CommentId, PostId, UserId, Uuid};
use rand::{seq::SliceRandom, Rng};

const NUM_USERS: usize = 8;
const NUM_COMMENTS: usize = 60;

// Probability for a comment to answer an earlier one
const REPLY_PROBABILITY: f64 = 0.6;

const MAX_COMMENT_WORDS: usize = 30;
const MAX_LIKES: u64 = 40;
const MAX_AGE_HOURS: i64 = 24 * 10;

fn gen_author(rng: &mut impl Rng) -> Author {
    let name = lipsum::lipsum_words(1).to_lowercase();
    let name = name.trim_matches(|c: char| !c.is_alphanumeric());
    let a = Author::new(
        UserId(Uuid::new_v4()),
        format!("@{name}_{}", rng.gen_range(1..100)),
    );
    match rng.gen_bool(0.2) {
        true => a.with_badge("Pro"),
        false => a,
    }
}

fn main() {
    let mut rng = rand::thread_rng();
    let users = (0..NUM_USERS)
        .map(|_| gen_author(&mut rng))
        .collect::<Vec<_>>();
    let post_id = PostId(Uuid::new_v4());

    // Generate in chronological order, so that replies come after their parent
    let mut offsets = (0..NUM_COMMENTS)
        .map(|_| rng.gen_range(0..MAX_AGE_HOURS * 60))
        .collect::<Vec<_>>();
    offsets.sort_unstable_by(|a, b| b.cmp(a));
    let now = Utc::now();

    let mut comments: Vec<Comment> = Vec::with_capacity(NUM_COMMENTS);
    for minutes_ago in offsets {
        let parent_id = match comments.is_empty() || !rng.gen_bool(REPLY_PROBABILITY) {
            true => None,
            false => comments.choose(&mut rng).map(|c| c.id),
        };
        comments.push(Comment {
            id: CommentId(Uuid::new_v4()),
            post_id,
            author: users.choose(&mut rng).unwrap().clone(),
            content: lipsum::lipsum_words(rng.gen_range(3..MAX_COMMENT_WORDS)),
            created_at: now - Duration::minutes(minutes_ago),
            like_count: rng.gen_range(0..MAX_LIKES),
            liked_by_current_user: rng.gen_bool(0.1),
            parent_id,
        });
    }

    // Shuffle, so that loading the dump has to put the tree back together
    comments.shuffle(&mut rng);
    println!(
        "{}",
        serde_json::to_string_pretty(&comments).expect("serializing comments")
    );
}
