use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, Utc};
use pronos_client::{
    api::{self, Author, CommentId, Confidence, NewPost, PostId, Prediction, Sport, UserId, Uuid},
    time_ago, CombinedOdds, Feed, FollowButton, LegField, PredictionForm, SaveState, Thread,
    ThreadView,
};
use pronos_mock_server::MockServer;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "pronos_client=info,pronos_mock_server=info,pronos_ctl=info";

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Compute the combined odds of a set of legs
    Odds {
        /// Decimal odds of each leg, eg. 1.45 or 1,45
        #[structopt(required = true)]
        odds: Vec<String>,
    },

    /// Render a comment thread out of a JSON dump of flat comments
    Thread {
        /// File holding a JSON array of comments
        file: PathBuf,

        /// Hide the replies of this comment
        #[structopt(long)]
        collapse: Vec<Uuid>,

        /// Start with every comment collapsed
        #[structopt(long)]
        collapsed: bool,
    },

    /// Run a scripted session against an in-memory server
    Demo,
}

fn print_thread(thread: &Thread) {
    let now = Utc::now();
    for row in thread.render() {
        let c = row.comment;
        let hidden = match c.has_replies() && !c.expanded {
            true => format!(" [+{} replies]", row.reply_count()),
            false => String::new(),
        };
        let badge = c
            .author
            .badge
            .as_deref()
            .map(|b| format!(" [{b}]"))
            .unwrap_or_default();
        println!(
            "{}{}{} · {} · {} likes{}{}",
            row.prefix(),
            c.author.shown_name(),
            badge,
            time_ago(c.created_at, now),
            c.like_count,
            match c.state {
                SaveState::Saved => "",
                SaveState::Pending => " (sending)",
                SaveState::Failed => " (not sent)",
            },
            hidden,
        );
        let indent = " ".repeat(row.prefix().chars().count());
        for line in c.content.lines() {
            println!("{indent}  {line}");
        }
    }
}

fn odds(texts: &[String]) {
    for t in texts {
        match pronos_client::parse_odds(t) {
            Some(o) => println!("{t:>8} -> {o}"),
            None => println!("{t:>8} -> ignored"),
        }
    }
    let total = CombinedOdds::from_texts(texts.iter().map(|t| t.as_str()));
    println!("combined: {total}");
}

fn thread(file: PathBuf, collapse: Vec<Uuid>, collapsed: bool) -> anyhow::Result<()> {
    let data = std::fs::read(&file).with_context(|| format!("reading {file:?}"))?;
    let comments: Vec<api::Comment> =
        serde_json::from_slice(&data).with_context(|| format!("parsing {file:?} as comments"))?;
    let post = comments.first().map(|c| c.post_id).unwrap_or_else(PostId::stub);
    tracing::info!(?post, count = comments.len(), "loaded comment dump");

    let mut thread = Thread::from_flat(post, comments);
    thread.set_all_expanded(!collapsed);
    for id in collapse {
        let id = CommentId(id);
        if thread.find(&id).map(|c| c.expanded) == Some(true) {
            thread.toggle_expanded(&id);
        } else {
            tracing::warn!(comment=?id, "cannot collapse comment");
        }
    }
    print_thread(&thread);
    Ok(())
}

fn print_notices(view: &mut ThreadView) {
    for n in view.take_notices() {
        println!("  [{:?}] {}", n.level, n.message);
    }
}

async fn demo() -> anyhow::Result<()> {
    let server = MockServer::new();
    let me = Author::new(UserId(Uuid::new_v4()), String::from("@prono_king")).with_badge("Pro");
    let them = Author::new(UserId(Uuid::new_v4()), String::from("@football_fan"));
    server.admin_create_user(me.clone())?;
    server.admin_create_user(them.clone())?;

    let post = PostId(Uuid::new_v4());
    server.admin_add_post(
        them.id,
        NewPost {
            id: post,
            analysis: String::from("PSG at home, OM missing three starters"),
            confidence: Confidence::new(4)?,
            image_url: None,
            video_url: None,
            prediction: Prediction::Single {
                sport: Some(Sport::Football),
                match_teams: Some(String::from("PSG vs OM")),
                prediction_text: Some(String::from("PSG wins")),
                odds: 1.85,
            },
        },
        Utc::now() - Duration::hours(2),
    )?;

    let mine = server.connect(me.id)?;
    let theirs = server.connect(them.id)?;
    let mut feed = Feed::new();
    feed.refresh(&mine).await?;
    for p in feed.posts() {
        println!(
            "{} · {} · odds {:.2} · {}",
            p.author.shown_name(),
            p.confidence,
            p.prediction.odds(),
            p.analysis
        );
    }
    feed.like(&mine, post).await?;

    let mut view = ThreadView::open(post, me.clone());
    view.refresh(&mine).await;

    view.set_draft("Agreed, OM looks weak this season");
    view.send(&mine).await?;
    let root = view.thread().roots()[0].id;

    let mut theirs_view = ThreadView::open(post, them.clone());
    theirs_view.refresh(&theirs).await;
    theirs_view.set_reply_target(Some(root));
    theirs_view.set_draft("Careful, they won the last derby");
    theirs_view.send(&theirs).await?;

    view.refresh(&mine).await;
    let reply = view.thread().roots()[0].children[0].id;
    view.like(&mine, &reply).await;
    view.set_reply_target(Some(reply));
    view.set_draft("Different coach back then");
    view.send(&mine).await?;
    view.toggle_expanded(&root);

    println!();
    print_thread(view.thread());
    print_notices(&mut view);

    let mut follow = FollowButton::new(me.id, them.id);
    follow.load(&mine).await?;
    follow.toggle(&mine).await?;
    println!(
        "\n{}: {} ({} followers)",
        them.shown_name(),
        follow.label(),
        follow.counts().followers
    );

    let mut form = PredictionForm::new();
    form.analysis = String::from("Two home favourites");
    let first = form.legs()[0].id;
    let second = form.add_leg();
    for (leg, teams, odds) in [(first, "PSG vs OM", "1,45"), (second, "OL vs LOSC", "1.65")] {
        form.update_leg(leg, LegField::Teams, teams);
        form.update_leg(leg, LegField::Prediction, "home win");
        form.update_leg(leg, LegField::Odds, odds);
    }
    println!("\ncombined odds: {}", form.combined_odds());
    let id = form.submit(&mine).await?;
    tracing::info!(post=?id, "submitted combined prediction");

    server.set_offline(true);
    view.set_draft("This one will not make it");
    view.send(&mine).await?;
    println!();
    print_thread(view.thread());
    print_notices(&mut view);

    view.close();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let opt = <Opt as structopt::StructOpt>::from_args();

    match opt.cmd {
        Command::Odds { odds: texts } => odds(&texts),
        Command::Thread {
            file,
            collapse,
            collapsed,
        } => thread(file, collapse, collapsed)?,
        Command::Demo => demo().await?,
    }

    Ok(())
}
