use anyhow::Context;
use hustings_client::{
    api::{Backend, CommentId, PostId, ReplyId, UserId, UserType, Uuid},
    resolve_from_profiles, CommentFeed, FeedConfig, HttpBackend, Identity, PendingMutation,
    PollVerdict, Settled,
};

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long, env = "HUSTINGS_HOST")]
    host: String,

    /// Bearer token of the session to act as
    #[structopt(long, env = "HUSTINGS_TOKEN")]
    token: Option<String>,

    /// User id to author comments as
    #[structopt(long, env = "HUSTINGS_USER")]
    user: Option<Uuid>,

    /// Author comments as an admin rather than a student
    #[structopt(long)]
    admin: bool,

    /// Seconds between two reconciling fetches when watching
    #[structopt(long, default_value = "5")]
    poll_secs: u64,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Follow the comments of a post until interrupted
    Watch { post: String },

    /// Comment on a post
    Comment { post: String, content: String },

    /// Reply to a comment
    Reply {
        post: String,
        comment: String,
        content: String,
    },

    EditComment {
        post: String,
        comment: String,
        content: String,
    },

    EditReply {
        post: String,
        reply: String,
        content: String,
    },

    DeleteComment { post: String, comment: String },

    DeleteReply { post: String, reply: String },
}

impl Command {
    fn post(&self) -> PostId {
        match self {
            Command::Watch { post }
            | Command::Comment { post, .. }
            | Command::Reply { post, .. }
            | Command::EditComment { post, .. }
            | Command::EditReply { post, .. }
            | Command::DeleteComment { post, .. }
            | Command::DeleteReply { post, .. } => PostId(post.clone()),
        }
    }
}

fn print_comments(feed: &CommentFeed) {
    for c in feed.comments() {
        println!(
            "[{}] {} ({}) {}: {}",
            c.id,
            c.author.display_name,
            role(c.user_type),
            c.created_at.format("%Y-%m-%d %H:%M"),
            c.content
        );
        for r in c.replies.iter() {
            println!(
                "    [{}] {} {}: {}",
                r.id,
                r.author.display_name,
                r.created_at.format("%Y-%m-%d %H:%M"),
                r.content
            );
        }
    }
}

fn role(t: UserType) -> &'static str {
    match t {
        UserType::Student => "student",
        UserType::Admin => "admin",
    }
}

async fn identity(backend: &HttpBackend, opt: &Opt) -> anyhow::Result<Identity> {
    let user = UserId(opt.user.context("writing requires --user or HUSTINGS_USER")?);
    Ok(Identity {
        user_id: user,
        user_type: if opt.admin {
            UserType::Admin
        } else {
            UserType::Student
        },
        author: resolve_from_profiles(backend, user).await,
    })
}

async fn load(feed: &mut CommentFeed, backend: &HttpBackend, post: &PostId) -> anyhow::Result<()> {
    let res = backend.fetch_comments(post).await;
    if let Err(err) = &res {
        tracing::warn!(?post, ?err, "failed fetching comments");
        anyhow::bail!("fetching comments of {post}: {err}");
    }
    feed.on_loaded(post, res);
    Ok(())
}

fn poll_period(secs: u64) -> anyhow::Result<chrono::Duration> {
    anyhow::ensure!(secs > 0, "--poll-secs must be at least 1");
    let secs = i64::try_from(secs).context("--poll-secs is too large")?;
    Ok(chrono::Duration::seconds(secs))
}

async fn watch(feed: &mut CommentFeed, backend: &HttpBackend, post: PostId) -> anyhow::Result<()> {
    load(feed, backend, &post).await?;
    print_comments(feed);
    let period = feed
        .config()
        .poll_interval
        .to_std()
        .context("poll interval must be positive")?;
    anyhow::ensure!(!period.is_zero(), "poll interval must be positive");
    let mut ticks = tokio::time::interval(period);
    // the first tick fires at once
    ticks.tick().await;
    loop {
        tokio::select! {
            _ = ticks.tick() => {
                if feed.should_poll(&post) {
                    let res = backend.fetch_comments(&post).await;
                    match feed.on_polled(&post, res, chrono::Utc::now()) {
                        None => tracing::debug!(?post, "poll skipped or failed"),
                        Some(PollVerdict::Quiet) => tracing::trace!(?post, "quiet poll"),
                        Some(verdict) => {
                            tracing::info!(?post, ?verdict, "comments changed");
                            let t = chrono::Utc::now().format("%H:%M:%S");
                            println!("--- {verdict:?} at {t}");
                            print_comments(feed);
                        }
                    }
                }
            }
            res = tokio::signal::ctrl_c() => {
                res.context("listening for ctrl-c")?;
                tracing::info!(?post, "stopped watching");
                feed.close();
                return Ok(());
            }
        }
    }
}

async fn write(
    feed: &mut CommentFeed,
    backend: &HttpBackend,
    post: PostId,
    cmd: Command,
) -> anyhow::Result<()> {
    load(feed, backend, &post).await?;
    let now = chrono::Utc::now();
    let pending: PendingMutation = match cmd {
        Command::Watch { .. } => anyhow::bail!("watch does not write"),
        Command::Comment { content, .. } => {
            feed.set_comment_input(content);
            feed.submit_comment(now)?
        }
        Command::Reply {
            comment, content, ..
        } => {
            let comment = CommentId(comment);
            feed.set_reply_input(comment.clone(), content);
            feed.submit_reply(&comment, now)?
        }
        Command::EditComment {
            comment, content, ..
        } => feed.edit_comment(&CommentId(comment), content, now)?,
        Command::EditReply { reply, content, .. } => {
            feed.edit_reply(&ReplyId(reply), content, now)?
        }
        Command::DeleteComment { comment, .. } => feed.delete_comment(&CommentId(comment), now)?,
        Command::DeleteReply { reply, .. } => feed.delete_reply(&ReplyId(reply), now)?,
    };
    let res = pending.send(backend).await;
    let settled = feed
        .settle(pending, res, chrono::Utc::now())
        .context("comments panel closed while writing")?;
    tracing::debug!(?post, ?settled, "write settled");
    if settled.needs_refetch() {
        load(feed, backend, &post).await?;
    }
    match settled {
        Settled::Confirmed | Settled::Refetch => {
            print_comments(feed);
            Ok(())
        }
        Settled::RolledBack { message, .. } => Err(anyhow::anyhow!("write rejected: {message}")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let opt = <Opt as structopt::StructOpt>::from_args();

    let backend = HttpBackend::new(opt.host.clone(), opt.token.clone());
    let mut config = FeedConfig::default();
    config.poll_interval = poll_period(opt.poll_secs)?;

    let post = opt.cmd.post();
    let mut feed = match &opt.cmd {
        Command::Watch { .. } => CommentFeed::new(config, None),
        _ => CommentFeed::new(config, Some(identity(&backend, &opt).await?)),
    };
    feed.open(post.clone());

    match opt.cmd {
        Command::Watch { .. } => watch(&mut feed, &backend, post).await,
        cmd => write(&mut feed, &backend, post, cmd).await,
    }
}
