use std::time::Duration;

use anyhow::Context;
use snoo_client::{api::FullId, Client, Config, ListOptions, StreamConfig};

#[derive(structopt::StructOpt)]
struct Opt {
    /// Base URL of the API, defaults to SNOO_BASE_URL or the public API
    #[structopt(short, long)]
    host: Option<String>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// List the newest posts of a subreddit
    Listing {
        subreddit: String,

        #[structopt(short, long, default_value = "25")]
        limit: usize,

        /// Number of pages to walk
        #[structopt(short, long, default_value = "1")]
        pages: usize,
    },

    /// Print the comment tree of a post
    Comments {
        /// Post id, prefixed or not
        post: String,

        /// Expand every "more" placeholder
        #[structopt(short, long)]
        expand: bool,
    },

    /// Print new posts of a subreddit as they come
    StreamPosts {
        subreddit: String,

        /// Seconds between two polls
        #[structopt(short, long, default_value = "5")]
        interval: u64,

        /// Do not print the posts that already exist when starting
        #[structopt(short, long)]
        discard_initial: bool,
    },

    /// Print new comments of a subreddit as they come
    StreamComments {
        subreddit: String,

        /// Seconds between two polls
        #[structopt(short, long, default_value = "5")]
        interval: u64,

        /// Do not print the comments that already exist when starting
        #[structopt(short, long)]
        discard_initial: bool,
    },
}

fn config(host: Option<String>) -> anyhow::Result<Config> {
    let mut config = Config::from_env().context("reading configuration from environment")?;
    if let Some(host) = host {
        config = config.base_url(host);
    }
    if config.token.is_none() {
        tracing::warn!("SNOO_TOKEN is not set, sending unauthenticated requests");
    }
    Ok(config)
}

fn print_tree(tree: &snoo_client::CommentTree, id: &FullId, depth: usize) {
    for c in tree.replies(id) {
        println!("{:indent$}{} ({}): {}", "", c.author, c.score, c.body, indent = depth * 2);
        print_tree(tree, &c.full_id, depth + 1);
    }
    if let Some(more) = tree.more(id) {
        if !more.is_empty() {
            println!("{:indent$}[{} more]", "", more.count, indent = depth * 2);
        }
    }
}

/// Expands placeholders until none is left
async fn expand_all(client: &Client, tree: &mut snoo_client::CommentTree) -> anyhow::Result<()> {
    loop {
        let target = match std::iter::once(tree.root())
            .chain(tree.ids())
            .find(|id| tree.has_more(id))
        {
            Some(id) => id.clone(),
            None => return Ok(()),
        };
        tree.load_more(client, &target)
            .await
            .with_context(|| format!("expanding replies to {target}"))?;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = <Opt as structopt::StructOpt>::from_args();
    let client = Client::new(config(opt.host)?).context("building http client")?;

    match opt.cmd {
        Command::Listing {
            subreddit,
            limit,
            pages,
        } => {
            let mut pager = client
                .pages(
                    format!("r/{subreddit}/new"),
                    ListOptions::default().limit(limit),
                )
                .max_pages(pages);
            while let Some(page) = pager
                .next_page()
                .await
                .with_context(|| format!("listing posts of r/{subreddit}"))?
            {
                for p in page.posts() {
                    println!("{}\t{}\t{}", p.full_id, p.score, p.title);
                }
            }
        }
        Command::Comments { post, expand } => {
            let mut pc = client
                .post_and_comments(&post)
                .await
                .with_context(|| format!("fetching comments of {post}"))?;
            if expand {
                expand_all(&client, &mut pc.tree).await?;
            }
            println!("{} ({})", pc.post.title, pc.post.full_id);
            print_tree(&pc.tree, &pc.post.full_id, 1);
        }
        Command::StreamPosts {
            subreddit,
            interval,
            discard_initial,
        } => {
            let config = StreamConfig::default()
                .interval(Duration::from_secs(interval))
                .discard_initial(discard_initial);
            let (mut posts, mut errors, stop) = client.stream_posts(&subreddit, config);
            loop {
                tokio::select! {
                    Some(p) = posts.recv() => println!("{}\t{}", p.full_id, p.title),
                    Some(e) = errors.recv() => tracing::warn!(error = %e, "polling failed"),
                    _ = tokio::signal::ctrl_c() => break,
                    else => break,
                }
            }
            stop.stop();
        }
        Command::StreamComments {
            subreddit,
            interval,
            discard_initial,
        } => {
            let config = StreamConfig::default()
                .interval(Duration::from_secs(interval))
                .discard_initial(discard_initial);
            let (mut comments, mut errors, stop) = client.stream_comments(&subreddit, config);
            loop {
                tokio::select! {
                    Some(c) = comments.recv() => println!("{}\t{}: {}", c.full_id, c.author, c.body),
                    Some(e) = errors.recv() => tracing::warn!(error = %e, "polling failed"),
                    _ = tokio::signal::ctrl_c() => break,
                    else => break,
                }
            }
            stop.stop();
        }
    }

    Ok(())
}
