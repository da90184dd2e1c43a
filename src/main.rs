use std::sync::Arc;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tuneflow::{
    art,
    cli::{self, ExtractOptions, PlaylistOptions},
    config::{self, Settings},
    error,
    management::FETCH_LOCK_TTL,
    playlist::PlaylistTarget,
    types::PkceToken,
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Run the TuneFlow HTTP API
    Serve,

    /// List the songs mentioned under a video
    Extract(ExtractArgs),

    /// Show the chapter markers of a video
    Chapters(ChaptersArgs),

    /// Create a playlist from the songs mentioned under a video
    Playlist(PlaylistArgs),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(clap::Args, Debug, Clone)]
pub struct SourceArgs {
    /// Only read pinned comments and stop once a tracklist is found
    #[clap(long)]
    pinned: bool,

    /// Also scan the video description
    #[clap(long)]
    description: bool,

    /// Read songs from the video's chapter markers instead of comments
    #[clap(long)]
    chapters: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ExtractArgs {
    /// YouTube URL or 11-character video id
    url: String,

    #[command(flatten)]
    source: SourceArgs,

    /// Wait for album art before printing
    #[clap(long)]
    art: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ChaptersArgs {
    /// YouTube URL or 11-character video id
    url: String,
}

#[derive(Parser, Debug, Clone)]
pub struct PlaylistArgs {
    /// YouTube URL or 11-character video id
    url: String,

    /// Playlist name (defaults to "<video title> Playlist")
    #[clap(long, conflicts_with = "ai_name")]
    name: Option<String>,

    /// Let the language model name the playlist
    #[clap(long)]
    ai_name: bool,

    /// Where to create the playlist
    #[clap(long, value_enum, default_value = "spotify")]
    target: PlaylistTarget,

    /// Create a private playlist (Spotify only)
    #[clap(long)]
    private: bool,

    #[command(flatten)]
    source: SourceArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();
    let settings = Arc::new(Settings::from_env());

    match &cli.command {
        Command::Serve => init_tracing("tuneflow=info"),
        _ => init_tracing("tuneflow=warn"),
    }

    match cli.command {
        Command::Auth => {
            let oauth_result: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
            cli::auth(settings, Arc::clone(&oauth_result)).await;
        }
        Command::Serve => cli::serve(settings).await,
        Command::Extract(args) => {
            let opts = ExtractOptions {
                pinned: args.source.pinned,
                description: args.source.description,
                chapters: args.source.chapters,
                art: args.art,
            };
            cli::extract(settings, &args.url, opts).await
        }
        Command::Chapters(args) => cli::chapters(&settings, &args.url).await,
        Command::Playlist(args) => {
            let opts = PlaylistOptions {
                name: args.name,
                ai_name: args.ai_name,
                target: args.target,
                private: args.private,
                extract: ExtractOptions {
                    pinned: args.source.pinned,
                    description: args.source.description,
                    chapters: args.source.chapters,
                    art: false,
                },
            };
            cli::playlist(settings, &args.url, opts).await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }

    art::finish_pending_fetches(FETCH_LOCK_TTL).await;
}
