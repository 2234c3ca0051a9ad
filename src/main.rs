use clap::{
    ArgAction, CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};
use tracing_subscriber::EnvFilter;

use songify::{
    cli, config, error,
    spotify::search::{DEFAULT_SEARCH_LIMIT, DEFAULT_SEARCH_TYPES},
    types::SearchType,
    utils::DEFAULT_PAGE_LIMIT,
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
    /// Log in with Spotify through the browser
    Login,

    /// Forget all stored credentials
    Logout,

    /// Show stored credentials and whether they are still valid
    Status,

    /// Exchange the refresh token for a new access token
    Refresh,

    /// Show the profile of the logged in user
    Profile,

    /// List your playlists
    Playlists(PlaylistsOptions),

    /// Search tracks, albums, artists and playlists
    Search(SearchOptions),

    /// Run the token-exchange server
    Serve,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct PlaylistsOptions {
    /// Playlists per page (1-50)
    #[clap(long, default_value_t = DEFAULT_PAGE_LIMIT, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub limit: u32,

    /// Index of the first playlist
    #[clap(long, default_value_t = 0)]
    pub offset: u32,

    /// Keep fetching until every page is loaded
    #[clap(long)]
    pub all: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// Search query
    pub query: String,

    /// Item type(s) to search for; can be repeated
    #[clap(long = "type", value_enum, action = ArgAction::Append, num_args = 1)]
    pub types: Vec<SearchType>,

    /// Maximum number of results per type
    #[clap(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
    pub limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command_for_update();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let settings = match config::Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => error!("{}", e),
    };

    match cli.command {
        Command::Login => cli::login(settings).await,
        Command::Logout => cli::logout(settings).await,
        Command::Status => cli::status(settings).await,
        Command::Refresh => cli::refresh(settings).await,
        Command::Profile => cli::profile(settings).await,
        Command::Playlists(opt) => cli::playlists(settings, opt.limit, opt.offset, opt.all).await,
        Command::Search(opt) => {
            let types = if opt.types.is_empty() {
                DEFAULT_SEARCH_TYPES.to_vec()
            } else {
                opt.types
            };
            cli::search(settings, opt.query, types, opt.limit).await
        }
        Command::Serve => cli::serve(settings).await,
        Command::Completions(_) => {}
    }
}
