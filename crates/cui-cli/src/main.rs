//! cui - terminal console for a conversation backend

mod auth;
mod bootstrap;
mod config;
mod home;
mod list;

use std::io;
use std::sync::Arc;

use clap::Parser;
use cui_api::{
    ApiClient, ClientConfig, ConversationBackend, DEFAULT_PAGE_SIZE, PermissionMode,
    StartConversationRequest,
};
use cui_feed::{FeedStore, Tab, recent_working_directory};
use cui_tui::Theme;

use crate::bootstrap::{CliOverrides, ServerSettings};

const RECENT_DIRECTORIES: usize = 10;

/// cui - browse and start conversations from the terminal
#[derive(Parser, Debug)]
#[command(name = "cui")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend port (overrides PORT)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Backend host (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Auth token (overrides AUTH_TOKEN and the stored token)
    #[arg(long)]
    token: Option<String>,

    /// Talk to the backend without a token
    #[arg(long)]
    skip_auth_token: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// Store the token from a login URL (http://host:port/#token=...)
    #[arg(long, value_name = "URL")]
    login: Option<String>,

    /// Remove the stored token
    #[arg(long)]
    logout: bool,

    /// Print conversations instead of opening the console
    #[arg(short, long)]
    list: bool,

    /// Tab to show (tasks, history, archive)
    #[arg(short, long, default_value = "tasks")]
    tab: Tab,

    /// With --list, follow the cursor through every page
    #[arg(long)]
    all: bool,

    /// Print recently used working directories
    #[arg(long)]
    dirs: bool,

    /// Start a new conversation with this prompt
    #[arg(short, long)]
    prompt: Option<String>,

    /// Working directory for --prompt (default: most recently used)
    #[arg(short, long)]
    dir: Option<String>,

    /// Model for --prompt ("default" lets the backend choose)
    #[arg(short, long)]
    model: Option<String>,

    /// Permission mode for --prompt (default, acceptEdits, bypassPermissions, plan)
    #[arg(long)]
    permission_mode: Option<String>,

    /// Color theme (dark, light)
    #[arg(long)]
    theme: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("cui=debug,cui_api=debug,cui_feed=debug")
            .with_writer(io::stderr)
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let tokens = auth::TokenStore::open_default();

    if let Some(url) = args.login.as_deref() {
        let token = auth::token_from_url(url)?;
        tokens.save(&token)?;
        println!("Token saved to {}", tokens.path().display());
        return Ok(());
    }

    if args.logout {
        if tokens.remove()? {
            println!("Stored token removed");
        } else {
            println!("No stored token");
        }
        return Ok(());
    }

    let cfg = config::Config::load();
    let cli = CliOverrides {
        host: args.host.clone(),
        port: args.port,
        token: args.token.clone(),
        skip_auth_token: args.skip_auth_token,
    };
    let mut settings = ServerSettings::resolve(&cli, |key| std::env::var(key).ok(), &cfg);
    if settings.token.is_none() {
        settings.token = tokens.load();
    }
    for line in settings.banner() {
        tracing::info!("{}", line);
    }

    let client = ApiClient::new(
        ClientConfig::for_host(&settings.host, settings.port)
            .with_token(settings.bearer().map(str::to_string))
            .with_page_size(cfg.page_size.unwrap_or(DEFAULT_PAGE_SIZE)),
    )?;
    let backend: Arc<dyn ConversationBackend> = Arc::new(client);

    if let Some(prompt) = args.prompt.as_deref() {
        return start_conversation(backend, &args, prompt).await;
    }

    if args.dirs {
        let store = FeedStore::new(backend);
        for dir in list::directories(&store, RECENT_DIRECTORIES).await? {
            println!("{}", dir);
        }
        return Ok(());
    }

    if args.list {
        let store = FeedStore::new(backend);
        let rows = list::collect(&store, args.tab, args.all).await?;
        list::write_rows(&mut io::stdout().lock(), &rows, chrono::Utc::now())?;
        return Ok(());
    }

    let theme = args
        .theme
        .as_deref()
        .or(cfg.theme.as_deref())
        .and_then(Theme::from_name)
        .unwrap_or_default();
    home::run(backend, args.tab, theme).await
}

async fn start_conversation(
    backend: Arc<dyn ConversationBackend>,
    args: &Args,
    prompt: &str,
) -> anyhow::Result<()> {
    let dir = match args.dir.clone() {
        Some(dir) => dir,
        None => default_directory(&backend).await?,
    };

    let permission_mode = args.permission_mode.as_deref().and_then(|mode| {
        let parsed = PermissionMode::parse(mode);
        if parsed.is_none() && mode != "default" {
            tracing::warn!("Unknown permission mode {:?}, using the backend default", mode);
        }
        parsed
    });

    let request = StartConversationRequest::new(dir, prompt)
        .with_model(args.model.as_deref())
        .with_permission_mode(permission_mode);
    let response = backend.start_conversation(&request).await?;

    println!("Started conversation {}", response.session_id);
    if let Some(streaming_id) = response.streaming_id {
        println!("Streaming id: {}", streaming_id);
    }
    Ok(())
}

/// Most recently used project path, falling back to the current directory
async fn default_directory(backend: &Arc<dyn ConversationBackend>) -> anyhow::Result<String> {
    let store = FeedStore::new(Arc::clone(backend));
    store.set_filter(Tab::Tasks.filter()).await;
    if let Some(dir) = recent_working_directory(&store.snapshot()) {
        return Ok(dir.to_string());
    }
    Ok(std::env::current_dir()?.display().to_string())
}
