//! Spiro CLI: the main entry point.
//!
//! Commands:
//! - `serve`: Start the HTTP gateway
//! - `list`: Print one comment page as JSON
//! - `seed`: Insert sample comments
//! - `config`: Print the default configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "spiro",
    about = "Spiro: paginated two-level article comments",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch one page of an article's comments
    List {
        #[arg(long)]
        article_id: u64,

        /// Primary comments to skip
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        offset: i64,

        /// Primary comments per page
        #[arg(long, allow_negative_numbers = true)]
        count: i64,

        /// Replies per primary comment (defaults to pagination.default_sub_comment_count)
        #[arg(long, allow_negative_numbers = true)]
        sub_count: Option<i64>,
    },

    /// Insert sample comments for an article
    Seed {
        #[arg(long)]
        article_id: u64,

        #[arg(long, default_value_t = 5)]
        primaries: usize,

        /// Replies under each primary comment
        #[arg(long, default_value_t = 3)]
        replies: usize,
    },

    /// Print the default configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::List {
            article_id,
            offset,
            count,
            sub_count,
        } => commands::list::run(article_id, offset, count, sub_count).await?,
        Commands::Seed {
            article_id,
            primaries,
            replies,
        } => commands::seed::run(article_id, primaries, replies).await?,
        Commands::Config => commands::config_cmd::run(),
    }

    Ok(())
}
