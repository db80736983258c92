use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use contest_scraper::announce::{self, Announcement};
use contest_scraper::apis::SourceMode;
use contest_scraper::config::Config;
use contest_scraper::server::{self, AppState};
use contest_scraper::{build_cache, logging, metrics, Site};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "contest_scraper")]
#[command(about = "Upcoming AtCoder, Codeforces and CodeChef contests")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory for rotated JSON logs
    #[arg(long, global = true, default_value = "logs")]
    log_dir: PathBuf,

    /// Source adapters: html (scrape AtCoder) or clist (aggregator for everything)
    #[arg(long, global = true)]
    mode: Option<SourceMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum MessageFormat {
    Whatsapp,
    Facebook,
    Both,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the contest API over HTTP
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Refresh once and print the merged contest list
    Fetch {
        /// Only this platform
        #[arg(long)]
        site: Option<Site>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Ignore a fresh cache record
        #[arg(long)]
        force: bool,
    },
    /// Print copy-ready announcement text
    Announce {
        /// Only this platform
        #[arg(long)]
        site: Option<Site>,
        #[arg(long, value_enum, default_value = "both")]
        format: MessageFormat,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init_logging(&cli.log_dir);

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(mode) = cli.mode {
        config.aggregator.mode = mode;
    }
    let cache = Arc::new(build_cache(&config).context("building contest sources")?);

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            let state = AppState {
                cache,
                metrics: metrics::init_metrics(),
            };
            info!("Starting contest API on port {}", port);
            server::start_server(state, port).await?;
        }
        Commands::Fetch { site, json, force } => {
            let contests = if force { cache.refresh().await? } else { cache.get().await? };
            let contests = announce::filter_by_site(&contests, site);

            if json {
                println!("{}", serde_json::to_string_pretty(&contests)?);
            } else {
                for c in &contests {
                    let start = announce::StartParts::from_millis(c.start_time);
                    println!(
                        "{:<10} {} {} IST  {:<18}  {}  {}",
                        c.site.label(),
                        start.date_line(),
                        start.time,
                        announce::format_duration(c.duration),
                        c.title,
                        c.url
                    );
                }
                println!("\n{} upcoming contests", contests.len());
            }
        }
        Commands::Announce { site, format } => {
            let contests = cache.get().await?;
            for contest in announce::filter_by_site(&contests, site) {
                let a = Announcement::from(&contest);
                match format {
                    MessageFormat::Whatsapp => println!("{}\n", a.whatsapp),
                    MessageFormat::Facebook => println!("{}\n", a.facebook),
                    MessageFormat::Both => println!("{}\n\n{}\n\n---\n", a.whatsapp, a.facebook),
                }
            }
        }
    }

    Ok(())
}
