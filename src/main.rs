// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;
use url::Url;

use episode_loader::model::LOCAL_SOURCE_ID;
use episode_loader::{
    Anime, Bridge, DirectoryOracle, DirectoryOracleOptions, Episode, HttpSource,
    HttpSourceOptions, Link, LinkResolver, LocalDirectorySource, NoopReporter,
    RemoteFailurePolicy, ReqwestClient, ResolveEvent, ResolveReporter, ResolverOptions,
    SharedResolveReporter, Source,
};

// Emoji with fallback for terminals without Unicode support
static CLAPPER: Emoji<'_, '_> = Emoji("🎬 ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static DISK: Emoji<'_, '_> = Emoji("💾 ", "[d] ");
static PLAY: Emoji<'_, '_> = Emoji("▶️  ", "> ");

/// Resolve playable links for anime episodes
#[derive(Parser, Debug)]
#[command(name = "episode-loader")]
#[command(about = "Resolve playable links for anime episodes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding downloaded episodes
    #[arg(long, global = true, env = "EPISODE_LOADER_DOWNLOADS", default_value = "downloads")]
    downloads: PathBuf,

    /// Skip checksum verification of downloaded files
    #[arg(long, global = true)]
    no_verify: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the links for an episode
    Resolve(ResolveArgs),

    /// Report whether an episode is downloaded
    Status(EpisodeArgs),
}

#[derive(Args, Debug)]
struct EpisodeArgs {
    /// Title of the series
    anime: String,

    /// Source-relative episode URL (a path under the library for local episodes)
    episode_url: String,

    /// Episode display name (defaults to the URL)
    #[arg(long)]
    name: Option<String>,

    /// Episode number
    #[arg(short = 'n', long, default_value = "-1", allow_negative_numbers = true)]
    number: f32,

    /// Id of the source the series comes from
    #[arg(long, default_value = "1")]
    source_id: i64,

    /// Which kind of source serves the episode
    #[arg(short, long, value_enum, default_value = "remote")]
    source: SourceKind,
}

#[derive(Args, Debug)]
struct ResolveArgs {
    #[command(flatten)]
    episode: EpisodeArgs,

    /// Base URL of the remote link API
    #[arg(long, env = "EPISODE_LOADER_REMOTE_URL")]
    remote_url: Option<Url>,

    /// Root of the local library
    #[arg(long, env = "EPISODE_LOADER_LIBRARY", default_value = "library")]
    library: PathBuf,

    /// Remote request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Only resolve the preferred link
    #[arg(long)]
    first: bool,

    /// Treat remote failures as "no links" instead of an error
    #[arg(long)]
    swallow_remote_errors: bool,

    /// Print links as JSON
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SourceKind {
    Remote,
    Local,
    Other,
}

/// Reporter driving a terminal spinner
struct SpinnerReporter {
    bar: ProgressBar,
}

impl SpinnerReporter {
    fn new() -> Self {
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }
}

impl ResolveReporter for SpinnerReporter {
    fn report(&self, event: ResolveEvent) {
        match event {
            ResolveEvent::OracleConsulted {
                episode,
                downloaded,
            } => {
                let state = if downloaded {
                    "downloaded".green()
                } else {
                    "not downloaded".yellow()
                };
                self.bar
                    .set_message(format!("{DISK}{} is {}", episode.bold(), state));
            }

            ResolveEvent::BackendSelected {
                backend, source, ..
            } => {
                self.bar.set_message(format!(
                    "{SEARCH}Resolving via {} ({})",
                    backend.to_string().cyan(),
                    source
                ));
            }

            ResolveEvent::BackendFailed {
                backend, error, ..
            } => {
                self.bar.println(format!(
                    "  {FAILURE}{} failed: {}",
                    backend.to_string().red(),
                    error.dimmed()
                ));
            }

            ResolveEvent::LinksResolved { .. } | ResolveEvent::PlaceholderReturned { .. } => {
                self.bar.finish_and_clear();
            }
        }
    }
}

impl Drop for SpinnerReporter {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

impl EpisodeArgs {
    /// Local series are always filed under the local source id
    fn series_source_id(&self) -> i64 {
        match self.source {
            SourceKind::Local => LOCAL_SOURCE_ID,
            _ => self.source_id,
        }
    }

    fn anime(&self) -> Anime {
        Anime {
            id: 0,
            source_id: self.series_source_id(),
            title: self.anime.clone(),
            url: String::new(),
        }
    }

    fn episode(&self) -> Episode {
        Episode {
            id: 0,
            anime_id: 0,
            url: self.episode_url.clone(),
            name: self.name.clone().unwrap_or_else(|| self.episode_url.clone()),
            episode_number: self.number,
            date_upload: None,
            scanlator: None,
        }
    }
}

fn build_source(args: &ResolveArgs) -> Result<Source> {
    let source = match args.episode.source {
        SourceKind::Remote => {
            let Some(base_url) = args.remote_url.clone() else {
                bail!("--remote-url is required for remote sources");
            };
            let client = ReqwestClient::with_timeout(Duration::from_secs(args.timeout))
                .context("Failed to build HTTP client")?;
            let options = HttpSourceOptions::new(args.episode.source_id, "Remote", base_url);
            Source::remote(HttpSource::new(client, options))
        }
        SourceKind::Local => Source::local(LocalDirectorySource::new(&args.library)),
        SourceKind::Other => Source::unsupported(args.episode.source_id, "Unknown"),
    };

    Ok(source)
}

fn print_links(links: &[Link], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(links)?);
        return Ok(());
    }

    for link in links {
        println!("  {PLAY}{} {}", link.tag.bold().green(), link.url.cyan());
    }

    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let oracle = DirectoryOracle::with_options(
        &cli.downloads,
        DirectoryOracleOptions {
            verify_checksums: !cli.no_verify,
        },
    );

    match cli.command {
        Command::Status(args) => {
            let resolver =
                LinkResolver::new(Arc::new(oracle), Bridge::new(runtime.handle().clone()));
            let downloaded =
                resolver.is_already_resolved(&args.episode(), &args.anime());

            if downloaded {
                println!("{SUCCESS}{}", "downloaded".green().bold());
            } else {
                println!("{FAILURE}{}", "not downloaded".yellow().bold());
                std::process::exit(1);
            }
        }

        Command::Resolve(args) => {
            if !cli.quiet && !args.json {
                println!(
                    "\n{}{} {}\n",
                    CLAPPER,
                    "episode-loader".bold().magenta(),
                    "- Episode Link Resolver".dimmed()
                );
            }

            let source = build_source(&args)?;
            let reporter: SharedResolveReporter = if cli.quiet || args.json {
                NoopReporter::shared()
            } else {
                Arc::new(SpinnerReporter::new())
            };
            let anime = args.episode.anime();
            let episode = args.episode.episode();

            let options = ResolverOptions {
                remote_failures: if args.swallow_remote_errors {
                    RemoteFailurePolicy::Swallow
                } else {
                    RemoteFailurePolicy::Propagate
                },
            };

            let resolver =
                LinkResolver::new(Arc::new(oracle), Bridge::new(runtime.handle().clone()))
                    .with_options(options)
                    .with_reporter(reporter);

            let links = if args.first {
                resolver
                    .resolve_first(&episode, &anime, &source)
                    .context("Failed to resolve link")?
                    .into_iter()
                    .collect::<Vec<_>>()
            } else {
                resolver
                    .resolve_all(&episode, &anime, &source)
                    .context("Failed to resolve links")?
            };

            drop(resolver);

            if links.is_empty() {
                if !args.json {
                    println!("{FAILURE}{}", "No playable links found".red().bold());
                }
                std::process::exit(1);
            }

            print_links(&links, args.json)?;
        }
    }

    Ok(())
}
