//! Command line front end for shuroku.
//!
//! Fetches a MangaDex title's catalog, lets the user pick a language and a
//! chapter range, then downloads every selected chapter as a CBZ, printing
//! progress as groups are tried and falling back between them.
//!
//! ```bash
//! cargo run --features cli -- https://mangadex.org/title/<id> --language en --start 1 --end 10
//! ```

use clap::Parser;
use color_eyre::{
    eyre::{Result, bail, eyre},
    install,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use shuroku::download::default_output_dir;
use shuroku::net::HttpClient;
use shuroku::prelude::*;
use shuroku::sources::MangaDexSource;

/// Download a MangaDex title chapter by chapter, falling back across
/// scanlation groups when a release cannot be fetched.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Title URL, e.g. https://mangadex.org/title/<id>/<slug>
    url: String,

    /// Translation language code; the available ones are listed when omitted
    #[arg(short, long)]
    language: Option<String>,

    /// First chapter to download (inclusive)
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Last chapter to download (inclusive)
    #[arg(long, requires = "start")]
    end: Option<String>,

    /// Image quality: `data` (original) or `data-saver`
    #[arg(short, long, default_value = "data")]
    quality: Quality,

    /// Output directory (default: downloads/<title>)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Debug logging for shuroku
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    install()?;
    let cli = Cli::parse();
    shuroku::logging::init(cli.verbose)?;

    // Everything the user typed is validated before the first request
    let work_id = MangaDexSource::parse_work_id(&cli.url)?;
    let range = match (&cli.start, &cli.end) {
        (Some(start), Some(end)) => Some(ChapterRange::parse(start, end)?),
        _ => None,
    };

    let source = Arc::new(MangaDexSource::new());
    let title = source.fetch_title(&work_id).await?;
    println!("Manga Title: {}", title);
    println!("Fetching chapters...");
    let records = fetch_catalog(source.as_ref(), &work_id).await?;

    let languages = available_languages(&records);
    let listed = languages.iter().cloned().collect::<Vec<_>>().join(", ");
    let Some(language) = cli.language else {
        println!("\nAvailable languages: {}", listed);
        bail!("choose a language with --language");
    };
    if !languages.contains(&language) {
        bail!("language '{}' not available (available: {})", language, listed);
    }

    let catalog = normalize(&records, &language);
    let chapters = catalog.keys().map(ToString::to_string).collect::<Vec<_>>();
    println!("\nAvailable chapters: {}", chapters.join(", "));

    let keys = match range {
        Some(range) => catalog.select(&range)?,
        None => catalog.keys().cloned().collect(),
    };
    if keys.is_empty() {
        return Err(eyre!("no chapters with a numeric chapter number in '{}'", language));
    }

    let output_dir = cli.out.unwrap_or_else(|| default_output_dir(&title));
    let acquisition = Acquisition::builder()
        .source(source)
        .fetcher(Arc::new(
            HttpClient::new("at-home")
                .with_rate_limit(0)
                .with_max_retries(2)
                .with_header("Referer", "https://mangadex.org/"),
        ))
        .output_dir(output_dir)
        .build()?;

    println!("\nAnalyzing scanlation groups...");
    let report = acquisition
        .run(&catalog, &keys, cli.quality, &|event: &ProgressEvent| {
            println!("{}", event)
        })
        .await;

    println!("\n{}", report);
    println!("Documents saved in: {}", acquisition.output_dir().display());

    Ok(if report.is_complete() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
