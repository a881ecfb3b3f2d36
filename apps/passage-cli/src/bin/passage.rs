use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use passage_cli::cli::{ChunksArgs, Cli, Command, IngestArgs, SearchArgs};
use passage_cli::{build_filter, corpus_dir, format_hit, ingest, load_chunks, open_index};
use passage_core::config::{BackendKind, Config, Settings};

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("info"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let settings = Config::load().and_then(|c| c.settings()).context("loading configuration")?;
    match cli.command {
        Command::Chunks(args) => chunks(&settings, args),
        Command::Ingest(args) => run_ingest(&settings, args),
        Command::Search(args) => search(settings, args),
    }
}

fn chunks(settings: &Settings, args: ChunksArgs) -> Result<()> {
    let dir = corpus_dir(settings, args.dir.as_deref());
    for chunk in load_chunks(settings, &dir)? {
        if args.json {
            println!("{}", serde_json::to_string(&chunk)?);
        } else {
            println!("{}\t{}", chunk.id, chunk.text.chars().count());
        }
    }
    Ok(())
}

fn run_ingest(settings: &Settings, args: IngestArgs) -> Result<()> {
    let dir = corpus_dir(settings, args.dir.as_deref());
    if settings.index.backend == BackendKind::Memory {
        tracing::warn!("memory collection is not persisted; `search` re-ingests on every run");
    }
    let index = open_index(settings)?;
    let count = ingest(&index, settings, &dir)?;
    println!("Ingested {count} chunks from {} into '{}'", dir.display(), settings.index.collection);
    Ok(())
}

fn search(mut settings: Settings, args: SearchArgs) -> Result<()> {
    if let Some(alpha) = args.alpha {
        settings.search.alpha = alpha;
    }
    let k = args.k.unwrap_or(settings.search.default_k);
    let index = open_index(&settings)?;
    if settings.index.backend == BackendKind::Memory {
        let dir = corpus_dir(&settings, args.data_dir.as_deref());
        ingest(&index, &settings, &dir)?;
    }
    let hits = index.search(&args.query, k, &build_filter(&args.filters))?;
    if hits.is_empty() && !args.json {
        println!("No results for '{}'", args.query);
    }
    for (i, hit) in hits.iter().enumerate() {
        if args.json {
            println!("{}", serde_json::to_string(hit)?);
        } else {
            println!("{}", format_hit(i + 1, hit));
        }
    }
    Ok(())
}
