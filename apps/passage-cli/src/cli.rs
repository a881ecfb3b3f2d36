use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "passage", about = "Chunk, index and hybrid-search plain-text corpora")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG wins when set
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load and segment a directory, printing the resulting chunks
    Chunks(ChunksArgs),
    /// Rebuild the configured collection from a directory
    Ingest(IngestArgs),
    /// Rank passages for a query
    Search(SearchArgs),
}

#[derive(Debug, Args)]
pub struct ChunksArgs {
    /// Directory of .txt files (defaults to data.raw_txt_dir)
    pub dir: Option<PathBuf>,
    /// Emit one JSON object per chunk
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Directory of .txt files (defaults to data.raw_txt_dir)
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,
    /// Corpus to ingest first when the collection lives in memory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    /// Number of results (defaults to search.default_k)
    #[arg(short)]
    pub k: Option<usize>,
    /// Exact-match metadata filter, repeatable
    #[arg(long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
    pub filters: Vec<(String, String)>,
    /// Semantic weight in [0, 1] (defaults to search.alpha)
    #[arg(long)]
    pub alpha: Option<f32>,
    /// Emit one JSON object per result
    #[arg(long)]
    pub json: bool,
}

pub fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
