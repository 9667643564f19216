//! CLI argument definitions using clap derive macros.

use clap::Parser;

/// Find installer ISO and torrent links for Linux distributions and Windows.
///
/// Queries official vendor sites, torrent indexes and the Internet Archive
/// concurrently, then prints deduplicated links ordered by source trust.
#[derive(Parser, Debug)]
#[command(name = "iso-search")]
#[command(author, version, about)]
pub struct Args {
    /// Search words, e.g. `ubuntu 24.04` or `windows 10`
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Keep only links whose URL names this release (e.g. 24.04, 40, vista)
    #[arg(short = 'R', long, value_name = "VERSION")]
    pub release: Option<String>,

    /// Keep only links for this architecture (e.g. x86_64, i386, aarch64)
    #[arg(short = 'a', long, value_name = "ARCH")]
    pub arch: Option<String>,

    /// Print results as a JSON array instead of text lines
    #[arg(long)]
    pub json: bool,

    /// Request timeout for every source in seconds (1-300), overrides config
    #[arg(short = 't', long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=300))]
    pub timeout: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Positional words joined into one query string.
    #[must_use]
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }
}
