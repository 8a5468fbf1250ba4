use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "mirrorcat: concatenate a package mirror into one text corpus", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LineEndingArg {
    Lf,
    Crlf,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LineCountArg {
    Output,
    Body,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the corpus from every archive under ROOT
    Build {
        root: PathBuf,

        /// write the corpus here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// JSON pipeline config; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        /// worker threads (1 = sequential)
        #[arg(long)]
        parallelism: Option<usize>,

        /// members above this many bytes are skipped
        #[arg(long = "max-member-size")]
        max_member_size: Option<u64>,

        /// delimiter template containing {path}, or hash|slash|dash|plain
        #[arg(long = "comment-style")]
        comment_style: Option<String>,

        #[arg(long = "line-ending", value_enum)]
        line_ending: Option<LineEndingArg>,

        /// what the [N lines] header counts
        #[arg(long = "line-count", value_enum)]
        line_count: Option<LineCountArg>,

        /// first segment of every record path
        #[arg(long)]
        prefix: Option<String>,

        /// directory levels to search for archives
        #[arg(long)]
        depth: Option<usize>,

        /// order archives by file name instead of listing order
        #[arg(long)]
        sort: bool,

        /// also write the run report as JSON
        #[arg(long = "report-json")]
        report_json: Option<PathBuf>,
    },

    /// List the archives a build would process
    Scan {
        root: PathBuf,
        #[arg(long)]
        depth: Option<usize>,
        #[arg(long)]
        sort: bool,
    },

    /// List one archive's members with their acceptance decision
    List {
        archive: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
