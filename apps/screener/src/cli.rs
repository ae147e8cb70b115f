use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "screener", version, about = "Verify and rank job applicants against a job description")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
    /// TOML config file (defaults to ./screener.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Debug-level logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Cmd {
    /// Screen a candidate export and write a Markdown report
    Screen {
        /// Workable-style CSV export
        #[arg(long)]
        csv: PathBuf,
        /// Job description file (Markdown or plain text)
        #[arg(long)]
        jd: PathBuf,
        /// Report path (defaults to <output_dir>/report_<timestamp>.md)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Serve the screening API over HTTP
    Serve {
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
}
