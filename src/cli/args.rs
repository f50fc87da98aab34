//! Command-line arguments.
//!
//! Flags left unset fall back to the environment ([`crate::cli::init`]) and
//! then to the compiled-in defaults ([`crate::config`]).

use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::cli::init::{init_lgwin, init_nb_workers, init_quality};
use crate::cli::run::RunConfig;
use crate::config::LGBLOCK_DEFAULT;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "backref",
    version,
    about = "Parse files into insert/copy commands and report what was chosen"
)]
pub struct Cli {
    /// Parse quality: 0-9 greedy, 10-11 optimal [env: BACKREF_QUALITY]
    #[arg(short = 'q', long, value_parser = clap::value_parser!(i32).range(0..=11))]
    pub quality: Option<i32>,

    /// Window exponent; copies reach back at most 2^lgwin - 16 bytes [env: BACKREF_LGWIN]
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u32).range(10..=24))]
    pub lgwin: Option<u32>,

    /// Block exponent; each engine call covers 2^lgblock bytes
    #[arg(short = 'b', long, value_parser = clap::value_parser!(u32).range(16..=24))]
    pub lgblock: Option<u32>,

    /// Worker threads, 0 = one per CPU [env: BACKREF_NBWORKERS]
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// More diagnostics; repeat for more
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Replay the commands and check they rebuild each file
    #[arg(long)]
    pub verify: bool,

    /// Files or directories (walked recursively)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

impl Cli {
    /// Display level selected by `-v` / `--quiet`.
    pub fn display_level(&self) -> u32 {
        if self.quiet {
            1
        } else {
            (2 + self.verbose as u32).min(4)
        }
    }

    /// Resolve every option against the environment and defaults.
    pub fn into_config(self) -> RunConfig {
        RunConfig {
            quality: self.quality.unwrap_or_else(init_quality),
            lgwin: self.lgwin.unwrap_or_else(init_lgwin),
            lgblock: self.lgblock.unwrap_or(LGBLOCK_DEFAULT),
            nb_workers: self.threads.unwrap_or_else(init_nb_workers),
            verify: self.verify,
            inputs: self.paths,
        }
    }
}
