//! Per-file analysis driver.
//!
//! Each input file is read whole and fed through the engine in blocks of
//! `2^lgblock` bytes, one [`BackwardReferencesContext`] and one
//! [`StreamState`] per file.  Files are processed in parallel on a rayon
//! pool; results are printed in input order once all files are done.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context};
use rayon::prelude::*;

use crate::backref::{
    create_backward_references, BackrefParams, BackwardReferencesContext, Command, Hashers,
    InputBlock, RingBuffer, StreamState,
};
use crate::cli::file_list::create_file_list;
use crate::cli::replay::verify_commands;
use crate::{displaylevel, displayout};

/// Fully resolved CLI options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub quality: i32,
    pub lgwin: u32,
    pub lgblock: u32,
    /// 0 = one worker per logical CPU.
    pub nb_workers: usize,
    pub verify: bool,
    pub inputs: Vec<PathBuf>,
}

/// What the parse of one file produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileStats {
    pub bytes: usize,
    pub commands: usize,
    pub copies: usize,
    pub literals: usize,
    /// Copies whose distance was sent through the distance cache.
    pub cache_copies: usize,
    /// Content digest, present when the parse was verified.
    pub digest: Option<u64>,
}

impl FileStats {
    fn from_commands(bytes: usize, commands: &[Command], literals: usize) -> Self {
        FileStats {
            bytes,
            commands: commands.len(),
            copies: commands.iter().filter(|c| !c.is_insert_only()).count(),
            literals,
            cache_copies: commands.iter().filter(|c| c.is_short_code()).count(),
            digest: None,
        }
    }
}

/// Parse `data` as one stream, in blocks of `2^lgblock` bytes.
pub fn parse_buffer(
    data: &[u8],
    params: &BackrefParams,
    lgblock: u32,
) -> anyhow::Result<(Vec<Command>, StreamState)> {
    let ring = RingBuffer::flat(data);
    let block_size = 1usize << lgblock;
    let mut hashers = Hashers::new();
    let mut ctx = BackwardReferencesContext::new();
    let mut state = StreamState::default();
    let mut commands = Vec::new();

    let mut position = 0usize;
    loop {
        let num_bytes = block_size.min(data.len() - position);
        let is_last = position + num_bytes == data.len();
        create_backward_references(
            &InputBlock::new(&ring, position, num_bytes, is_last),
            params,
            &mut hashers,
            &mut state,
            &mut commands,
            &mut ctx,
        )
        .with_context(|| format!("parsing block at offset {position}"))?;
        position += num_bytes;
        if is_last {
            break;
        }
    }
    Ok((commands, state))
}

/// Parse `data` and collect its statistics, replaying the commands when
/// `verify` is set.
pub fn analyze_buffer(
    data: &[u8],
    params: &BackrefParams,
    lgblock: u32,
    verify: bool,
) -> anyhow::Result<FileStats> {
    let (commands, state) = parse_buffer(data, params, lgblock)?;
    let mut stats = FileStats::from_commands(data.len(), &commands, state.num_literals);
    if verify {
        let digest = verify_commands(&commands, data, params.lgwin)
            .map_err(|e| anyhow!("verification failed: {e}"))?;
        stats.digest = Some(digest);
    }
    Ok(stats)
}

fn analyze_file(path: &Path, cfg: &RunConfig) -> anyhow::Result<FileStats> {
    let data = std::fs::read(path).with_context(|| format!("{}: cannot read", path.display()))?;
    let params = BackrefParams::new(cfg.quality, cfg.lgwin);
    let start = Instant::now();
    let stats = analyze_buffer(&data, &params, cfg.lgblock, cfg.verify)
        .with_context(|| path.display().to_string())?;
    displaylevel!(
        3,
        "{}: parsed in {:.3} s\n",
        path.display(),
        start.elapsed().as_secs_f64()
    );
    Ok(stats)
}

fn print_stats(path: &Path, stats: &FileStats) {
    let ratio = if stats.bytes == 0 {
        0.0
    } else {
        100.0 * stats.literals as f64 / stats.bytes as f64
    };
    displayout!(
        "{:<40} {:>10} bytes {:>8} commands {:>8} copies ({} cached) {:>10} literals ({:.2}%)",
        path.display(),
        stats.bytes,
        stats.commands,
        stats.copies,
        stats.cache_copies,
        stats.literals,
        ratio
    );
    if let Some(digest) = stats.digest {
        displayout!("  verified xxh64 {digest:016x}");
    }
    displayout!("\n");
}

/// Run the analysis over every input; returns the process exit code.
pub fn run(cfg: &RunConfig) -> anyhow::Result<i32> {
    let files = create_file_list(&cfg.inputs).context("expanding input list")?;
    if files.is_empty() {
        return Err(anyhow!("no input files"));
    }

    let nb_workers = if cfg.nb_workers == 0 { num_cpus::get() } else { cfg.nb_workers };
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(nb_workers)
        .build()
        .context("creating worker pool")?;
    displaylevel!(3, "backref: {} file(s) on {} worker(s)\n", files.len(), nb_workers);

    let results: Vec<anyhow::Result<FileStats>> =
        pool.install(|| files.par_iter().map(|path| analyze_file(path, cfg)).collect());

    let mut failures = 0usize;
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(stats) => print_stats(path, &stats),
            Err(e) => {
                failures += 1;
                displaylevel!(1, "backref: {:#}\n", e);
            }
        }
    }
    Ok(if failures == 0 { 0 } else { 1 })
}
