//! Command-line interface for the `backref` binary.
//!
//! | Submodule     | Responsibility |
//! |---------------|---------------|
//! | [`init`]      | Environment overrides for quality, window and worker count. |
//! | [`args`]      | `Cli`: clap argument definitions, resolved into a `RunConfig`. |
//! | [`file_list`] | Recursive expansion of directory inputs. |
//! | [`replay`]    | Reference command applier behind `--verify`. |
//! | [`run`]       | Per-file parse driver, parallel over files, and stats output. |
//!
//! Typical call sequence: `Cli::parse` → `Cli::into_config` → `run::run`.

pub mod init;
pub mod args;
pub mod file_list;
pub mod replay;
pub mod run;
