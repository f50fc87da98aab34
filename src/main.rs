//! Binary entry point for the `backref` command-line tool.
//!
//! Parses the arguments, applies the display level, and hands the resolved
//! configuration to [`backref::cli::run::run`].  Returns exit code 1 when any
//! input fails to read, parse, or verify.

use clap::Parser;

use backref::cli::args::Cli;
use backref::cli::run::run;
use backref::display::set_display_level;
use backref::displaylevel;

fn main() {
    let cli = Cli::parse();
    set_display_level(cli.display_level());
    let cfg = cli.into_config();
    displaylevel!(
        4,
        "*** backref v{} : q{} lgwin {} lgblock {} ***\n",
        backref::version_string(),
        cfg.quality,
        cfg.lgwin,
        cfg.lgblock
    );

    let code = match run(&cfg) {
        Ok(code) => code,
        Err(e) => {
            displaylevel!(1, "backref: {:#}\n", e);
            1
        }
    };
    std::process::exit(code);
}
