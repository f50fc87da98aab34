//! Startup defaults read from the environment.
//!
//! - [`init_quality`] / [`init_lgwin`] / [`init_nb_workers`] read the
//!   `BACKREF_QUALITY`, `BACKREF_LGWIN` and `BACKREF_NBWORKERS` variables.
//! - Each has a `*_from` core taking the raw value, so the parsing can be
//!   unit-tested without touching the process environment.
//!
//! Malformed or out-of-range values are reported at display level 2 and the
//! compiled-in default is used instead.

use crate::config::{
    LGWIN_DEFAULT, MAX_LGWIN, MAX_QUALITY, MIN_LGWIN, MIN_QUALITY, NB_WORKERS_DEFAULT,
    NB_WORKERS_MAX, QUALITY_DEFAULT,
};
use crate::displaylevel;

pub const ENV_QUALITY: &str = "BACKREF_QUALITY";
pub const ENV_LGWIN: &str = "BACKREF_LGWIN";
pub const ENV_NBWORKERS: &str = "BACKREF_NBWORKERS";

/// Parse a run of leading decimal digits.  Returns the value and the rest of
/// the string, or `None` when `s` does not start with a digit.
pub fn read_u32_from_str(s: &str) -> Option<(u32, &str)> {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let mut result: u32 = 0;
    for b in s[..digits].bytes() {
        result = result.wrapping_mul(10).wrapping_add((b - b'0') as u32);
    }
    Some((result, &s[digits..]))
}

/// Shared core: a fully numeric value inside `[min, max]`, else `default`.
fn init_bounded_from(name: &str, env_val: Option<&str>, min: u32, max: u32, default: u32) -> u32 {
    if let Some(env) = env_val {
        match read_u32_from_str(env) {
            Some((val, "")) if (min..=max).contains(&val) => return val,
            _ => {
                displaylevel!(
                    2,
                    "Ignore environment variable setting {}={}: not a valid value in [{}, {}]\n",
                    name,
                    env,
                    min,
                    max
                );
            }
        }
    }
    default
}

/// Parse quality from an optional `BACKREF_QUALITY` value.
pub fn init_quality_from(env_val: Option<&str>) -> i32 {
    init_bounded_from(
        ENV_QUALITY,
        env_val,
        MIN_QUALITY as u32,
        MAX_QUALITY as u32,
        QUALITY_DEFAULT as u32,
    ) as i32
}

/// Parse the window exponent from an optional `BACKREF_LGWIN` value.
pub fn init_lgwin_from(env_val: Option<&str>) -> u32 {
    init_bounded_from(ENV_LGWIN, env_val, MIN_LGWIN, MAX_LGWIN, LGWIN_DEFAULT)
}

/// Parse the worker count from an optional `BACKREF_NBWORKERS` value.
pub fn init_nb_workers_from(env_val: Option<&str>) -> usize {
    init_bounded_from(
        ENV_NBWORKERS,
        env_val,
        0,
        NB_WORKERS_MAX as u32,
        NB_WORKERS_DEFAULT as u32,
    ) as usize
}

pub fn init_quality() -> i32 {
    init_quality_from(std::env::var(ENV_QUALITY).ok().as_deref())
}

pub fn init_lgwin() -> u32 {
    init_lgwin_from(std::env::var(ENV_LGWIN).ok().as_deref())
}

pub fn init_nb_workers() -> usize {
    init_nb_workers_from(std::env::var(ENV_NBWORKERS).ok().as_deref())
}
