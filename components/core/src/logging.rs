//! Stderr-only logging, shared by all three tiers.
//!
//! Every diagnostic line carries the program name, matching §6's "all
//! diagnostics go to stderr with the program name prefix" without forcing
//! call sites to format that prefix by hand.

use std::io::Write;

/// Initialise the process-wide logger. `program` is the name that appears
/// at the front of every line; verbosity is controlled by `RUST_LOG`,
/// defaulting to `info`.
pub fn init(program: &'static str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(move |buf, record| writeln!(buf, "{program}: {}", record.args()))
        .target(env_logger::Target::Stderr)
        .init();
}
