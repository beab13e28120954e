use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

/// Send diagnostics to stderr so stdout carries nothing but the one result line.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks between info and warn.
pub fn init(verbose: bool) {
    let fallback = if verbose { "netclip=info" } else { "netclip=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    // Ignore the error from a second init, e.g. when tests call `run` repeatedly.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init();
}
