//! Process-wide log sink with adjustable verbosity.
//!
//! Verbosity uses the host's 0–5 scale: crit, error, warn, info, debug,
//! trace. `tracing` has no level above error, so crit and error share one.

use std::sync::OnceLock;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, Registry};

static FILTER: OnceLock<reload::Handle<LevelFilter, Registry>> = OnceLock::new();

/// Map a host verbosity onto a tracing filter. Values above 5 mean trace.
pub fn level_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 | 1 => LevelFilter::ERROR,
        2 => LevelFilter::WARN,
        3 => LevelFilter::INFO,
        4 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the stderr sink. Later calls only adjust the verbosity.
///
/// If another global subscriber is already installed it is left in place
/// and verbosity changes have no effect.
pub fn init(verbosity: u8) {
    if FILTER.get().is_some() {
        set_verbosity(verbosity);
        return;
    }
    let (filter, handle) = reload::Layer::new(level_filter(verbosity));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
    if installed.is_ok() {
        let _ = FILTER.set(handle);
    }
}

/// Change the verbosity of the installed sink.
///
/// Returns false when no sink was installed by [`init`].
pub fn set_verbosity(verbosity: u8) -> bool {
    match FILTER.get() {
        Some(handle) => handle.reload(level_filter(verbosity)).is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(level_filter(0), LevelFilter::ERROR);
        assert_eq!(level_filter(1), LevelFilter::ERROR);
        assert_eq!(level_filter(2), LevelFilter::WARN);
        assert_eq!(level_filter(3), LevelFilter::INFO);
        assert_eq!(level_filter(4), LevelFilter::DEBUG);
        assert_eq!(level_filter(5), LevelFilter::TRACE);
        assert_eq!(level_filter(200), LevelFilter::TRACE);
    }

    #[test]
    fn test_init_is_repeatable() {
        init(3);
        init(4);
        // Either this test installed the sink or another one already had.
        if FILTER.get().is_some() {
            assert!(set_verbosity(5));
        }
    }
}
