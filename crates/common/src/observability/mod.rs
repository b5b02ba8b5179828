//! Tracing subscriber installation
//!
//! Library code only emits `tracing` events; binaries and test harnesses
//! call [`init_tracing`] once to decide where they go.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global subscriber writing to stderr.
///
/// `RUST_LOG` takes precedence over `level`. With `json` set, events are
/// emitted as JSON lines; otherwise in the compact human format.
///
/// Returns `false` when a global subscriber was already installed (the call
/// is then a no-op).
pub fn init_tracing(level: &str, json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
            .try_init()
    };

    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        let first = init_tracing("debug", false);
        let second = init_tracing("debug", true);
        assert!(!second);
        // The first call may lose to another test that installed a subscriber.
        let _ = first;
    }
}
