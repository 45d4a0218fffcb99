//! Tracing setup: stderr logging filtered by `PULSE_LOG`.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// `PULSE_LOG` takes an env-filter directive string (default `warn`);
/// `PULSE_LOG_FORMAT=json` switches to line-delimited JSON output.
pub fn init() {
    let filter = EnvFilter::try_from_env("PULSE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    let json = std::env::var("PULSE_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
