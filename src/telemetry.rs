use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const ENV_LOG_JSON: &str = "VITALWATCH_LOG_JSON";

/// Install the global subscriber. Safe to call more than once; later calls
/// are no-ops.
///
/// Filter: `RUST_LOG` if set, otherwise derived from `-v` count.
/// Output: compact human format, or JSON lines with `VITALWATCH_LOG_JSON=1`.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let json = std::env::var(ENV_LOG_JSON).is_ok_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()
    };
    if res.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "vitalwatch=warn,warn",
        1 => "vitalwatch=info,warn",
        2 => "vitalwatch=debug,info",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_directive(0), "vitalwatch=warn,warn");
        assert_eq!(default_directive(2), "vitalwatch=debug,info");
        assert_eq!(default_directive(9), "trace");
    }

    #[test]
    fn init_twice_does_not_panic() {
        init(0);
        init(1);
    }
}
