//! Logger initialization

use log::LevelFilter;
use std::io::Write;

/// Map the number of `-v` flags to a level filter
pub fn level_for_verbosity(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initialize `env_logger` for the binary.
///
/// `RUST_LOG` is read first; a non-zero `verbosity` overrides it for this
/// crate. Resolver internals stay at warnings unless `-vv` is given, since
/// they log every retried query.
///
/// Returns an error if a logger was already installed.
pub fn init_logger(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let level = level_for_verbosity(verbosity);
    let mut builder = env_logger::Builder::from_default_env();

    if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(LevelFilter::Warn);
        builder.filter_module("asn_finder", level);
    } else if verbosity > 0 {
        builder.filter_module("asn_finder", level);
    }
    if verbosity < 2 {
        builder.filter_module("hickory_proto", LevelFilter::Error);
        builder.filter_module("hickory_resolver", LevelFilter::Warn);
    }

    builder.format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()));
    builder.try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for_verbosity(0), LevelFilter::Info);
        assert_eq!(level_for_verbosity(1), LevelFilter::Debug);
        assert_eq!(level_for_verbosity(2), LevelFilter::Trace);
        assert_eq!(level_for_verbosity(9), LevelFilter::Trace);
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        let _ = init_logger(0);
        assert!(init_logger(1).is_err());
    }
}
