//! Logging setup.

use std::io::Write;

/// Installs an `env_logger` logger with the given filter (e.g. `"info"` or `"weft=debug"`).
///
/// Returns false if a logger was already installed.
pub fn init(filter: &str) -> bool {
    env_logger::Builder::new()
        .parse_filters(filter)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:>5} {}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
        .is_ok()
}

/// Installs a logger for tests, capturing output per test.
#[cfg(test)]
pub(crate) fn init_for_tests() {
    let _ = env_logger::Builder::new()
        .parse_filters("debug")
        .is_test(true)
        .try_init();
}
