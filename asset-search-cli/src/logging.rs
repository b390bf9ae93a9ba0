//! JSON-lines logging on stderr.
//!
//! ```json
//! {"level":"error","msg":"invalid search term: password","target":"asset_query::whitelist","ts":"2025-01-16T10:30:00.123Z"}
//! ```

use log::{LevelFilter, Record, SetLoggerError};
use std::fmt::Display;
use std::io::{self, Write};

/// Install an `env_logger` backend that writes one JSON object per record.
pub fn initialize_logging(level: LevelFilter) -> Result<(), SetLoggerError> {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            let ts = buf.timestamp_millis();
            write_json_line(buf, &ts, record)
        })
        .try_init()
}

fn write_json_line(out: &mut impl Write, ts: &dyn Display, record: &Record<'_>) -> io::Result<()> {
    let line = serde_json::json!({
        "level": record.level().as_str().to_ascii_lowercase(),
        "msg": record.args().to_string(),
        "target": record.target(),
        "ts": ts.to_string(),
    });
    writeln!(out, "{line}")
}
