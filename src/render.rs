use std::io::Write;

use chrono::DateTime;

use crate::error::{LogSearchError, Result};
use crate::model::LogEvent;

/// `Jan 02 15:04:05`, in the event's own offset.
const TEXT_TIME_FORMAT: &str = "%b %d %H:%M:%S";

/// Write one line per event: a compact JSON object, or `<time> <host> <program> <message>`.
pub fn render_events<W: Write>(out: &mut W, events: &[LogEvent], json_out: bool) -> Result<()> {
    for event in events {
        if json_out {
            serde_json::to_writer(&mut *out, event)?;
            writeln!(out)?;
        } else {
            writeln!(out, "{}", format_text(event)?)?;
        }
    }
    Ok(())
}

/// Echo the composed filter on its own line ahead of the results; nothing for no filter.
pub fn render_filter<W: Write>(out: &mut W, filter: Option<&str>) -> Result<()> {
    if let Some(filter) = filter.filter(|f| !f.is_empty()) {
        writeln!(out, "{filter}")?;
    }
    Ok(())
}

fn format_text(event: &LogEvent) -> Result<String> {
    let time = DateTime::parse_from_rfc3339(&event.time)
        .map_err(|e| LogSearchError::RenderError(format!("bad event time {:?}: {e}", event.time)))?;
    Ok(format!(
        "{} {} {} {}",
        time.format(TEXT_TIME_FORMAT),
        event.hostname,
        event.program,
        event.message
    ))
}
