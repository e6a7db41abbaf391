//! Report text encoding.
//!
//! A header line followed by one row per location, joined with `\n` and
//! without a trailing newline. All fields are integers, so no quoting is
//! needed.

use crate::models::{StoreId, UptimeRecord};

pub const REPORT_CSV_HEADER: &str = "store_id,uptime_last_hour,downtime_last_hour,uptime_last_day,downtime_last_day,uptime_last_week,downtime_last_week";

const COLUMN_COUNT: usize = 7;

/// Encode records in the order given.
pub fn encode(records: &[UptimeRecord]) -> String {
    let mut out = String::with_capacity(REPORT_CSV_HEADER.len() + records.len() * 32);
    out.push_str(REPORT_CSV_HEADER);
    for r in records {
        out.push('\n');
        out.push_str(&format!(
            "{},{},{},{},{},{},{}",
            r.store_id,
            r.uptime_last_hour,
            r.downtime_last_hour,
            r.uptime_last_day,
            r.downtime_last_day,
            r.uptime_last_week,
            r.downtime_last_week
        ));
    }
    out
}

/// Parse an encoded report back into records.
pub fn parse(text: &str) -> Result<Vec<UptimeRecord>, String> {
    let mut lines = text.lines();
    match lines.next() {
        Some(header) if header == REPORT_CSV_HEADER => {}
        Some(header) => return Err(format!("unexpected header: {}", header)),
        None => return Err("empty report".to_string()),
    }

    lines
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| parse_row(line).map_err(|e| format!("row {}: {}", idx + 1, e)))
        .collect()
}

fn parse_row(line: &str) -> Result<UptimeRecord, String> {
    let fields = line
        .split(',')
        .map(|f| f.trim().parse::<i64>().map_err(|e| format!("'{}': {}", f, e)))
        .collect::<Result<Vec<_>, _>>()?;

    if fields.len() != COLUMN_COUNT {
        return Err(format!(
            "expected {} columns, found {}",
            COLUMN_COUNT,
            fields.len()
        ));
    }

    Ok(UptimeRecord {
        store_id: StoreId::new(fields[0]),
        uptime_last_hour: fields[1],
        downtime_last_hour: fields[2],
        uptime_last_day: fields[3],
        downtime_last_day: fields[4],
        uptime_last_week: fields[5],
        downtime_last_week: fields[6],
    })
}
