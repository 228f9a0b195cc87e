use crate::log_entry::{LogEntry, LogType, ParsedLine, parse_line};
use crate::merge::sort_newest_first;
use crate::query_structures::QueryParams;
use std::io::{self, BufRead};

/// Scans the whole stream and returns the newest `line_count` entries that
/// pass the filter.
///
/// With an empty filter every line is kept, unparsed ones included (as
/// [`LogEntry::unparsed`]). With a filter only parsed lines whose message
/// contains it, ignoring case, are kept.
///
/// Any read error aborts the scan and nothing is returned.
pub fn read_local<R: BufRead>(source: R, params: &QueryParams, server: &str) -> io::Result<Vec<LogEntry>> {
    let log_type = LogType::for_file(params.file_name());
    let mut logs = Vec::new();

    for raw in source.split(b'\n') {
        let raw = raw?;
        let line = String::from_utf8_lossy(&raw);
        let parsed = parse_line(line.trim_end_matches('\r'), log_type, server);
        if keeps(&parsed, params.filter()) {
            logs.push(parsed.into_entry());
        }
    }

    sort_newest_first(&mut logs);
    logs.truncate(params.line_count());
    log::debug!(
        "read {} matching lines from {} (filter {:?})",
        logs.len(),
        params.file_name(),
        params.filter()
    );
    Ok(logs)
}

fn keeps(parsed: &ParsedLine, filter: &str) -> bool {
    match parsed {
        _ if filter.is_empty() => true,
        ParsedLine::Parsed(entry) => entry.message.to_lowercase().contains(filter),
        ParsedLine::Unparsed => false,
    }
}
