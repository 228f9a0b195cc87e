use crate::log_entry::LogEntry;

/// Newest first. The sort is stable, equal timestamps keep their order.
pub fn sort_newest_first(entries: &mut [LogEntry]) {
    entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

/// Concatenates local then remote entries, sorts newest first and keeps at
/// most `limit` of them.
pub fn merge_entries(mut local: Vec<LogEntry>, remote: Vec<LogEntry>, limit: usize) -> Vec<LogEntry> {
    local.extend(remote);
    sort_newest_first(&mut local);
    local.truncate(limit);
    local
}
