use crate::log_entry::LogEntry;
use crate::query_structures::QueryParams;
use std::fmt::Write;

/// Renders the query form and the result table of `GET /`.
pub fn render_page(params: &QueryParams, entries: &[LogEntry]) -> String {
    let mut rows = String::new();
    for entry in entries {
        let timestamp = if entry.is_unparsed() {
            String::from("-")
        } else {
            entry.timestamp.format("%b %d %H:%M:%S%.3f").to_string()
        };
        let log_type = entry.log_type.map(|t| t.as_str()).unwrap_or("");
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            timestamp,
            escape_html(&entry.server),
            log_type,
            escape_html(&entry.message)
        );
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Log collection</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
table {{ border-collapse: collapse; width: 100%; }}
td, th {{ border: 1px solid #ccc; padding: 4px 8px; text-align: left; font-family: monospace; }}
</style>
</head>
<body>
<h1>Log collection</h1>
<form method="get" action="/">
<label>File <input name="file" value="{file}"></label>
<label>Lines <input name="n" type="number" min="1" max="1000" value="{n}"></label>
<label>Filter <input name="filter" value="{filter}"></label>
<button type="submit">Search</button>
</form>
<p>{count} entries</p>
<table>
<tr><th>Timestamp</th><th>Server</th><th>Type</th><th>Message</th></tr>
{rows}
</table>
</body>
</html>
"#,
        file = escape_html(params.file_name()),
        n = params.line_count(),
        filter = escape_html(params.filter()),
        count = entries.len(),
        rows = rows,
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}
