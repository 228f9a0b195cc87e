use crate::server_error::ServerError;
use serde::Deserialize;

pub const DEFAULT_LOG_FILE: &str = "system.log";
pub const MIN_LINES: usize = 1;
pub const MAX_LINES: usize = 1000;

/// Raw query string of `/api/v1/logs` and `/`.
///
/// `n` stays a string so a malformed value is reported with our own message
/// instead of actix's generic deserialization error.
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub file: Option<String>,
    pub n: Option<String>,
    pub filter: Option<String>,
}

/// Validated query: line count in [1, 1000], filter trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    file_name: String,
    line_count: usize,
    filter: String,
}

impl QueryParams {
    pub fn new(file_name: &str, line_count: usize, filter: &str) -> Result<Self, ServerError> {
        if !(MIN_LINES..=MAX_LINES).contains(&line_count) {
            return Err(ServerError::bad_request(
                "number of lines should be between 1 and 1000",
            ));
        }
        let file_name = match file_name {
            "" => DEFAULT_LOG_FILE,
            name => name,
        };
        Ok(Self {
            file_name: file_name.to_string(),
            line_count,
            filter: filter.trim().to_lowercase(),
        })
    }

    pub fn from_query(query: &LogQuery, default_lines: usize) -> Result<Self, ServerError> {
        let line_count = match query.n.as_deref() {
            None | Some("") => default_lines,
            Some(raw) => {
                let n: i64 = raw
                    .parse()
                    .map_err(|_| ServerError::bad_request("invalid number of lines"))?;
                // negative counts share the range message
                usize::try_from(n).unwrap_or(0)
            }
        };

        Self::new(
            query.file.as_deref().unwrap_or_default(),
            line_count,
            query.filter.as_deref().unwrap_or_default(),
        )
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }
}
