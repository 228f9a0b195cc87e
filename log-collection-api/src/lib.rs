//! Last-N-lines log retrieval across this host and its peers.

pub mod api_client;
pub mod config;
pub mod demo_page;
pub mod fan_out;
pub mod file_path;
pub mod handlers;
pub mod local_reader;
pub mod log_entry;
pub mod merge;
pub mod query_structures;
pub mod server_error;
