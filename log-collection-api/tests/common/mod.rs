#![allow(dead_code)]

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpServer, web};
use log_collection_api::api_client::ApiClient;
use log_collection_api::fan_out::PeerDispatcher;
use log_collection_api::handlers::{AppState, configure};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

pub const FIVE_LINES: &str = "Oct 1 13:08:07 This is a log entry
Oct 1 13:08:08 This is another log entry
Oct 1 13:08:09 This is a log entry
Oct 1 13:08:10 This is another log entry
Oct 1 13:08:11 This is a log entry
";

pub fn log_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

pub fn state(server_name: &str, dir: &Path, peers: Vec<String>, fan_out_timeout: Duration) -> AppState {
    AppState {
        server_name: server_name.to_string(),
        log_dir: dir.to_path_buf(),
        default_lines: 10,
        dispatcher: PeerDispatcher::new(
            ApiClient::new(Duration::from_secs(10)).unwrap(),
            peers,
            3,
            fan_out_timeout,
        ),
    }
}

/// Runs a full instance on an ephemeral loopback port and returns `host:port`.
pub fn spawn_instance(state: AppState) -> (String, ServerHandle) {
    let state = web::Data::new(state);
    spawn(move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(state.clone());
        configure(cfg);
    })
}

/// Serves `routes` on an ephemeral loopback port and returns `host:port`.
pub fn spawn<F>(routes: F) -> (String, ServerHandle)
where
    F: Fn(&mut web::ServiceConfig) + Send + Clone + 'static,
{
    let server = HttpServer::new(move || App::new().configure(routes.clone()))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    (addr.to_string(), handle)
}
