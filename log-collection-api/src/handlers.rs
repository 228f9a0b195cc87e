use crate::api_client::{ApiClient, HOP_HEADER};
use crate::config::Config;
use crate::demo_page::render_page;
use crate::fan_out::{FanOutReport, PeerDispatcher};
use crate::file_path::validate_file_path;
use crate::local_reader::read_local;
use crate::log_entry::LogEntry;
use crate::merge::merge_entries;
use crate::query_structures::{LogQuery, QueryParams};
use crate::server_error::ServerError;
use actix_web::{HttpRequest, HttpResponse, get, http::header::ContentType, web};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Number of peers that contributed nothing to a response. Absent when all answered.
pub const PEER_FAILURES_HEADER: &str = "X-Peer-Failures";

pub struct AppState {
    pub server_name: String,
    pub log_dir: PathBuf,
    pub default_lines: usize,
    pub dispatcher: PeerDispatcher,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = ApiClient::new(config.peer_request_timeout)?;
        Ok(Self {
            server_name: config.server_name.clone(),
            log_dir: config.log_dir.clone(),
            default_lines: config.default_lines,
            dispatcher: PeerDispatcher::new(
                client,
                config.peers.clone(),
                config.worker_count,
                config.fan_out_timeout,
            ),
        })
    }
}

pub struct CollectedLogs {
    pub params: QueryParams,
    pub entries: Vec<LogEntry>,
    pub peer_failures: usize,
}

/// Validates the query, reads the local file, asks the peers (unless
/// `include_peers` is false) and merges everything newest first.
pub async fn collect_logs(
    state: &AppState,
    query: &LogQuery,
    include_peers: bool,
) -> Result<CollectedLogs, ServerError> {
    let params = QueryParams::from_query(query, state.default_lines)?;
    let path = validate_file_path(&state.log_dir, params.file_name())?;

    let local = {
        let params = params.clone();
        let server = state.server_name.clone();
        web::block(move || {
            let file = File::open(&path)?;
            read_local(BufReader::new(file), &params, &server)
        })
        .await
        .map_err(|e| ServerError::internal("Failed to read log file", e))?
        .map_err(|e| ServerError::internal("Failed to read log file", e))?
    };

    let report = if include_peers {
        state.dispatcher.fan_out(&params).await
    } else {
        FanOutReport::default()
    };
    let peer_failures = report.failure_count();
    let entries = merge_entries(local, report.into_entries(), params.line_count());

    Ok(CollectedLogs {
        params,
        entries,
        peer_failures,
    })
}

fn is_peer_request(req: &HttpRequest) -> bool {
    req.headers().contains_key(HOP_HEADER)
}

#[get("/api/v1/logs")]
async fn get_logs(
    data: web::Data<AppState>,
    query: web::Query<LogQuery>,
    req: HttpRequest,
) -> Result<HttpResponse, ServerError> {
    let collected = collect_logs(&data, &query, !is_peer_request(&req)).await?;

    let mut response = HttpResponse::Ok();
    if collected.peer_failures > 0 {
        response.insert_header((PEER_FAILURES_HEADER, collected.peer_failures.to_string()));
    }
    Ok(response.json(collected.entries))
}

/// Demo view of the same query.
#[get("/")]
async fn show_demo(
    data: web::Data<AppState>,
    query: web::Query<LogQuery>,
) -> Result<HttpResponse, ServerError> {
    let collected = collect_logs(&data, &query, true).await?;

    Ok(HttpResponse::Ok()
        .insert_header(ContentType::html())
        .body(render_page(&collected.params, &collected.entries)))
}

#[get("/whoareyou")]
async fn who_are_you(data: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "server": data.server_name,
        "peers": data.dispatcher.peers().len(),
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_logs).service(show_demo).service(who_are_you);
}
