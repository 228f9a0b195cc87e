use crate::api_client::{ApiClient, PeerFailure};
use crate::log_entry::LogEntry;
use crate::query_structures::QueryParams;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::{Instant, timeout_at};
use url::Url;

/// What a single peer contributed to a query.
#[derive(Debug)]
pub enum PeerOutcome {
    Entries(Vec<LogEntry>),
    Failed(PeerFailure),
}

#[derive(Debug)]
pub struct PeerResult {
    pub peer: String,
    pub outcome: PeerOutcome,
}

/// One result per configured peer, in configuration order.
#[derive(Debug, Default)]
pub struct FanOutReport {
    pub results: Vec<PeerResult>,
}

impl FanOutReport {
    pub fn into_entries(self) -> Vec<LogEntry> {
        self.results
            .into_iter()
            .filter_map(|result| match result.outcome {
                PeerOutcome::Entries(entries) => Some(entries),
                PeerOutcome::Failed(_) => None,
            })
            .flatten()
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &PeerFailure)> {
        self.results.iter().filter_map(|result| match &result.outcome {
            PeerOutcome::Failed(failure) => Some((result.peer.as_str(), failure)),
            PeerOutcome::Entries(_) => None,
        })
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

struct PeerJob {
    peer: String,
    url: Url,
    slot: oneshot::Sender<PeerOutcome>,
}

/// Sends each query to every peer through a bounded pool of workers.
///
/// Each peer owns one result slot. The dispatcher waits on the slots against
/// a single deadline, so a peer that never answers costs at most
/// `fan_out_timeout` and shows up as [`PeerFailure::TimedOut`].
#[derive(Debug, Clone)]
pub struct PeerDispatcher {
    client: ApiClient,
    peers: Arc<[String]>,
    worker_count: usize,
    fan_out_timeout: Duration,
}

impl PeerDispatcher {
    pub fn new(client: ApiClient, peers: Vec<String>, worker_count: usize, fan_out_timeout: Duration) -> Self {
        Self {
            client,
            peers: peers.into(),
            worker_count: worker_count.max(1),
            fan_out_timeout,
        }
    }

    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub async fn fan_out(&self, params: &QueryParams) -> FanOutReport {
        if self.peers.is_empty() {
            return FanOutReport::default();
        }
        let deadline = Instant::now() + self.fan_out_timeout;

        let (job_sender, job_receiver) = mpsc::channel::<PeerJob>(self.peers.len());
        let mut slots = Vec::with_capacity(self.peers.len());
        for peer in self.peers.iter() {
            let (slot, pending) = oneshot::channel();
            match ApiClient::peer_url(peer, params) {
                Ok(url) => {
                    // A rejected job drops its slot, which reports as a lost worker.
                    let _ = job_sender
                        .send(PeerJob {
                            peer: peer.clone(),
                            url,
                            slot,
                        })
                        .await;
                }
                Err(failure) => {
                    let _ = slot.send(PeerOutcome::Failed(failure));
                }
            }
            slots.push((peer.clone(), pending));
        }
        drop(job_sender);

        let jobs = Arc::new(Mutex::new(job_receiver));
        for worker_id in 0..self.worker_count.min(self.peers.len()) {
            tokio::spawn(worker(worker_id, self.client.clone(), jobs.clone()));
        }

        let mut results = Vec::with_capacity(slots.len());
        for (peer, pending) in slots {
            let outcome = match timeout_at(deadline, pending).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(_)) => PeerOutcome::Failed(PeerFailure::WorkerLost),
                Err(_) => PeerOutcome::Failed(PeerFailure::TimedOut),
            };
            if let PeerOutcome::Failed(failure) = &outcome {
                log::warn!("peer {} contributed no logs: {}", peer, failure);
            }
            results.push(PeerResult { peer, outcome });
        }

        let report = FanOutReport { results };
        log::debug!(
            "fan-out to {} peers finished, {} failed",
            self.peers.len(),
            report.failure_count()
        );
        report
    }
}

async fn worker(worker_id: usize, client: ApiClient, jobs: Arc<Mutex<mpsc::Receiver<PeerJob>>>) {
    loop {
        let job = jobs.lock().await.recv().await;
        let Some(PeerJob { peer, url, slot }) = job else {
            break;
        };

        log::trace!("worker {} querying {}", worker_id, url);
        let outcome = match client.fetch_logs(url).await {
            Ok(entries) => PeerOutcome::Entries(entries),
            Err(failure) => PeerOutcome::Failed(failure),
        };
        if slot.send(outcome).is_err() {
            log::debug!("late answer from peer {} discarded", peer);
        }
    }
}
