use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use utilities::logger::{Level, error, info, span};

use crate::namenode_state::NamenodeState;
use crate::recorder::{Recorder, snapshot_jobs};
use crate::replication::ReplicationEngine;

/// Periodic heartbeat over the whole cluster: report node status, then run
/// a repair pass. The simulated stand in for datanodes phoning home.
pub struct HealthMonitor {
    namenode_state: Arc<Mutex<NamenodeState>>,
    replication: ReplicationEngine,
    tick: Duration,
    recorder: Recorder,
}

/// Cooperative shutdown for the heartbeat task. The loop checks the flag
/// right after every tick, so stopping waits at most one full interval.
pub struct HeartbeatHandle {
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl HeartbeatHandle {
    pub async fn shutdown(self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Err(e) = self.handle.await {
            error!(error = %e, "heartbeat task ended abnormally");
        }
    }
}

impl HealthMonitor {
    pub fn new(
        namenode_state: Arc<Mutex<NamenodeState>>,
        replication_factor: usize,
        tick: Duration,
        recorder: Recorder,
    ) -> Self {
        Self {
            namenode_state,
            replication: ReplicationEngine::new(replication_factor),
            tick,
            recorder,
        }
    }
    pub fn start(self) -> HeartbeatHandle {
        let shutdown = Arc::new(AtomicBool::new(false));
        let observed = shutdown.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval(self.tick);
            loop {
                ticker.tick().await;
                if observed.load(Ordering::Relaxed) {
                    info!("heartbeat loop shutting down");
                    break;
                }
                let span = span!(Level::INFO, "namenode_heartbeat");
                let _entered = span.enter();
                let mut state = self.namenode_state.lock().await;
                let status: Vec<String> = state
                    .node_report()
                    .iter()
                    .map(|node| {
                        format!(
                            "node{}[{}]",
                            node.id,
                            if node.alive { "alive" } else { "dead" }
                        )
                    })
                    .collect();
                info!(status = %status.join(" "), "heartbeat");
                let summary = self.replication.repair_pass(&mut state);
                if summary.changed() {
                    self.recorder.record(snapshot_jobs(&state));
                }
            }
        });
        HeartbeatHandle { shutdown, handle }
    }
}
