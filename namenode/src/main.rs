use std::io;
use std::sync::Arc;
use std::time::Duration;

use namenode::client_handler::ClientHandler;
use namenode::command_runner::CommandRunner;
use namenode::config::CONFIG;
use namenode::health_monitor::HealthMonitor;
use namenode::namenode_state::NamenodeState;
use namenode::recorder::Recorder;
use storage::file_store::FileStore;
use storage::persistence::PersistenceStore;
use tokio::sync::Mutex;
use utilities::{
    logger::{error, info, init_logger},
    result::Result,
};

#[tokio::main]
async fn main() -> Result<()> {
    let _gaurd = init_logger(
        "Namenode",
        &CONFIG.node_id,
        CONFIG.log_level.clone(),
        &CONFIG.log_base,
    );
    CONFIG.validate()?;
    info!(
        nodes = CONFIG.num_datanodes,
        replication_factor = CONFIG.replication_factor,
        block_size = CONFIG.block_size,
        "Starting the namenode simulation"
    );
    let store = match FileStore::new(&CONFIG.storage_root) {
        Ok(v) => v,
        Err(e) => {
            error!(error=%e,"Error while initiating block persistence Hence shuting down");
            return Err(e);
        }
    };
    // only node payload lists survive restarts, directory metadata is
    // write only and every run starts with an empty directory
    let mut state = NamenodeState::new();
    for _ in 0..CONFIG.num_datanodes {
        let node_id = state.cluster.add_node();
        match store.load_node(node_id).await {
            Ok(payloads) => {
                if !payloads.is_empty() {
                    info!(
                        node_id,
                        count = payloads.len(),
                        "seeded datanode from persisted payloads"
                    );
                }
                if let Some(node) = state.cluster.node_mut(node_id) {
                    node.seed(payloads);
                }
            }
            Err(e) => {
                error!(node_id, error=%e, "Error while loading persisted payloads, node starts empty");
            }
        }
    }
    let state = Arc::new(Mutex::new(state));
    let (recorder, writer) = Recorder::start(Box::new(store));
    let heartbeat = HealthMonitor::new(
        state.clone(),
        CONFIG.replication_factor,
        Duration::from_millis(CONFIG.heartbeat_interval_ms),
        recorder.clone(),
    )
    .start();
    let handler = ClientHandler::new(
        state,
        CONFIG.block_size,
        CONFIG.replication_factor,
        recorder,
    );
    let mut command_executer = CommandRunner::new(handler);
    info!("namenode ready, type help to list available commands");
    loop {
        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_bytes) => {
                if input.trim() == "exit" {
                    break;
                }
                match command_executer.handle_input(&input).await {
                    Ok(message) => {
                        println!("Success : {}", message);
                    }
                    Err(message) => {
                        println!("Error : {}", message);
                    }
                }
            }
            Err(e) => {
                println!("error while reading the command {:?}", e);
            }
        }
    }
    heartbeat.shutdown().await;
    // dropping the runner releases the last job producer, after which the
    // writer drains the queue and exits
    drop(command_executer);
    writer.shutdown().await;
    info!("namenode stopped");
    Ok(())
}
