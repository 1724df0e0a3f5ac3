pub mod block;
pub mod block_splitter;
pub mod client_handler;
pub mod cluster;
pub mod command_runner;
pub mod config;
pub mod directory;
pub mod error;
pub mod health_monitor;
pub mod namenode_state;
pub mod placement;
pub mod recorder;
pub mod replication;
