use thiserror::Error;

use crate::cluster::datanode::NodeId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamenodeError {
    #[error("invalid datanode id : {0}")]
    InvalidNode(NodeId),
    #[error("can't find the file meta in namenode filename : {0}")]
    FileNotFound(String),
    #[error("no datanodes registered to place replicas on")]
    EmptyCluster,
}
