use std::collections::BTreeMap;

use crate::block::{BlockPayload, FileEntry};
use crate::cluster::datanode::NodeId;

/// Filename to block list mapping, the namenode side of the metadata.
/// BTreeMap so listings and repair sweeps walk files in a stable order.
#[derive(Debug, Clone, Default)]
pub struct FileDirectory {
    files: BTreeMap<String, FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub filename: String,
    pub block_count: usize,
}

#[derive(Debug, Clone)]
pub struct BlockMetadata {
    pub order: usize,
    pub payload: BlockPayload,
    pub replicas: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub filename: String,
    pub blocks: Vec<BlockMetadata>,
}

impl FileDirectory {
    pub fn new() -> Self {
        Self::default()
    }
    /// returns the entry this one replaced, if any
    pub fn insert(&mut self, entry: FileEntry) -> Option<FileEntry> {
        self.files.insert(entry.filename.clone(), entry)
    }
    pub fn remove(&mut self, filename: &str) -> Option<FileEntry> {
        self.files.remove(filename)
    }
    pub fn get(&self, filename: &str) -> Option<&FileEntry> {
        self.files.get(filename)
    }
    pub fn contains(&self, filename: &str) -> bool {
        self.files.contains_key(filename)
    }
    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.values()
    }
    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut FileEntry> {
        self.files.values_mut()
    }
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
    pub fn summaries(&self) -> Vec<FileSummary> {
        self.files
            .values()
            .map(|entry| FileSummary {
                filename: entry.filename.clone(),
                block_count: entry.blocks.len(),
            })
            .collect()
    }
    pub fn metadata(&self, filename: &str) -> Option<FileMetadata> {
        self.files.get(filename).map(|entry| FileMetadata {
            filename: entry.filename.clone(),
            blocks: entry
                .blocks
                .iter()
                .enumerate()
                .map(|(order, block)| BlockMetadata {
                    order,
                    payload: block.payload.clone(),
                    replicas: block.replicas.clone(),
                })
                .collect(),
        })
    }
}
