use utilities::logger::{instrument, tracing};

use crate::block::BlockPayload;

pub trait BlockSplitter {
    fn split(&self, content: &[u8]) -> Vec<BlockPayload>;
}

pub struct FixedSizeSplitter {
    block_size: usize,
}

impl FixedSizeSplitter {
    pub fn new(block_size: usize) -> Self {
        Self { block_size }
    }
}

impl BlockSplitter for FixedSizeSplitter {
    /// last block keeps whatever remains, it is not padded
    #[instrument(name = "namenode_split_blocks", skip(self, content), fields(content_len = content.len()))]
    fn split(&self, content: &[u8]) -> Vec<BlockPayload> {
        content
            .chunks(self.block_size)
            .map(|chunk| chunk.to_vec())
            .collect()
    }
}
