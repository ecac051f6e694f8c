use blocks::{Block, ClientId};

use crate::collection::BlockList;

/// Snapshot of the editor's block list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct State {
    pub blocks: BlockList,
    /// Position of the focused block; matches the block whose `focused`
    /// flag is set.
    pub focused_index: Option<usize>,
    /// Flipped on every change. A render signal only, not document data.
    pub refresh: bool,
}

impl State {
    /// Initial state for a freshly parsed document: nothing focused.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        State {
            blocks: BlockList::from_parsed(blocks),
            focused_index: None,
            refresh: false,
        }
    }

    pub fn block_at(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn index_of(&self, client_id: &ClientId) -> Option<usize> {
        self.blocks.index_of(client_id)
    }

    pub fn focused_client_id(&self) -> Option<&ClientId> {
        self.focused_index
            .and_then(|index| self.blocks.get(index))
            .map(|block| &block.client_id)
    }

    pub fn client_ids(&self) -> Vec<&ClientId> {
        self.blocks.iter().map(|block| &block.client_id).collect()
    }
}
