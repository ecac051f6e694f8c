use blocks::{Block, ClientId};

/// Ordered top-level blocks of a document, addressed by position or by
/// client id.
///
/// Lookups by id are linear scans; documents hold tens to a few hundred
/// blocks. If that stops holding, keep an id -> position map updated by
/// every mutating method here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockList {
    blocks: Vec<Block>,
}

impl BlockList {
    pub fn new() -> Self {
        BlockList { blocks: Vec::new() }
    }

    /// A collection fresh from a parse: nothing focused.
    pub fn from_parsed(blocks: Vec<Block>) -> Self {
        let blocks = blocks
            .into_iter()
            .map(|block| Block {
                focused: false,
                ..block
            })
            .collect();
        BlockList { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    pub fn index_of(&self, client_id: &ClientId) -> Option<usize> {
        self.blocks.iter().position(|b| &b.client_id == client_id)
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.index_of(client_id).is_some()
    }

    /// Position of the first focused block.
    pub fn focused_position(&self) -> Option<usize> {
        self.blocks.iter().position(|b| b.focused)
    }

    /// Insert at `index`, shifting later blocks up. `index` may equal `len()`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len()`.
    pub fn insert(&mut self, index: usize, block: Block) {
        self.blocks.insert(index, block);
    }

    /// Remove and return the block at `index`, shifting later blocks down.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn remove_at(&mut self, index: usize) -> Block {
        self.blocks.remove(index)
    }

    /// Swap the blocks at `index` and `index + 1`.
    ///
    /// # Panics
    ///
    /// Panics if `index + 1 >= len()`.
    pub fn swap(&mut self, index: usize) {
        self.blocks.swap(index, index + 1);
    }

    /// Replace the block at `index`, returning the old one.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn set(&mut self, index: usize, block: Block) -> Block {
        std::mem::replace(&mut self.blocks[index], block)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    pub fn as_slice(&self) -> &[Block] {
        &self.blocks
    }
}

impl<'a> IntoIterator for &'a BlockList {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

impl FromIterator<Block> for BlockList {
    fn from_iter<I: IntoIterator<Item = Block>>(iter: I) -> Self {
        BlockList {
            blocks: iter.into_iter().collect(),
        }
    }
}
