pub mod error;
mod structural;

pub use error::ParseError;

use std::sync::Arc;

use crate::block::Block;
use crate::registry::BlockTypeRegistry;

/// Turns raw block markup into an ordered list of blocks.
///
/// Identical input yields identical names and attributes; every call hands
/// out fresh client ids.
pub trait MarkupParser {
    fn parse(&self, source: &str) -> Result<Vec<Block>, Vec<ParseError>>;
}

/// Parser for comment-delimited block markup.
pub struct Parser {
    registry: Arc<BlockTypeRegistry>,
    file_id: usize,
}

impl Parser {
    pub fn new(registry: Arc<BlockTypeRegistry>) -> Self {
        Parser {
            registry,
            file_id: 0,
        }
    }

    /// File id stamped on errors, for codespan-reporting.
    pub fn with_file_id(mut self, file_id: usize) -> Self {
        self.file_id = file_id;
        self
    }

    pub fn registry(&self) -> &BlockTypeRegistry {
        &self.registry
    }
}

impl MarkupParser for Parser {
    fn parse(&self, source: &str) -> Result<Vec<Block>, Vec<ParseError>> {
        let blocks = structural::parse_blocks(source, self.file_id, &self.registry)?;
        tracing::debug!(count = blocks.len(), "parsed markup");
        Ok(blocks)
    }
}
