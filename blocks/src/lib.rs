pub mod block;
pub mod parser;
pub mod registry;
pub mod serializer;

pub use block::client_id::ClientId;
pub use block::{Attributes, Block, create_block};
pub use parser::{MarkupParser, ParseError, Parser};
pub use registry::{BlockType, BlockTypeRegistry};
pub use serializer::{MarkupSerializer, Serializer};
