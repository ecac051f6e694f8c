pub mod client_id;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::block::client_id::ClientId;
use crate::registry::BlockTypeRegistry;

/// Block attributes: string keys to arbitrary JSON values.
/// Their meaning belongs to the block type; the store only compares them.
pub type Attributes = serde_json::Map<String, Value>;

/// One editable content unit of a document (paragraph, image, code, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Identity, unique within a collection.
    #[serde(default = "ClientId::generate")]
    pub client_id: ClientId,
    /// Namespaced type name, e.g. `core/paragraph`.
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
    /// Nested blocks. Top-level store operations never touch these.
    #[serde(default)]
    pub inner_blocks: Vec<Block>,
    #[serde(default)]
    pub focused: bool,
    /// False when re-saving the parsed attributes did not reproduce the
    /// block's original markup.
    #[serde(default = "default_valid")]
    pub is_valid: bool,
}

fn default_valid() -> bool {
    true
}

impl Block {
    /// A new, unfocused block with a freshly generated id.
    pub fn new(name: impl Into<String>, attributes: Attributes) -> Self {
        Block {
            client_id: ClientId::generate(),
            name: name.into(),
            attributes,
            inner_blocks: Vec::new(),
            focused: false,
            is_valid: true,
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<ClientId>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_inner_blocks(mut self, inner_blocks: Vec<Block>) -> Self {
        self.inner_blocks = inner_blocks;
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// String attribute lookup; `None` for absent or non-string values.
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// Create a block of `name` with the type's default attributes, overridden
/// by `attributes`. Unregistered names get no defaults.
pub fn create_block(registry: &BlockTypeRegistry, name: &str, attributes: Attributes) -> Block {
    let name = registry.normalize_name(name);
    let mut merged = registry
        .resolve(&name)
        .map(|block_type| block_type.default_attributes())
        .unwrap_or_default();
    merged.extend(attributes);
    Block::new(name, merged)
}
