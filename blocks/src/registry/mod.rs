pub mod core_types;
pub mod html;

use std::collections::HashMap;

use crate::block::Attributes;

/// Namespace assumed for delimiter names written without one.
pub const DEFAULT_NAMESPACE: &str = "core";

/// Editing/rendering capability of one block type.
///
/// Attributes come from two places: the JSON object in the block's comment
/// delimiter, and the block's inner markup. A type lists the keys it reads
/// from markup in [`BlockType::sourced_keys`]; the serializer leaves those
/// out of the delimiter and relies on [`BlockType::save`] to write them.
pub trait BlockType: Send + Sync {
    /// Namespaced name, e.g. `core/paragraph`.
    fn name(&self) -> &str;

    /// Attributes a freshly created block starts with.
    fn default_attributes(&self) -> Attributes {
        Attributes::new()
    }

    fn sourced_keys(&self) -> &[&'static str] {
        &[]
    }

    /// Fill sourced attributes from the block's own markup (child blocks
    /// already removed). Delimiter attributes are already present.
    fn source(&self, _inner_html: &str, _attributes: &mut Attributes) {}

    /// Whether [`BlockType::save`] places the children's markup itself.
    /// When false the serializer writes the children after the saved markup.
    fn wraps_inner_blocks(&self) -> bool {
        false
    }

    /// Render the block's inner markup. `inner_blocks` is the serialized
    /// markup of the children, or empty for types that do not wrap them.
    fn save(&self, attributes: &Attributes, inner_blocks: &str) -> String;
}

/// The set of known block types, plus the handlers used for markup that
/// no registered type claims.
pub struct BlockTypeRegistry {
    types: HashMap<String, Box<dyn BlockType>>,
    unknown_type_handler: Option<String>,
    freeform_handler: Option<String>,
}

impl BlockTypeRegistry {
    pub fn new() -> Self {
        BlockTypeRegistry {
            types: HashMap::new(),
            unknown_type_handler: None,
            freeform_handler: None,
        }
    }

    /// Registry with the built-in types and both fallback handlers set.
    pub fn with_core_types() -> Self {
        let mut registry = BlockTypeRegistry::new();
        core_types::register_core_types(&mut registry);
        registry.set_unknown_type_handler(core_types::MISSING);
        registry.set_freeform_handler(core_types::FREEFORM);
        registry
    }

    /// Register a block type. Returns the type it replaced, if any.
    pub fn register(&mut self, block_type: Box<dyn BlockType>) -> Option<Box<dyn BlockType>> {
        let name = block_type.name().to_string();
        tracing::debug!(name = %name, "registering block type");
        self.types.insert(name, block_type)
    }

    pub fn resolve(&self, name: &str) -> Option<&dyn BlockType> {
        self.types.get(name).map(|b| b.as_ref())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn set_unknown_type_handler(&mut self, name: impl Into<String>) {
        self.unknown_type_handler = Some(name.into());
    }

    pub fn set_freeform_handler(&mut self, name: impl Into<String>) {
        self.freeform_handler = Some(name.into());
    }

    /// Type that stands in for blocks whose name is not registered.
    pub fn unknown_type_handler(&self) -> Option<&str> {
        self.unknown_type_handler.as_deref()
    }

    /// Type that holds HTML found outside any block delimiter.
    pub fn freeform_handler(&self) -> Option<&str> {
        self.freeform_handler.as_deref()
    }

    /// Sorted list of registered names.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// `paragraph` -> `core/paragraph`; namespaced names pass through.
    pub fn normalize_name(&self, name: &str) -> String {
        if name.contains('/') {
            name.to_string()
        } else {
            format!("{}/{}", DEFAULT_NAMESPACE, name)
        }
    }
}

impl Default for BlockTypeRegistry {
    fn default() -> Self {
        BlockTypeRegistry::new()
    }
}
