use std::sync::Arc;

use serde_json::Value;

use crate::block::{Attributes, Block};
use crate::registry::{BlockTypeRegistry, DEFAULT_NAMESPACE};

/// Writes blocks back to markup. Round-trip partner of
/// [`MarkupParser`](crate::parser::MarkupParser).
pub trait MarkupSerializer {
    fn serialize(&self, blocks: &[Block]) -> String;
}

pub struct Serializer {
    registry: Arc<BlockTypeRegistry>,
}

impl Serializer {
    pub fn new(registry: Arc<BlockTypeRegistry>) -> Self {
        Serializer { registry }
    }

    /// One block in delimited form. Freeform blocks are wrapped too; only a
    /// top-level list (see [`MarkupSerializer::serialize`]) writes them bare.
    pub fn serialize_block(&self, block: &Block) -> String {
        if self.registry.unknown_type_handler() == Some(block.name.as_str()) {
            if let Some(original_name) = block.attribute_str("originalName") {
                let attributes = match block.attribute("originalAttributes") {
                    Some(Value::Object(map)) => map.clone(),
                    _ => Attributes::new(),
                };
                let content = block.attribute_str("originalContent").unwrap_or_default();
                return delimit(original_name, &attributes, content);
            }
        }

        let inner_blocks = self.serialize_nested(&block.inner_blocks);
        match self.registry.resolve(&block.name) {
            Some(block_type) => {
                let mut attributes = block.attributes.clone();
                for key in block_type.sourced_keys() {
                    attributes.remove(*key);
                }
                let html = if block_type.wraps_inner_blocks() {
                    block_type.save(&block.attributes, &inner_blocks)
                } else {
                    join_markup(&block_type.save(&block.attributes, ""), &inner_blocks)
                };
                delimit(&block.name, &attributes, &html)
            }
            None => {
                tracing::debug!(name = %block.name, "serializing unregistered block as-is");
                delimit(&block.name, &block.attributes, &inner_blocks)
            }
        }
    }

    fn serialize_nested(&self, blocks: &[Block]) -> String {
        blocks
            .iter()
            .map(|block| self.serialize_block(block))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn is_freeform(&self, block: &Block) -> bool {
        self.registry.freeform_handler() == Some(block.name.as_str())
    }

    /// A top-level freeform block can go out as bare HTML only if parsing
    /// reads it back as the same single block: non-blank content, no other
    /// attributes, no children, and no freeform neighbour to merge with.
    fn writes_bare(&self, blocks: &[Block], index: usize) -> bool {
        let Some(block) = blocks.get(index) else {
            return false;
        };
        if !self.is_freeform(block) || !block.inner_blocks.is_empty() {
            return false;
        }
        let has_content = block
            .attribute_str("content")
            .is_some_and(|content| !content.trim().is_empty());
        if !has_content || block.attributes.keys().any(|key| key != "content") {
            return false;
        }
        let freeform_at = |i: usize| blocks.get(i).is_some_and(|b| self.is_freeform(b));
        let before = index.checked_sub(1).is_some_and(freeform_at);
        !before && !freeform_at(index + 1)
    }
}

impl MarkupSerializer for Serializer {
    fn serialize(&self, blocks: &[Block]) -> String {
        (0..blocks.len())
            .map(|index| {
                let block = &blocks[index];
                if self.writes_bare(blocks, index) {
                    block.attribute_str("content").unwrap_or_default().to_string()
                } else {
                    self.serialize_block(block)
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Saved markup of a leaf block followed by its children's markup.
fn join_markup(html: &str, inner_blocks: &str) -> String {
    match (html.is_empty(), inner_blocks.is_empty()) {
        (_, true) => html.to_string(),
        (true, false) => inner_blocks.to_string(),
        (false, false) => format!("{}\n{}", html, inner_blocks),
    }
}

/// Wrap `content` in the block's comment delimiters.
fn delimit(name: &str, attributes: &Attributes, content: &str) -> String {
    let prefix = format!("{}/", DEFAULT_NAMESPACE);
    let name = name.strip_prefix(&prefix).unwrap_or(name);
    let attributes = if attributes.is_empty() {
        String::new()
    } else {
        format!("{} ", serialize_attributes(attributes))
    };

    if content.is_empty() {
        format!("<!-- wp:{} {}/-->", name, attributes)
    } else {
        format!(
            "<!-- wp:{} {}-->\n{}\n<!-- /wp:{} -->",
            name, attributes, content, name
        )
    }
}

/// JSON for a delimiter. Characters that could end the HTML comment or be
/// read as markup are written as `\u` escapes, which any JSON parser decodes.
pub fn serialize_attributes(attributes: &Attributes) -> String {
    let json = Value::Object(attributes.clone()).to_string();
    let mut out = String::with_capacity(json.len());
    let mut chars = json.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('"') => out.push_str("\\u0022"),
                Some(escaped) => {
                    out.push('\\');
                    out.push(escaped);
                }
                None => out.push('\\'),
            },
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                out.push_str("\\u002d\\u002d");
            }
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '&' => out.push_str("\\u0026"),
            _ => out.push(c),
        }
    }
    out
}
