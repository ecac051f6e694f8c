use serde_json::Value;

use crate::block::Attributes;
use crate::registry::html::{escape_attribute, tag_attribute, tag_inner};
use crate::registry::{BlockType, BlockTypeRegistry};

pub const PARAGRAPH: &str = "core/paragraph";
pub const HEADING: &str = "core/heading";
pub const CODE: &str = "core/code";
pub const IMAGE: &str = "core/image";
pub const MORE: &str = "core/more";
pub const GROUP: &str = "core/group";
pub const FREEFORM: &str = "core/freeform";
pub const MISSING: &str = "core/missing";

pub fn register_core_types(registry: &mut BlockTypeRegistry) {
    registry.register(Box::new(Paragraph));
    registry.register(Box::new(Heading));
    registry.register(Box::new(Code));
    registry.register(Box::new(Image));
    registry.register(Box::new(More));
    registry.register(Box::new(Group));
    registry.register(Box::new(Freeform));
    registry.register(Box::new(Missing));
}

fn str_attr<'a>(attributes: &'a Attributes, key: &str) -> Option<&'a str> {
    attributes.get(key).and_then(Value::as_str)
}

fn content_default() -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert("content".into(), Value::String(String::new()));
    attributes
}

pub struct Paragraph;

impl BlockType for Paragraph {
    fn name(&self) -> &str {
        PARAGRAPH
    }

    fn default_attributes(&self) -> Attributes {
        content_default()
    }

    fn sourced_keys(&self) -> &[&'static str] {
        &["content"]
    }

    fn source(&self, inner_html: &str, attributes: &mut Attributes) {
        let content = tag_inner(inner_html, "p").unwrap_or_default();
        attributes.insert("content".into(), Value::String(content.to_string()));
    }

    fn save(&self, attributes: &Attributes, _inner_blocks: &str) -> String {
        format!("<p>{}</p>", str_attr(attributes, "content").unwrap_or_default())
    }
}

pub struct Heading;

impl Heading {
    fn level(attributes: &Attributes) -> u64 {
        attributes
            .get("level")
            .and_then(Value::as_u64)
            .filter(|level| (1..=6).contains(level))
            .unwrap_or(2)
    }
}

impl BlockType for Heading {
    fn name(&self) -> &str {
        HEADING
    }

    fn default_attributes(&self) -> Attributes {
        content_default()
    }

    fn sourced_keys(&self) -> &[&'static str] {
        &["content"]
    }

    fn source(&self, inner_html: &str, attributes: &mut Attributes) {
        let tag = format!("h{}", Heading::level(attributes));
        let content = tag_inner(inner_html, &tag).unwrap_or_default();
        attributes.insert("content".into(), Value::String(content.to_string()));
    }

    fn save(&self, attributes: &Attributes, _inner_blocks: &str) -> String {
        let level = Heading::level(attributes);
        format!(
            "<h{level}>{}</h{level}>",
            str_attr(attributes, "content").unwrap_or_default()
        )
    }
}

pub struct Code;

impl BlockType for Code {
    fn name(&self) -> &str {
        CODE
    }

    fn default_attributes(&self) -> Attributes {
        content_default()
    }

    fn sourced_keys(&self) -> &[&'static str] {
        &["content"]
    }

    fn source(&self, inner_html: &str, attributes: &mut Attributes) {
        let content = tag_inner(inner_html, "pre")
            .and_then(|pre| tag_inner(pre, "code"))
            .unwrap_or_default();
        attributes.insert("content".into(), Value::String(content.to_string()));
    }

    fn save(&self, attributes: &Attributes, _inner_blocks: &str) -> String {
        format!(
            "<pre class=\"wp-block-code\"><code>{}</code></pre>",
            str_attr(attributes, "content").unwrap_or_default()
        )
    }
}

pub struct Image;

impl BlockType for Image {
    fn name(&self) -> &str {
        IMAGE
    }

    fn default_attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("alt".into(), Value::String(String::new()));
        attributes
    }

    fn sourced_keys(&self) -> &[&'static str] {
        &["url", "alt"]
    }

    fn source(&self, inner_html: &str, attributes: &mut Attributes) {
        if let Some(url) = tag_attribute(inner_html, "img", "src") {
            attributes.insert("url".into(), Value::String(url));
        }
        let alt = tag_attribute(inner_html, "img", "alt").unwrap_or_default();
        attributes.insert("alt".into(), Value::String(alt));
    }

    fn save(&self, attributes: &Attributes, _inner_blocks: &str) -> String {
        let alt = escape_attribute(str_attr(attributes, "alt").unwrap_or_default());
        match str_attr(attributes, "url") {
            Some(url) => format!(
                "<figure class=\"wp-block-image\"><img src=\"{}\" alt=\"{}\"/></figure>",
                escape_attribute(url),
                alt
            ),
            None => format!("<figure class=\"wp-block-image\"><img alt=\"{}\"/></figure>", alt),
        }
    }
}

/// Read-more marker, saved as a plain `<!--more-->` HTML comment.
pub struct More;

impl BlockType for More {
    fn name(&self) -> &str {
        MORE
    }

    fn sourced_keys(&self) -> &[&'static str] {
        &["customText"]
    }

    fn source(&self, inner_html: &str, attributes: &mut Attributes) {
        let Some(start) = inner_html.find("<!--more") else {
            return;
        };
        let rest = &inner_html[start + "<!--more".len()..];
        let Some(end) = rest.find("-->") else {
            return;
        };
        let text = rest[..end].trim();
        if !text.is_empty() {
            attributes.insert("customText".into(), Value::String(text.to_string()));
        }
    }

    fn save(&self, attributes: &Attributes, _inner_blocks: &str) -> String {
        match str_attr(attributes, "customText") {
            Some(text) if !text.is_empty() => format!("<!--more {}-->", text),
            _ => "<!--more-->".to_string(),
        }
    }
}

/// Container whose markup wraps its children.
pub struct Group;

impl BlockType for Group {
    fn name(&self) -> &str {
        GROUP
    }

    fn wraps_inner_blocks(&self) -> bool {
        true
    }

    fn save(&self, _attributes: &Attributes, inner_blocks: &str) -> String {
        format!("<div class=\"wp-block-group\">{}</div>", inner_blocks)
    }
}

/// HTML that sits outside any block delimiter. Written bare at top level
/// when that reads back as the same block, delimited otherwise.
pub struct Freeform;

impl BlockType for Freeform {
    fn name(&self) -> &str {
        FREEFORM
    }

    fn default_attributes(&self) -> Attributes {
        content_default()
    }

    fn sourced_keys(&self) -> &[&'static str] {
        &["content"]
    }

    fn source(&self, inner_html: &str, attributes: &mut Attributes) {
        attributes.insert("content".into(), Value::String(inner_html.trim().to_string()));
    }

    fn save(&self, attributes: &Attributes, _inner_blocks: &str) -> String {
        str_attr(attributes, "content").unwrap_or_default().to_string()
    }
}

/// Stand-in for a block whose type is not registered. Keeps the original
/// name, delimiter attributes and raw inner markup so it can be written back.
pub struct Missing;

impl BlockType for Missing {
    fn name(&self) -> &str {
        MISSING
    }

    fn save(&self, attributes: &Attributes, _inner_blocks: &str) -> String {
        str_attr(attributes, "originalContent").unwrap_or_default().to_string()
    }
}
