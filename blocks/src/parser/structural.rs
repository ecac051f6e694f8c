use std::ops::Range;

use serde_json::Value;

use crate::block::client_id::ClientId;
use crate::block::{Attributes, Block};
use crate::parser::error::ParseError;
use crate::registry::BlockTypeRegistry;
use crate::registry::html::normalize_markup;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse block markup into a list of top-level blocks.
pub fn parse_blocks(
    source: &str,
    file_id: usize,
    registry: &BlockTypeRegistry,
) -> Result<Vec<Block>, Vec<ParseError>> {
    let mut state = ParseState::new(source, file_id, registry);
    state.process();
    state.finalize()
}

// ---------------------------------------------------------------------------
// Delimiter tokens
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum Delimiter {
    /// `<!-- wp:name {attrs} -->`, or `<!-- wp:name {attrs} /-->` when void.
    Opener {
        name: String,
        attributes: Attributes,
        void: bool,
    },
    /// `<!-- /wp:name -->`
    Closer { name: String },
}

#[derive(Debug)]
struct Token {
    delimiter: Delimiter,
    span: Range<usize>,
}

/// Find the next block delimiter at or after `from`. Ordinary HTML comments
/// are skipped and stay part of the surrounding markup.
fn next_token(source: &str, from: usize, file_id: usize) -> Result<Option<Token>, ParseError> {
    let mut cursor = from;
    loop {
        let Some(pos) = source[cursor..].find("<!--") else {
            return Ok(None);
        };
        let start = cursor + pos;
        let body_start = start + "<!--".len();

        let Some(body_len) = source[body_start..].find("-->") else {
            if looks_like_delimiter(&source[body_start..]) {
                return Err(ParseError::new(
                    "unterminated block delimiter",
                    start..source.len(),
                    file_id,
                )
                .with_note("block delimiters end with `-->`"));
            }
            return Ok(None);
        };
        let body = &source[body_start..body_start + body_len];
        let end = body_start + body_len + "-->".len();

        if !looks_like_delimiter(body) {
            cursor = end;
            continue;
        }

        let delimiter =
            parse_delimiter(body).map_err(|message| ParseError::new(message, start..end, file_id))?;
        return Ok(Some(Token {
            delimiter,
            span: start..end,
        }));
    }
}

/// Delimiters need whitespace after `<!--`, then `wp:` or `/wp:`.
fn looks_like_delimiter(body: &str) -> bool {
    let starts_with_space = body.chars().next().is_some_and(char::is_whitespace);
    let trimmed = body.trim_start();
    starts_with_space && (trimmed.starts_with("wp:") || trimmed.starts_with("/wp:"))
}

fn parse_delimiter(body: &str) -> Result<Delimiter, String> {
    let trimmed = body.trim();

    if let Some(rest) = trimmed.strip_prefix("/wp:") {
        let (name, remainder) = split_name(rest)?;
        if !remainder.trim().is_empty() {
            return Err(format!(
                "unexpected text `{}` in closing delimiter",
                remainder.trim()
            ));
        }
        return Ok(Delimiter::Closer { name });
    }

    let Some(rest) = trimmed.strip_prefix("wp:") else {
        return Err("expected `wp:` in block delimiter".to_string());
    };
    let (name, remainder) = split_name(rest)?;
    let remainder = remainder.trim();
    let (remainder, void) = match remainder.strip_suffix('/') {
        Some(r) => (r.trim_end(), true),
        None => (remainder, false),
    };

    let attributes = if remainder.is_empty() {
        Attributes::new()
    } else if remainder.starts_with('{') {
        serde_json::from_str::<Attributes>(remainder)
            .map_err(|e| format!("invalid block attributes: {}", e))?
    } else {
        return Err(format!("unexpected text `{}` in block delimiter", remainder));
    };

    Ok(Delimiter::Opener {
        name,
        attributes,
        void,
    })
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' || c == '/'
}

/// Split `name rest...` and validate the name: one or two `/`-separated
/// segments, each starting with a lowercase letter.
fn split_name(text: &str) -> Result<(String, &str), String> {
    let len = text.find(|c: char| !is_name_char(c)).unwrap_or(text.len());
    let name = &text[..len];
    let segments: Vec<&str> = name.split('/').collect();
    let valid = segments.len() <= 2
        && segments.iter().all(|segment| {
            segment
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_lowercase())
        });
    if !valid {
        return Err(format!("invalid block name `{}`", name));
    }
    Ok((name.to_string(), &text[len..]))
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

struct ParseState<'a> {
    source: &'a str,
    file_id: usize,
    registry: &'a BlockTypeRegistry,
    /// Blocks whose closing delimiter has not been seen. Innermost last.
    stack: Vec<BlockBuilder>,
    /// Completed top-level blocks.
    top_blocks: Vec<Block>,
    /// HTML seen at top level since the last block.
    freeform: String,
    errors: Vec<ParseError>,
}

struct BlockBuilder {
    name: String,
    attributes: Attributes,
    inner_blocks: Vec<Block>,
    /// The block's own markup with child blocks cut out.
    html: String,
    /// Byte offset just past the opening delimiter.
    content_start: usize,
    /// Span of the opening delimiter.
    span: Range<usize>,
}

impl<'a> ParseState<'a> {
    fn new(source: &'a str, file_id: usize, registry: &'a BlockTypeRegistry) -> Self {
        ParseState {
            source,
            file_id,
            registry,
            stack: Vec::new(),
            top_blocks: Vec::new(),
            freeform: String::new(),
            errors: Vec::new(),
        }
    }

    fn process(&mut self) {
        let source = self.source;
        let mut cursor = 0;

        loop {
            let token = match next_token(source, cursor, self.file_id) {
                Ok(Some(token)) => token,
                Ok(None) => {
                    self.push_html(&source[cursor..]);
                    break;
                }
                Err(error) => {
                    self.errors.push(error);
                    break;
                }
            };

            self.push_html(&source[cursor..token.span.start]);
            cursor = token.span.end;

            match token.delimiter {
                Delimiter::Opener {
                    name,
                    attributes,
                    void,
                } => {
                    let builder = BlockBuilder {
                        name: self.registry.normalize_name(&name),
                        attributes,
                        inner_blocks: Vec::new(),
                        html: String::new(),
                        content_start: token.span.end,
                        span: token.span,
                    };
                    if void {
                        if let Some(block) = self.build_block(builder, "") {
                            self.attach(block);
                        }
                    } else {
                        self.stack.push(builder);
                    }
                }
                Delimiter::Closer { name } => self.close(&name, token.span),
            }
        }
    }

    fn close(&mut self, name: &str, span: Range<usize>) {
        let name = self.registry.normalize_name(name);
        let Some(builder) = self.stack.pop() else {
            self.errors.push(ParseError::new(
                format!("closing delimiter for `{}` without a matching opener", name),
                span,
                self.file_id,
            ));
            return;
        };

        if builder.name != name {
            self.errors.push(
                ParseError::new(
                    format!(
                        "mismatched closing delimiter: expected `{}`, found `{}`",
                        builder.name, name
                    ),
                    span.clone(),
                    self.file_id,
                )
                .with_note(format!("`{}` opened at byte {}", builder.name, builder.span.start)),
            );
        }

        let source = self.source;
        let raw_inner = &source[builder.content_start..span.start];
        if let Some(block) = self.build_block(builder, raw_inner) {
            self.attach(block);
        }
    }

    fn push_html(&mut self, text: &str) {
        match self.stack.last_mut() {
            Some(builder) => builder.html.push_str(text),
            None => self.freeform.push_str(text),
        }
    }

    fn attach(&mut self, block: Block) {
        match self.stack.last_mut() {
            Some(parent) => parent.inner_blocks.push(block),
            None => {
                self.flush_freeform();
                self.top_blocks.push(block);
            }
        }
    }

    /// Turn pending top-level HTML into a freeform block.
    fn flush_freeform(&mut self) {
        let html = std::mem::take(&mut self.freeform);
        if html.trim().is_empty() {
            return;
        }
        let freeform = self
            .registry
            .freeform_handler()
            .and_then(|name| self.registry.resolve(name));
        match freeform {
            Some(block_type) => {
                let mut attributes = Attributes::new();
                block_type.source(&html, &mut attributes);
                self.top_blocks.push(Block::new(block_type.name(), attributes));
            }
            None => {
                tracing::warn!(
                    len = html.len(),
                    "dropping HTML outside block delimiters: no freeform handler"
                );
            }
        }
    }

    fn build_block(&mut self, builder: BlockBuilder, raw_inner: &str) -> Option<Block> {
        if let Some(block_type) = self.registry.resolve(&builder.name) {
            let mut attributes = builder.attributes;
            block_type.source(&builder.html, &mut attributes);
            let is_valid =
                normalize_markup(&block_type.save(&attributes, "")) == normalize_markup(&builder.html);
            if !is_valid {
                tracing::warn!(
                    name = %builder.name,
                    offset = builder.span.start,
                    "block markup differs from its saved form"
                );
            }
            return Some(Block {
                client_id: ClientId::generate(),
                name: builder.name,
                attributes,
                inner_blocks: builder.inner_blocks,
                focused: false,
                is_valid,
            });
        }

        let Some(handler) = self.registry.unknown_type_handler() else {
            self.errors.push(ParseError::new(
                format!("unknown block type `{}`", builder.name),
                builder.span,
                self.file_id,
            ));
            return None;
        };

        tracing::debug!(name = %builder.name, handler, "unregistered block type");
        let mut attributes = Attributes::new();
        attributes.insert("originalName".into(), Value::String(builder.name));
        attributes.insert(
            "originalContent".into(),
            Value::String(raw_inner.trim().to_string()),
        );
        if !builder.attributes.is_empty() {
            attributes.insert(
                "originalAttributes".into(),
                Value::Object(builder.attributes),
            );
        }
        Some(Block::new(handler, attributes))
    }

    fn finalize(mut self) -> Result<Vec<Block>, Vec<ParseError>> {
        while let Some(builder) = self.stack.pop() {
            self.errors.push(
                ParseError::new(
                    format!("unclosed block `{}`", builder.name),
                    builder.span,
                    self.file_id,
                )
                .with_note("expected a matching closing delimiter `<!-- /wp:... -->`"),
            );
        }
        self.flush_freeform();

        if self.errors.is_empty() {
            Ok(self.top_blocks)
        } else {
            self.errors.sort_by_key(|e| e.span.start);
            Err(self.errors)
        }
    }
}
