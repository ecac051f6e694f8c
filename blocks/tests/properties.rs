use std::sync::Arc;

use blocks::{
    Attributes, Block, BlockTypeRegistry, MarkupParser, MarkupSerializer, Parser, Serializer,
};
use serde_json::{Value, json};

const TEXT: &[&str] = &["", "Hello", "a  b", "<em>x</em> y", "Лорем ипсум", "1 &amp; 2"];
const AWKWARD: &[&str] = &["--", "-->", "<b>", "\"q\"", "\\", ""];

fn text(n: u8) -> &'static str {
    TEXT[n as usize % TEXT.len()]
}

/// Attribute value mixing a fixed awkward fragment with generated text.
fn awkward(n: u8, generated: &str) -> Value {
    Value::String(format!("{}{}{}", AWKWARD[n as usize % AWKWARD.len()], generated, "--"))
}

fn attrs(value: Value) -> Attributes {
    match value {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

fn block(name: &str, value: Value) -> Block {
    Block::new(name, attrs(value))
}

/// Decode a generated triple into a block. Covers every built-in type,
/// unregistered types, void and nested blocks.
fn block_from(kind: u8, n: u8, generated: &str) -> Block {
    match kind % 9 {
        0 => block(
            "core/paragraph",
            json!({"content": text(n), "className": awkward(n, generated)}),
        ),
        1 => {
            let mut heading = block("core/heading", json!({"content": text(n)}));
            if n % 7 != 0 {
                heading.attributes.insert("level".into(), json!(n % 7));
            }
            heading
        }
        2 => block("core/code", json!({"content": text(n)})),
        3 if n % 2 == 0 => block(
            "core/image",
            json!({"url": "https://example.com/a.jpg?x=1&y=2", "alt": text(n)}),
        ),
        3 => block("core/image", json!({"alt": text(n), "note": awkward(n, generated)})),
        4 => block("core/more", json!({"customText": text(n)})),
        5 => block("core/freeform", json!({"content": text(n)})),
        6 => block(
            "core/missing",
            json!({
                "originalName": "acme/widget",
                "originalContent": text(n),
                "originalAttributes": {"note": awkward(n, generated)},
            }),
        ),
        7 => block("core/group", json!({"label": awkward(n, generated)})).with_inner_blocks(vec![
            block("core/paragraph", json!({"content": text(n)})),
            block("core/freeform", json!({"content": text(n.wrapping_add(1))})),
            block("core/more", json!({})),
        ]),
        _ => block("core/paragraph", json!({"content": text(n)})).with_inner_blocks(vec![
            block("core/freeform", json!({"content": text(n)})),
            block("core/more", json!({})),
        ]),
    }
}

/// Names, attributes and nesting; ids and validity flags left out.
fn shape(blocks: &[Block]) -> Value {
    Value::Array(
        blocks
            .iter()
            .map(|b| {
                json!({
                    "name": b.name,
                    "attributes": b.attributes,
                    "inner": shape(&b.inner_blocks),
                })
            })
            .collect(),
    )
}

fn round_trips(specs: &[(u8, u8, String)]) -> bool {
    let registry = Arc::new(BlockTypeRegistry::with_core_types());
    let parser = Parser::new(Arc::clone(&registry));
    let serializer = Serializer::new(registry);

    let generated: Vec<Block> = specs
        .iter()
        .map(|(kind, n, s)| block_from(*kind, *n, s))
        .collect();
    let Ok(parsed) = parser.parse(&serializer.serialize(&generated)) else {
        return false;
    };
    let Ok(reparsed) = parser.parse(&serializer.serialize(&parsed)) else {
        return false;
    };
    shape(&parsed) == shape(&reparsed)
}

quickcheck::quickcheck! {
    fn parsed_documents_round_trip(specs: Vec<(u8, u8, String)>) -> bool {
        round_trips(&specs)
    }
}

#[test]
fn every_kind_next_to_every_kind() {
    let generated = "x -- <y> \"z\" \\";
    for first in 0..9 {
        for second in 0..9 {
            for n in 0..6 {
                let specs = [
                    (first, n, generated.to_string()),
                    (second, n + 1, generated.to_string()),
                    (first, n + 2, String::new()),
                ];
                assert!(round_trips(&specs), "kinds {} and {} with text {}", first, second, n);
            }
        }
    }
}
