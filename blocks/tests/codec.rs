use std::sync::Arc;

use blocks::{Block, BlockTypeRegistry, MarkupParser, MarkupSerializer, Parser, Serializer};
use serde_json::json;

const SAMPLE: &str = r#"
<!-- wp:image -->
<figure class="wp-block-image"><img alt=""/></figure>
<!-- /wp:image -->

<!-- wp:image -->
<figure class="wp-block-image"><img src="https://cldup.com/cXyG__fTLN.jpg" alt=""/></figure>
<!-- /wp:image -->

<!-- wp:heading {"level": 2} -->
<h2>Welcome to Gutenberg</h2>
<!-- /wp:heading -->

<!-- wp:paragraph -->
<p><b>Hello</b> World!</p>
<!-- /wp:paragraph -->

<!-- wp:paragraph {"dropCap":true,"backgroundColor":"vivid-red","fontSize":"large","className":"custom-class-1 custom-class-2"} -->
<p class="has-background has-drop-cap has-large-font-size has-vivid-red-background-color custom-class-1 custom-class-2">
Lorem ipsum dolor sit amet.</p>
<!-- /wp:paragraph -->

<!-- wp:code -->
<pre class="wp-block-code"><code>if name == "World":
    return "Hello World"
else:
    return "Hello Pony"</code></pre>
<!-- /wp:code -->

<!-- wp:more -->
<!--more-->
<!-- /wp:more -->

<!-- wp:p4ragraph -->
Лорем ипсум долор сит амет.
<!-- /wp:p4ragraph -->
"#;

fn codec() -> (Parser, Serializer) {
    let registry = Arc::new(BlockTypeRegistry::with_core_types());
    (
        Parser::new(Arc::clone(&registry)),
        Serializer::new(registry),
    )
}

fn parse(source: &str) -> Vec<Block> {
    let (parser, _) = codec();
    parser.parse(source).expect("parse failed")
}

fn names(blocks: &[Block]) -> Vec<&str> {
    blocks.iter().map(|b| b.name.as_str()).collect()
}

#[test]
fn sample_document_block_names() {
    let blocks = parse(SAMPLE);
    assert_eq!(
        names(&blocks),
        vec![
            "core/image",
            "core/image",
            "core/heading",
            "core/paragraph",
            "core/paragraph",
            "core/code",
            "core/more",
            "core/missing",
        ]
    );
    assert!(blocks.iter().all(|b| !b.focused));
}

#[test]
fn sample_document_attributes() {
    let blocks = parse(SAMPLE);
    assert_eq!(blocks[1].attribute_str("url"), Some("https://cldup.com/cXyG__fTLN.jpg"));
    assert_eq!(blocks[2].attribute("level"), Some(&json!(2)));
    assert_eq!(blocks[2].attribute_str("content"), Some("Welcome to Gutenberg"));
    assert_eq!(blocks[3].attribute_str("content"), Some("<b>Hello</b> World!"));
    assert_eq!(blocks[4].attribute("dropCap"), Some(&json!(true)));
    assert!(blocks[5].attribute_str("content").unwrap().contains("Hello Pony"));
    assert_eq!(blocks[7].attribute_str("originalName"), Some("core/p4ragraph"));
    assert_eq!(
        blocks[7].attribute_str("originalContent"),
        Some("Лорем ипсум долор сит амет.")
    );
}

#[test]
fn validity_flags() {
    let blocks = parse(SAMPLE);
    // Saving drops the paragraph's classes, so that one does not match.
    assert!(!blocks[4].is_valid);
    for (i, block) in blocks.iter().enumerate() {
        if i != 4 {
            assert!(block.is_valid, "block {} ({}) should be valid", i, block.name);
        }
    }
}

#[test]
fn client_ids_are_unique_and_fresh() {
    let first = parse(SAMPLE);
    let second = parse(SAMPLE);
    let mut ids: Vec<_> = first.iter().map(|b| b.client_id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), first.len());
    assert!(first.iter().zip(&second).all(|(a, b)| a.client_id != b.client_id));
    assert!(first.iter().zip(&second).all(|(a, b)| a.name == b.name && a.attributes == b.attributes));
}

#[test]
fn round_trip_preserves_names_and_attributes() {
    let (parser, serializer) = codec();
    let blocks = parser.parse(SAMPLE).unwrap();
    let markup = serializer.serialize(&blocks);
    let reparsed = parser.parse(&markup).unwrap();
    assert_eq!(reparsed.len(), blocks.len());
    for (a, b) in blocks.iter().zip(&reparsed) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.attributes, b.attributes);
    }
}

#[test]
fn round_trip_with_awkward_attribute_values() {
    let (parser, serializer) = codec();
    let source = r#"<!-- wp:paragraph {"note":"a \u002d\u002d\u003e b \u003c!\u0022","n":-1} -->
<p>x</p>
<!-- /wp:paragraph -->"#;
    let blocks = parser.parse(source).unwrap();
    assert_eq!(blocks[0].attribute_str("note"), Some("a --> b <!\""));
    let reparsed = parser.parse(&serializer.serialize(&blocks)).unwrap();
    assert_eq!(reparsed[0].attributes, blocks[0].attributes);
}

#[test]
fn nested_blocks() {
    let (parser, serializer) = codec();
    let source = "<!-- wp:group -->\n<div class=\"wp-block-group\">\
        <!-- wp:paragraph --><p>one</p><!-- /wp:paragraph -->\
        <!-- wp:paragraph --><p>two</p><!-- /wp:paragraph -->\
        </div>\n<!-- /wp:group -->";
    let blocks = parser.parse(source).unwrap();
    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].is_valid);
    let inner = &blocks[0].inner_blocks;
    assert_eq!(names(inner), vec!["core/paragraph", "core/paragraph"]);
    assert_eq!(inner[1].attribute_str("content"), Some("two"));

    let reparsed = parser.parse(&serializer.serialize(&blocks)).unwrap();
    assert_eq!(reparsed[0].inner_blocks.len(), 2);
    assert_eq!(reparsed[0].inner_blocks[0].attributes, inner[0].attributes);
}

#[test]
fn void_blocks() {
    let blocks = parse("<!-- wp:acme/chart {\"series\":[1,2]} /-->");
    assert_eq!(blocks[0].name, "core/missing");
    assert_eq!(blocks[0].attribute_str("originalName"), Some("acme/chart"));
    assert_eq!(
        blocks[0].attribute("originalAttributes"),
        Some(&json!({"series": [1, 2]}))
    );
}

#[test]
fn html_outside_delimiters_becomes_freeform() {
    let blocks = parse("<p>before</p>\n<!-- wp:more -->\n<!--more-->\n<!-- /wp:more -->\n<p>after</p>\n");
    assert_eq!(names(&blocks), vec!["core/freeform", "core/more", "core/freeform"]);
    assert_eq!(blocks[0].attribute_str("content"), Some("<p>before</p>"));
    assert_eq!(blocks[2].attribute_str("content"), Some("<p>after</p>"));
}

#[test]
fn empty_and_whitespace_input() {
    assert!(parse("").is_empty());
    assert!(parse("  \n\n ").is_empty());
}

#[test]
fn malformed_markup_is_reported() {
    let (parser, _) = codec();

    let errors = parser
        .parse("<!-- wp:paragraph -->\n<p>x</p>\n")
        .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("unclosed block"));
    assert_eq!(errors[0].span, 0..21);

    let errors = parser
        .parse("<!-- wp:paragraph --><p>x</p><!-- /wp:heading -->")
        .unwrap_err();
    assert!(errors[0].message.contains("mismatched closing delimiter"));

    let errors = parser.parse("<!-- /wp:paragraph -->").unwrap_err();
    assert!(errors[0].message.contains("without a matching opener"));

    let errors = parser
        .parse("<!-- wp:paragraph {\"a\": } -->x<!-- /wp:paragraph -->")
        .unwrap_err();
    assert!(errors[0].message.contains("invalid block attributes"));
}

#[test]
fn unknown_type_without_handler_is_an_error() {
    let mut registry = BlockTypeRegistry::new();
    blocks::registry::core_types::register_core_types(&mut registry);
    let parser = Parser::new(Arc::new(registry)).with_file_id(7);
    let errors = parser.parse("<!-- wp:acme/chart /-->").unwrap_err();
    assert_eq!(errors[0].file_id, 7);
    assert!(errors[0].message.contains("unknown block type `acme/chart`"));
}

fn shape(blocks: &[Block]) -> Vec<(String, serde_json::Value, usize)> {
    blocks
        .iter()
        .map(|b| {
            (
                b.name.clone(),
                serde_json::Value::Object(b.attributes.clone()),
                b.inner_blocks.len(),
            )
        })
        .collect()
}

fn reparse(blocks: &[Block]) -> Vec<Block> {
    let (parser, serializer) = codec();
    parser
        .parse(&serializer.serialize(blocks))
        .expect("serialized markup failed to parse")
}

#[test]
fn adjacent_freeform_blocks_stay_apart() {
    let blocks = parse(
        "<!-- wp:freeform -->a<!-- /wp:freeform --><!-- wp:freeform -->b<!-- /wp:freeform -->",
    );
    assert_eq!(names(&blocks), vec!["core/freeform", "core/freeform"]);
    let reparsed = reparse(&blocks);
    assert_eq!(shape(&reparsed), shape(&blocks));
    assert_eq!(reparsed[1].attribute_str("content"), Some("b"));
}

#[test]
fn blank_freeform_block_survives() {
    let blocks = parse("<!-- wp:freeform -->  <!-- /wp:freeform --><!-- wp:more /-->");
    assert_eq!(names(&blocks), vec!["core/freeform", "core/more"]);
    assert_eq!(blocks[0].attribute_str("content"), Some(""));
    assert_eq!(shape(&reparse(&blocks)), shape(&blocks));
}

#[test]
fn nested_freeform_keeps_its_delimiters() {
    let blocks = parse(
        "<!-- wp:group --><div class=\"wp-block-group\">\
         <!-- wp:freeform --><p>loose</p><!-- /wp:freeform -->\
         </div><!-- /wp:group -->",
    );
    assert_eq!(names(&blocks[0].inner_blocks), vec!["core/freeform"]);
    let reparsed = reparse(&blocks);
    assert_eq!(shape(&reparsed), shape(&blocks));
    assert_eq!(shape(&reparsed[0].inner_blocks), shape(&blocks[0].inner_blocks));
}

#[test]
fn lone_top_level_freeform_is_written_bare() {
    let (_, serializer) = codec();
    let blocks = parse("<p>before</p>\n<!-- wp:more /-->");
    let markup = serializer.serialize(&blocks);
    assert!(markup.starts_with("<p>before</p>\n\n<!-- wp:more"), "{}", markup);
}

#[test]
fn children_of_leaf_blocks_are_kept() {
    let blocks = parse("<!-- wp:paragraph --><p>a</p><!-- wp:more /--><!-- /wp:paragraph -->");
    assert_eq!(blocks[0].inner_blocks.len(), 1);
    assert_eq!(blocks[0].attribute_str("content"), Some("a"));

    let reparsed = reparse(&blocks);
    assert_eq!(shape(&reparsed), shape(&blocks));
    assert_eq!(names(&reparsed[0].inner_blocks), vec!["core/more"]);
    assert_eq!(reparsed[0].attribute_str("content"), Some("a"));
}
