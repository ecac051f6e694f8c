//! Minimal HTML helpers for block types that source attributes from their
//! markup. These scan for a tag; they are not a general HTML parser.

/// Byte range of the first `<tag ...>` opening tag, `<` through `>`.
fn find_open_tag(html: &str, tag: &str) -> Option<(usize, usize)> {
    let needle = format!("<{}", tag);
    let mut from = 0;
    while let Some(pos) = html[from..].find(&needle) {
        let start = from + pos;
        let after = start + needle.len();
        match html[after..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => {
                let end = html[after..].find('>')? + after + 1;
                return Some((start, end));
            }
            _ => from = after,
        }
    }
    None
}

/// Inner markup of the first `<tag>` element, up to the last `</tag>`.
pub fn tag_inner<'a>(html: &'a str, tag: &str) -> Option<&'a str> {
    let (_, open_end) = find_open_tag(html, tag)?;
    let close = html[open_end..].rfind(&format!("</{}>", tag))? + open_end;
    Some(&html[open_end..close])
}

/// Decoded value of `attr` on the first `<tag>` element.
pub fn tag_attribute(html: &str, tag: &str, attr: &str) -> Option<String> {
    let (start, end) = find_open_tag(html, tag)?;
    let open = &html[start..end];
    for quote in ['"', '\''] {
        let needle = format!(" {}={}", attr, quote);
        if let Some(pos) = open.find(&needle) {
            let value_start = pos + needle.len();
            let value_end = open[value_start..].find(quote)? + value_start;
            return Some(decode_entities(&open[value_start..value_end]));
        }
    }
    None
}

pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Whitespace-insensitive form of a markup fragment, used to decide whether
/// a block's saved output matches what was parsed. Runs of whitespace
/// collapse to one space; whitespace next to a tag boundary is dropped.
pub fn normalize_markup(html: &str) -> String {
    let collapsed = html.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.replace("> ", ">").replace(" <", "<")
}
