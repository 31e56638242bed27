//! Syntactic scanning of HTML tags. Only the shape recognized by the span
//! and block passes is accepted: a name, then attributes that must carry a
//! quoted value, then an optional trailing slash.

#[derive(Clone, Debug, PartialEq)]
pub struct Tag {
    pub name: String,
    pub is_closing: bool,
    /// Bytes consumed by the whole `<...>` form.
    pub len: usize,
    /// Number of `attr="value"` pairs seen.
    pub attrs: usize,
}

impl Tag {
    /// Everything between the angle brackets.
    pub fn contents<'a>(&self, source: &'a str) -> &'a str {
        &source[1..self.len - 1]
    }
}

/// Parse a tag at the start of `text`.
pub fn parse_tag_prefix(text: &str, min_attrs: usize) -> Option<Tag> {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'<') {
        return None;
    }
    let mut i = 1;
    let is_closing = bytes.get(i) == Some(&b'/');
    if is_closing {
        i += 1;
    }
    let name_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    let name_end = i;
    let mut attrs = 0;
    loop {
        match parse_attr(bytes, i) {
            Some(next) => {
                i = next;
                attrs += 1;
            }
            None => break,
        }
    }
    if attrs < min_attrs {
        return None;
    }
    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    if bytes.get(i) == Some(&b'/') {
        i += 1;
    }
    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    if bytes.get(i) != Some(&b'>') {
        return None;
    }
    Some(Tag {
        name: text[name_start..name_end].to_string(),
        is_closing,
        len: i + 1,
        attrs,
    })
}

/// Parse a tag that spans the entire string.
pub fn parse_tag_alone(text: &str, min_attrs: usize) -> Option<Tag> {
    parse_tag_prefix(text, min_attrs).filter(|tag| tag.len == text.len())
}

/// Find the next parseable tag at or after `from`.
pub fn find_tag(text: &str, from: usize, min_attrs: usize) -> Option<(usize, Tag)> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            if let Some(tag) = parse_tag_prefix(&text[i..], min_attrs) {
                return Some((i, tag));
            }
        }
        i += 1;
    }
    None
}

// One ` attr="value"` group: leading spaces, alphanumeric name, `=` with an
// optional space on either side, then a quoted value.
fn parse_attr(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start;
    let mut spaces = 0;
    while bytes.get(i) == Some(&b' ') {
        i += 1;
        spaces += 1;
    }
    if spaces == 0 {
        return None;
    }
    let name_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    if bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    if bytes.get(i) != Some(&b'=') {
        return None;
    }
    i += 1;
    if bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    let quote = match bytes.get(i) {
        Some(&q @ (b'"' | b'\'')) => q,
        _ => return None,
    };
    i += 1;
    while i < bytes.len() && bytes[i] != quote {
        i += 1;
    }
    if i >= bytes.len() {
        return None;
    }
    Some(i + 1)
}

/// True when the entire line is an unterminated tag opening (`<div a="b"`),
/// the first half of a tag split across two lines.
pub fn is_open_tag_fragment(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.first() != Some(&b'<') {
        return false;
    }
    let mut i = 1;
    if bytes.get(i) == Some(&b'/') {
        i += 1;
    }
    let name_start = i;
    while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
        i += 1;
    }
    if i == name_start {
        return false;
    }
    while let Some(next) = parse_attr(bytes, i) {
        i = next;
    }
    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    if bytes.get(i) == Some(&b'/') {
        i += 1;
    }
    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    i == bytes.len()
}

/// True when the entire line is the remainder of a split tag: attributes
/// followed by `>` at end of line.
pub fn is_close_tag_fragment(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    while let Some(next) = parse_attr(bytes, i) {
        i = next;
    }
    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    if bytes.get(i) == Some(&b'/') {
        i += 1;
    }
    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    bytes.get(i) == Some(&b'>') && i + 1 == bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_tags() {
        let tag = parse_tag_prefix("<div>", 0).unwrap();
        assert_eq!(tag.name, "div");
        assert!(!tag.is_closing);
        assert_eq!(tag.len, 5);

        let tag = parse_tag_prefix("</p> rest", 0).unwrap();
        assert!(tag.is_closing);
        assert_eq!(tag.len, 4);

        assert!(parse_tag_prefix("<>", 0).is_none());
        assert!(parse_tag_prefix("<../x>", 0).is_none());
    }

    #[test]
    fn attributes() {
        let tag = parse_tag_prefix("<a href=\"x\" title='t'>", 0).unwrap();
        assert_eq!(tag.attrs, 2);
        let tag = parse_tag_prefix("<img src=\"a>b\"/>", 0).unwrap();
        assert_eq!(tag.name, "img");
        assert_eq!(tag.len, 16);
        // Valueless attributes are not part of the recognized shape.
        assert!(parse_tag_prefix("<details open>", 0).is_none());
        assert!(parse_tag_prefix("<div>", 1).is_none());
    }

    #[test]
    fn alone_and_find() {
        assert!(parse_tag_alone("<div>", 0).is_some());
        assert!(parse_tag_alone("<div> ", 0).is_none());
        let (pos, tag) = find_tag("text <em>x", 0, 0).unwrap();
        assert_eq!(pos, 5);
        assert_eq!(tag.name, "em");
    }

    #[test]
    fn split_tag_fragments() {
        assert!(is_open_tag_fragment("<div class=\"a\""));
        assert!(is_open_tag_fragment("<div"));
        assert!(!is_open_tag_fragment("<div>"));
        assert!(!is_open_tag_fragment("text <div"));
        assert!(is_close_tag_fragment(" id=\"x\">"));
        assert!(is_close_tag_fragment(">"));
        assert!(!is_close_tag_fragment("> text"));
    }
}
