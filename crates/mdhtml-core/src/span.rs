//! Span processing: an ordered rewrite pipeline over each markup-capable
//! text leaf. Matched sub-spans are excised into a replacement table and
//! stand in as private placeholder markers until the final decode step
//! splices them back as typed tokens.

use crate::escape;
use crate::html;
use crate::refs::LinkIds;
use crate::tags;
use crate::token::{EmphasisMarker, MarkerState, Token, TokenGroup};

const ESCAPABLE: &str = "\\`*_{}[]()#+-.!>";

type ReplacementTable = Vec<Option<Token>>;

/// Rewrite every markup-capable text leaf below `children`, recursing into
/// containers.
pub fn process_spans(children: TokenGroup, refs: &LinkIds) -> TokenGroup {
    let mut out = Vec::with_capacity(children.len());
    for mut child in children {
        if child.is_raw_text() && child.can_contain_markup() {
            let text = child.text().unwrap_or("").to_string();
            let mut group = process_raw_text(&text, refs);
            match group.len() {
                0 => {}
                1 => out.push(group.pop().expect("single token")),
                _ => out.push(Token::Container { children: group }),
            }
        } else if child.is_container() {
            let group = child.children_mut().expect("container");
            let inner = std::mem::take(group);
            *child.children_mut().expect("container") = process_spans(inner, refs);
            out.push(child);
        } else {
            out.push(child);
        }
    }
    out
}

pub(crate) fn process_raw_text(text: &str, refs: &LinkIds) -> TokenGroup {
    let mut table: ReplacementTable = Vec::new();
    let text = protect_tag_attributes(text, &mut table);
    let text = extract_code_spans(&text, &mut table);
    let text = unescape_punctuation(&text);
    let text = resolve_links_images_and_tags(&text, &mut table, refs);
    let mut tokens = scan_emphasis_markers(&text);
    match_markers(&mut tokens);
    validate_nesting(&mut tokens);
    assemble(tokens, &mut table)
}

fn placeholder(index: usize, kind: &str) -> String {
    format!("\u{1}@{}@{}\u{1}", index, kind)
}

fn escaped_placeholder(index: usize) -> String {
    format!("\u{1}@#{}@escaped\u{1}", index)
}

// ---------------------------------------------------------------------------
// Step 1: attribute strings inside recognized tags are not code spans

fn protect_tag_attributes(src: &str, table: &mut ReplacementTable) -> String {
    let mut tgt = String::with_capacity(src.len());
    let mut pos = 0;
    while let Some((tag_start, tag)) = html::find_tag(src, pos, 1) {
        let tag_end = tag_start + tag.len;
        if !tags::is_known(&tag.name) {
            tgt.push_str(&src[pos..tag_end]);
            pos = tag_end;
            continue;
        }
        tgt.push_str(&src[pos..tag_start]);
        let tag_text = &src[tag_start..tag_end];
        let mut tpos = 0;
        while let Some((attr_start, attr_end)) = find_attr_string(tag_text, tpos) {
            tgt.push_str(&tag_text[tpos..attr_start]);
            tgt.push_str(&placeholder(table.len(), "htmlTagAttr"));
            table.push(Some(Token::AttributeText {
                text: tag_text[attr_start..attr_end].to_string(),
            }));
            tpos = attr_end;
        }
        tgt.push_str(&tag_text[tpos..]);
        pos = tag_end;
    }
    tgt.push_str(&src[pos..]);
    tgt
}

// `= "value"` or `= 'value'`, starting at the equals sign.
fn find_attr_string(text: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'=' {
            let start = i;
            let mut j = i + 1;
            if bytes.get(j) == Some(&b' ') {
                j += 1;
            }
            if let Some(&quote @ (b'"' | b'\'')) = bytes.get(j) {
                j += 1;
                while j < bytes.len() && bytes[j] != quote {
                    j += 1;
                }
                if j < bytes.len() {
                    return Some((start, j + 1));
                }
            }
        }
        i += 1;
    }
    None
}

// ---------------------------------------------------------------------------
// Step 2: code spans

fn extract_code_spans(src: &str, table: &mut ReplacementTable) -> String {
    let mut tgt = String::with_capacity(src.len());
    let mut copied = 0;
    let mut open_from = 0;
    while let Some((open_start, open_len)) = next_backtick_run(src, open_from) {
        let mut close_from = open_start + open_len;
        let mut close = None;
        while let Some((run_start, run_len)) = next_backtick_run(src, close_from) {
            let interior = &src[open_start + open_len..run_start];
            if run_len == open_len && interior.bytes().any(|b| b != b' ') {
                close = Some(run_start);
                break;
            }
            close_from = run_start + run_len;
        }
        match close {
            Some(close_start) => {
                tgt.push_str(&src[copied..open_start]);
                let content = trim_one_space(&src[open_start + open_len..close_start]);
                tgt.push_str(&placeholder(table.len(), "codeSpan"));
                let restored = restore_processed_items(content, table, true);
                table.push(Some(Token::CodeSpan { text: restored }));
                copied = close_start + open_len;
                open_from = copied;
            }
            None => open_from = open_start + open_len,
        }
    }
    tgt.push_str(&src[copied..]);
    tgt
}

// Maximal run of backticks at or after `from`.
fn next_backtick_run(src: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = src.as_bytes();
    let start = (from..bytes.len()).find(|i| bytes[*i] == b'`')?;
    let mut end = start;
    while end < bytes.len() && bytes[end] == b'`' {
        end += 1;
    }
    Some((start, end - start))
}

fn trim_one_space(content: &str) -> &str {
    let content = content.strip_prefix(' ').unwrap_or(content);
    content.strip_suffix(' ').unwrap_or(content)
}

// ---------------------------------------------------------------------------
// Step 3: backslash escapes

fn unescape_punctuation(src: &str) -> String {
    let mut tgt = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(pos) = rest.find('\\') {
        tgt.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        match after.chars().next() {
            None => {
                tgt.push('\\');
                rest = "";
                break;
            }
            Some(ch) => {
                match ESCAPABLE.find(ch) {
                    Some(index) => tgt.push_str(&escaped_placeholder(index)),
                    None => {
                        tgt.push('\\');
                        tgt.push(ch);
                    }
                }
                rest = &after[ch.len_utf8()..];
            }
        }
    }
    tgt.push_str(rest);
    tgt
}

// ---------------------------------------------------------------------------
// Step 4: links, images, autolinks, raw tags

fn resolve_links_images_and_tags(
    src: &str,
    table: &mut ReplacementTable,
    refs: &LinkIds,
) -> String {
    let bytes = src.as_bytes();
    let mut tgt = String::with_capacity(src.len());
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        let matched = match bytes[i] {
            b'!' | b'[' => try_link_or_image(src, i, table, refs),
            b'<' => try_angle_construct(src, i, table),
            _ => None,
        };
        match matched {
            Some((insert, end)) => {
                tgt.push_str(&src[copied..i]);
                tgt.push_str(&insert);
                copied = end;
                i = end;
            }
            None => i += 1,
        }
    }
    tgt.push_str(&src[copied..]);
    tgt
}

// On success returns the replacement text (placeholders plus re-inserted
// link text) and the position scanning resumes at.
fn try_link_or_image(
    src: &str,
    start: usize,
    table: &mut ReplacementTable,
    refs: &LinkIds,
) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let mut p = start;
    let is_image = bytes[p] == b'!';
    if is_image {
        p += 1;
    }
    if bytes.get(p) != Some(&b'[') {
        return None;
    }

    if let Some((contents, url_and_title, end)) = match_inline_form(src, p) {
        return match parse_url_and_title(url_and_title) {
            Some((url, title)) => {
                let url = restore_plain(url, table);
                let title = restore_plain(title, table);
                Some((emit_link(is_image, contents, url, title, table), end))
            }
            // A URL part that does not scan degrades to the first character.
            None => Some((emit_literal_char(src, start, table), start + 1)),
        };
    }

    let (contents, id, end) = match_reference_form(src, p)?;
    let link_id = match id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => collapse_spaces(contents),
    };
    match refs.find(&link_id) {
        Some(target) => {
            let url = target.url.clone();
            let title = target.title.clone();
            Some((emit_link(is_image, contents, url, title, table), end))
        }
        None => Some((emit_literal_char(src, start, table), start + 1)),
    }
}

fn emit_link(
    is_image: bool,
    contents: &str,
    url: String,
    title: String,
    table: &mut ReplacementTable,
) -> String {
    if is_image {
        let alt = restore_plain(contents, table);
        let insert = placeholder(table.len(), "image");
        table.push(Some(Token::Image { alt, url, title }));
        insert
    } else {
        // The link text goes back into the stream so emphasis and code
        // spans inside it still resolve.
        let mut insert = placeholder(table.len(), "linkOpen");
        table.push(Some(Token::AnchorOpen { url, title }));
        insert.push_str(contents);
        insert.push_str(&placeholder(table.len(), "linkClose"));
        table.push(Some(Token::tag("/a")));
        insert
    }
}

fn emit_literal_char(src: &str, start: usize, table: &mut ReplacementTable) -> String {
    let insert = placeholder(table.len(), "literal");
    table.push(Some(Token::raw(&src[start..start + 1])));
    insert
}

// `[text](url "title")`; the text is greedy, the URL may contain balanced
// parentheses.
fn match_inline_form(src: &str, bracket: usize) -> Option<(&str, &str, usize)> {
    let bytes = src.as_bytes();
    for j in (bracket + 1..bytes.len().saturating_sub(1)).rev() {
        if bytes[j] != b']' || bytes[j + 1] != b'(' {
            continue;
        }
        if let Some(close) = match_paren_url(src, j + 2) {
            return Some((&src[bracket + 1..j], &src[j + 2..close], close + 1));
        }
    }
    None
}

fn match_paren_url(src: &str, from: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut depth = 0usize;
    let mut i = from;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

// `[text]` or `[text][id]`; one level of brackets may nest inside the text.
fn match_reference_form(src: &str, bracket: usize) -> Option<(&str, Option<&str>, usize)> {
    let bytes = src.as_bytes();
    let close = match_nested_contents(bytes, bracket).or_else(|| {
        // Plain form: shortest non-empty text.
        (bracket + 2..bytes.len()).find(|k| bytes[*k] == b']')
    })?;
    let contents = &src[bracket + 1..close];
    let mut i = close + 1;
    while bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    if bytes.get(i) == Some(&b'[') {
        if let Some(id_close) = (i + 1..bytes.len()).find(|k| bytes[*k] == b']') {
            return Some((contents, Some(&src[i + 1..id_close]), id_close + 1));
        }
    }
    Some((contents, None, close + 1))
}

// `[^]]*? \[ .*? \] .*? \]` — text containing one bracketed group.
fn match_nested_contents(bytes: &[u8], bracket: usize) -> Option<usize> {
    let mut i = bracket + 1;
    while i < bytes.len() && bytes[i] != b'[' && bytes[i] != b']' {
        i += 1;
    }
    if i >= bytes.len() || bytes[i] != b'[' {
        return None;
    }
    let inner_close = (i + 1..bytes.len()).find(|k| bytes[*k] == b']')?;
    (inner_close + 1..bytes.len()).find(|k| bytes[*k] == b']')
}

// `<?url>? "title"` inside the parentheses of an inline link.
fn parse_url_and_title(src: &str) -> Option<(&str, &str)> {
    let mut rest = src;
    if let Some(stripped) = rest.strip_prefix('<') {
        rest = stripped;
    }
    let url_end = rest.find(|c| c == ' ' || c == '>').unwrap_or(rest.len());
    let url = &rest[..url_end];
    let mut rest = &rest[url_end..];
    if let Some(stripped) = rest.strip_prefix('>') {
        rest = stripped;
    }
    let rest = rest.trim_start_matches(' ');
    let rest = rest.trim_end_matches(' ');
    if rest.is_empty() {
        return Some((url, ""));
    }
    let title = match rest.chars().next() {
        Some(q @ ('"' | '\'')) => rest[1..].strip_suffix(q)?,
        Some('(') => rest[1..].strip_suffix(')')?,
        _ => return None,
    };
    Some((url, title))
}

fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == ' ' && out.ends_with(' ') {
            continue;
        }
        out.push(ch);
    }
    out
}

// `<...>`: an autolink if the contents look like a URL or email address, a
// raw tag if the name is recognized, literal text otherwise.
fn try_angle_construct(
    src: &str,
    start: usize,
    table: &mut ReplacementTable,
) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let gt = (start + 1..bytes.len()).find(|i| bytes[*i] == b'>')?;
    let inner = &src[start + 1..gt];
    let name_start = if inner.starts_with('/') { 1 } else { 0 };
    let name_len = inner[name_start..]
        .bytes()
        .take_while(u8::is_ascii_alphanumeric)
        .count();
    if name_len == 0 {
        return None;
    }
    let name = &inner[name_start..name_start + name_len];

    let insert = placeholder(table.len(), "anglespan");
    if escape::looks_like_url(inner) {
        table.push(Some(Token::Container {
            children: vec![
                Token::AnchorOpen {
                    url: inner.to_string(),
                    title: String::new(),
                },
                Token::raw_literal(inner),
                Token::tag("/a"),
            ],
        }));
    } else if escape::looks_like_email(inner) {
        table.push(Some(Token::Container {
            children: vec![
                Token::AnchorOpen {
                    url: escape::email_encode(&format!("mailto:{}", inner)),
                    title: String::new(),
                },
                Token::raw_literal(escape::email_encode(inner)),
                Token::tag("/a"),
            ],
        }));
    } else if tags::is_known(name) {
        let restored = restore_processed_items(inner, table, true);
        table.push(Some(Token::tag(restored)));
    } else {
        table.push(Some(Token::raw(&src[start..gt + 1])));
    }
    Some((insert, gt + 1))
}

// ---------------------------------------------------------------------------
// Step 5: emphasis markers

fn is_punct(b: u8) -> bool {
    b.is_ascii_punctuation()
}

// Scan `*`/`_` runs into open/close marker candidates using the boundary
// rules; everything else stays raw text.
fn scan_emphasis_markers(src: &str) -> TokenGroup {
    let bytes = src.as_bytes();
    let mut out = TokenGroup::new();
    let mut fragment_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let ch = bytes[i];
        if ch != b'*' && ch != b'_' {
            i += 1;
            continue;
        }
        let mut run = 0;
        while i + run < bytes.len() && bytes[i + run] == ch {
            run += 1;
        }
        let prev = if i == 0 { None } else { Some(bytes[i - 1]) };
        match classify_marker(ch, prev, bytes, i, run) {
            Some((open, len)) => {
                if fragment_start < i {
                    out.push(Token::raw(&src[fragment_start..i]));
                }
                let end = i + len;
                let intraword = ch == b'_'
                    && i > 0
                    && end < bytes.len()
                    && bytes[i - 1].is_ascii_alphanumeric()
                    && bytes[end].is_ascii_alphanumeric();
                if intraword {
                    out.push(Token::raw(&src[i..end]));
                } else {
                    out.push(Token::EmphasisMarker(EmphasisMarker::new(open, ch, len)));
                }
                i = end;
                fragment_start = i;
            }
            None => i += 1,
        }
    }
    if fragment_start < bytes.len() {
        out.push(Token::raw(&src[fragment_start..]));
    }
    out
}

// Boundary rules, tried in the order: star open, underscore open, star
// close, underscore close; greedy length within each variant.
fn classify_marker(
    ch: u8,
    prev: Option<u8>,
    bytes: &[u8],
    start: usize,
    run: usize,
) -> Option<(bool, usize)> {
    let max = run.min(3);
    let next_at = |len: usize| bytes.get(start + len).copied();
    let prev_is = |pred: fn(u8) -> bool| prev.is_some_and(pred);

    if ch == b'*' {
        for len in (1..=max).rev() {
            // Preceded by space or punctuation, not followed by space.
            if (prev_is(|b| b == b' ') || prev_is(is_punct))
                && next_at(len).is_some_and(|b| b != b' ')
            {
                return Some((true, len));
            }
        }
        for len in (1..=max).rev() {
            // Not followed by space, end, or punctuation.
            if next_at(len).is_some_and(|b| b != b' ' && !is_punct(b)) {
                return Some((true, len));
            }
        }
        for len in (1..=max).rev() {
            // Not preceded by space; followed by end, space or punctuation.
            if !prev_is(|b| b == b' ')
                && next_at(len).is_none_or(|b| b == b' ' || is_punct(b))
            {
                return Some((false, len));
            }
        }
        for len in (1..=max).rev() {
            // Not preceded by space or punctuation.
            if !prev_is(|b| b == b' ') && !prev_is(is_punct) {
                return Some((false, len));
            }
        }
        None
    } else {
        for len in (1..=max).rev() {
            // Not followed by space, end, or punctuation.
            if next_at(len).is_some_and(|b| b != b' ' && !is_punct(b)) {
                return Some((true, len));
            }
        }
        for len in (1..=max).rev() {
            // Not preceded by space or punctuation.
            if !prev_is(|b| b == b' ') && !prev_is(is_punct) {
                return Some((false, len));
            }
        }
        for len in (1..=max).rev() {
            // After punctuation, followed by space or end.
            if prev_is(is_punct) && next_at(len).is_none_or(|b| b == b' ') {
                return Some((false, len));
            }
        }
        None
    }
}

// Pair open markers with the first same-character close marker. Runs of
// three meeting a shorter partner split into two adjacent markers so one
// side matches exactly.
fn match_markers(tokens: &mut TokenGroup) {
    let mut next_id: u32 = 0;
    let mut i = 0;
    while i < tokens.len() {
        if !tokens[i].is_unmatched_open_marker() {
            i += 1;
            continue;
        }
        let (open_ch, open_len) = {
            let m = tokens[i].marker().expect("marker");
            (m.ch, m.len)
        };
        let mut j = i + 1;
        while j < tokens.len() {
            if tokens[j].is_unmatched_close_marker() {
                let (close_ch, close_len) = {
                    let m = tokens[j].marker().expect("marker");
                    (m.ch, m.len)
                };
                if close_ch == open_ch {
                    if close_len == 3 && open_len != 3 {
                        // Split the closer into a part that matches this
                        // opener and a leftover.
                        tokens[j].marker_mut().expect("marker").state = MarkerState::Disabled;
                        tokens.insert(
                            j + 1,
                            Token::EmphasisMarker(EmphasisMarker::new(false, close_ch, 3 - open_len)),
                        );
                        tokens.insert(
                            j + 2,
                            Token::EmphasisMarker(EmphasisMarker::new(false, close_ch, open_len)),
                        );
                        j += 1;
                        continue;
                    }
                    if close_len == open_len {
                        tokens[i].marker_mut().expect("marker").state =
                            MarkerState::Matched(next_id);
                        tokens[j].marker_mut().expect("marker").state =
                            MarkerState::Matched(next_id);
                        next_id += 1;
                        break;
                    }
                    if open_len == 3 {
                        // Split the opener instead; the leftover may match a
                        // later closer.
                        tokens[i].marker_mut().expect("marker").state = MarkerState::Disabled;
                        tokens.insert(
                            i + 1,
                            Token::EmphasisMarker(EmphasisMarker::new(true, open_ch, 3 - close_len)),
                        );
                        tokens.insert(
                            i + 2,
                            Token::EmphasisMarker(EmphasisMarker::new(true, open_ch, close_len)),
                        );
                        break;
                    }
                }
            }
            j += 1;
        }
        i += 1;
    }
}

// Reject crossing pairs with a stack: a matched close must pair with the
// top of the stack or both ends revert to literal text.
fn validate_nesting(tokens: &mut TokenGroup) {
    use std::collections::{HashMap, HashSet};

    let mut open_index: HashMap<u32, usize> = HashMap::new();
    for (idx, token) in tokens.iter().enumerate() {
        if token.is_matched_open_marker() {
            if let Some(MarkerState::Matched(id)) = token.marker().map(|m| m.state) {
                open_index.insert(id, idx);
            }
        }
    }

    let mut stack: Vec<u32> = Vec::new();
    let mut invalidated: HashSet<u32> = HashSet::new();
    for idx in 0..tokens.len() {
        if tokens[idx].is_matched_open_marker() {
            if let Some(MarkerState::Matched(id)) = tokens[idx].marker().map(|m| m.state) {
                stack.push(id);
            }
        } else if tokens[idx].is_matched_close_marker() {
            let id = match tokens[idx].marker().map(|m| m.state) {
                Some(MarkerState::Matched(id)) => id,
                _ => continue,
            };
            if stack.last() == Some(&id) {
                stack.pop();
                while let Some(top) = stack.last() {
                    if invalidated.contains(top) {
                        stack.pop();
                    } else {
                        break;
                    }
                }
            } else {
                tokens[idx].marker_mut().expect("marker").state = MarkerState::Candidate;
                if let Some(&open_idx) = open_index.get(&id) {
                    tokens[open_idx].marker_mut().expect("marker").state = MarkerState::Candidate;
                }
                invalidated.insert(id);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Step 6: decode placeholders back into typed tokens

fn assemble(tokens: TokenGroup, table: &mut ReplacementTable) -> TokenGroup {
    let mut out = TokenGroup::new();
    for token in tokens {
        if token.is_raw_text() && token.can_contain_markup() {
            let text = token.text().unwrap_or("").to_string();
            decode_placeholders(&text, table, &mut out);
        } else {
            out.push(token);
        }
    }
    out
}

struct Placeholder<'a> {
    start: usize,
    end: usize,
    reference: &'a str,
}

fn next_placeholder(src: &str, from: usize) -> Option<Placeholder<'_>> {
    let bytes = src.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        // The marker byte never occurs inside a multi-byte sequence, so
        // slicing at it is always sound.
        if bytes[i] == 0x01 {
            if let Some(found) = parse_placeholder(src, i) {
                return Some(found);
            }
        }
        i += 1;
    }
    None
}

fn parse_placeholder(src: &str, start: usize) -> Option<Placeholder<'_>> {
    let rest = &src[start..];
    let rest = rest.strip_prefix('\u{1}')?;
    let rest = rest.strip_prefix('@')?;
    let hash = rest.starts_with('#');
    let digits_start = if hash { 1 } else { 0 };
    let digits = rest[digits_start..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    let ref_end = digits_start + digits;
    let rest_after = rest[ref_end..].strip_prefix('@')?;
    // The kind label runs to the next marker byte and is non-empty.
    let kind_len = rest_after.find('\u{1}')?;
    if kind_len == 0 {
        return None;
    }
    let total = 2 + ref_end + 1 + kind_len + 1;
    Some(Placeholder {
        start,
        end: start + total,
        reference: &src[start + 2..start + 2 + ref_end],
    })
}

fn decode_placeholders(src: &str, table: &mut ReplacementTable, out: &mut TokenGroup) {
    let mut pos = 0;
    while let Some(found) = next_placeholder(src, pos) {
        if found.start > pos {
            out.push(Token::raw(&src[pos..found.start]));
        }
        pos = found.end;
        if let Some(index) = found.reference.strip_prefix('#') {
            if let Ok(index) = index.parse::<usize>() {
                if let Some(ch) = ESCAPABLE.chars().nth(index) {
                    out.push(Token::EscapedCharacter { ch });
                }
            }
        } else if !found.reference.is_empty() {
            if let Ok(index) = found.reference.parse::<usize>() {
                if let Some(slot) = table.get_mut(index) {
                    if let Some(token) = slot.take() {
                        out.push(token);
                    }
                }
            }
        }
        // An empty reference is simply dropped.
    }
    if pos < src.len() {
        out.push(Token::raw(&src[pos..]));
    }
}

// Turn placeholders back into source text: escapes regain their backslash
// when `keep_escapes` is set, and excised tokens print their original form.
fn restore_processed_items(src: &str, table: &ReplacementTable, keep_escapes: bool) -> String {
    let mut out = String::with_capacity(src.len());
    let mut pos = 0;
    while let Some(found) = next_placeholder(src, pos) {
        out.push_str(&src[pos..found.start]);
        pos = found.end;
        if let Some(index) = found.reference.strip_prefix('#') {
            if let Ok(index) = index.parse::<usize>() {
                if let Some(ch) = ESCAPABLE.chars().nth(index) {
                    if keep_escapes {
                        out.push('\\');
                    }
                    out.push(ch);
                }
            }
        } else if !found.reference.is_empty() {
            if let Ok(index) = found.reference.parse::<usize>() {
                if let Some(Some(token)) = table.get(index) {
                    out.push_str(&original_text(token));
                }
            }
        }
    }
    out.push_str(&src[pos..]);
    out
}

fn restore_plain(src: &str, table: &ReplacementTable) -> String {
    restore_processed_items(src, table, false)
}

fn original_text(token: &Token) -> String {
    match token {
        Token::CodeSpan { text } => format!("`{}`", text),
        Token::HtmlTag { contents } => format!("<{}>", contents),
        _ => token.text().unwrap_or("").to_string(),
    }
}
