//! Block-level passes: fence extraction, split-tag merging, inline HTML
//! blocks, reference definitions, block structure, paragraph consolidation.
//!
//! Each pass consumes a token sequence and produces a new one; the block
//! structure pass recurses into every container it creates or encounters.

use crate::html;
use crate::input;
use crate::refs::LinkIds;
use crate::tags::{self, TagClass};
use crate::token::{Token, TokenGroup};

/// Containers deeper than this are left as literal text. Keeps hostile
/// nesting from exhausting the call stack.
pub const MAX_NESTING: usize = 64;

// ---------------------------------------------------------------------------
// Fenced code blocks

pub fn extract_fenced_blocks(tokens: TokenGroup) -> TokenGroup {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if let Some((block, next)) = parse_fenced_code_block(&tokens, i) {
            out.push(block);
            i = next;
            continue;
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

fn parse_fenced_code_block(tokens: &[Token], start: usize) -> Option<(Token, usize)> {
    let first = &tokens[start];
    if first.is_blank_line() || !first.can_contain_markup() {
        return None;
    }
    let (indent, fence_len, fence_ch, info) = fence_open(first.text()?)?;
    let mut body = String::new();
    let mut i = start + 1;
    // An unclosed fence runs to the end of the sequence.
    while i < tokens.len() {
        let Some(line) = tokens[i].text() else { break };
        i += 1;
        if fence_close(line, indent, fence_len, fence_ch, &mut body) {
            break;
        }
    }
    Some((Token::FencedCodeBlock { text: body, info }, i))
}

fn fence_open(line: &str) -> Option<(usize, usize, u8, String)> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    if i > 3 {
        return None;
    }
    let indent = i;
    let fence_ch = *bytes.get(i)?;
    if fence_ch != b'`' && fence_ch != b'~' {
        return None;
    }
    let run_start = i;
    while i < bytes.len() && bytes[i] == fence_ch {
        i += 1;
    }
    if i - run_start < 3 {
        return None;
    }
    let info = &line[i..];
    if info.contains('`') {
        return None;
    }
    Some((indent, i - run_start, fence_ch, info.to_string()))
}

// Returns true on a closing fence; otherwise appends the line to `body`,
// dedented by the opening indent.
fn fence_close(line: &str, open_indent: usize, open_len: usize, fence_ch: u8, body: &mut String) -> bool {
    let bytes = line.as_bytes();
    let mut i = 0;
    let mut stripped = 0;
    while i < bytes.len() && bytes[i] == b' ' && stripped < open_indent {
        i += 1;
        stripped += 1;
    }
    let content_start = i;
    while i < bytes.len() && bytes[i] == b' ' && stripped < 4 {
        i += 1;
        stripped += 1;
    }
    if stripped > 3 {
        body.push_str(&line[content_start..]);
        body.push('\n');
        return false;
    }
    let mut close_len = 0;
    while i < bytes.len() && bytes[i] == fence_ch {
        i += 1;
        close_len += 1;
    }
    if close_len < open_len {
        body.push_str(&line[content_start..]);
        body.push('\n');
        return false;
    }
    // The closing fence takes no info string.
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if i != bytes.len() {
        body.push_str(&line[content_start..]);
        body.push('\n');
        return false;
    }
    true
}

// ---------------------------------------------------------------------------
// Multi-line HTML tags

pub fn merge_multiline_html_tags(tokens: TokenGroup) -> TokenGroup {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if i + 1 < tokens.len() && tokens[i].is_raw_text() && tokens[i + 1].is_raw_text() {
            let first = tokens[i].text().unwrap_or("");
            let second = tokens[i + 1].text().unwrap_or("");
            if html::is_open_tag_fragment(first) && html::is_close_tag_fragment(second) {
                out.push(Token::raw(format!("{} {}", first, second)));
                i += 2;
                continue;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// Inline HTML blocks and reference definitions

pub fn scan_inline_html_and_references(tokens: TokenGroup, refs: &mut LinkIds) -> TokenGroup {
    let mut out: TokenGroup = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_raw_text() {
            // HTML blocks only open at the start of input or after a blank.
            let at_boundary = out.last().is_none_or(Token::is_blank_line);
            if at_boundary {
                if let Some((block, next)) = parse_inline_html(&tokens, i) {
                    out.push(block);
                    i = next;
                    continue;
                }
            }
            if let Some(next) = parse_reference(&tokens, i, refs) {
                i = next;
                continue;
            }
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}

fn parse_inline_html(tokens: &[Token], start: usize) -> Option<(Token, usize)> {
    let line = tokens[start].text()?;

    let tag = html::parse_tag_prefix(line, 0);
    let block_tag = tag
        .as_ref()
        .filter(|tag| tags::classify(&tag.name, false) == Some(TagClass::Block));

    if let Some(tag) = block_tag {
        let (contents, lines, next) = collect_html_block(tokens, start, |text| {
            tokenize_inline_html_line(text)
        });
        if lines > 1 || tags::classify(&tag.name, true) == Some(TagClass::Block) {
            return Some((Token::InlineHtmlBlock { children: contents }, next));
        }
        // A single-line construct whose tag is span-level falls through to
        // inline processing.
        return None;
    }

    if line.starts_with("<!--") {
        let (contents, _, next) = collect_html_block(tokens, start, |text| {
            vec![Token::InlineHtmlComment {
                text: format!("{}\n", text),
            }]
        });
        return Some((Token::InlineHtmlBlock { children: contents }, next));
    }

    None
}

// Collect lines until a standalone end line followed by a blank line (or end
// of input). The end line is a bare tag for tag blocks and a `-->` line for
// comments; the first line always qualifies.
fn collect_html_block(
    tokens: &[Token],
    start: usize,
    tokenize: impl Fn(&str) -> Vec<Token>,
) -> (TokenGroup, usize, usize) {
    let comment = tokens[start]
        .text()
        .is_some_and(|line| line.starts_with("<!--"));
    let mut contents = TokenGroup::new();
    let mut lines = 0;
    let mut cur = start;
    loop {
        let Some(text) = tokens[cur].text() else { break };
        contents.extend(tokenize(text));
        let prev = cur;
        cur += 1;
        lines += 1;
        if cur < tokens.len() && tokens[cur].is_blank_line() {
            if prev == start {
                break;
            }
            let prev_text = tokens[prev].text().unwrap_or("");
            let ended = if comment {
                is_comment_end(prev_text)
            } else {
                html::parse_tag_alone(prev_text, 0).is_some()
            };
            if ended {
                break;
            }
        }
        if cur >= tokens.len() {
            break;
        }
    }
    (contents, lines, cur)
}

// Split one line of an HTML block into tag and text tokens, so attribute
// contents get entity-encoded on output. Every line ends in a newline
// fragment.
fn tokenize_inline_html_line(text: &str) -> Vec<Token> {
    let mut out = Vec::new();
    let mut pos = 0;
    loop {
        match html::find_tag(text, pos, 0) {
            Some((tag_start, tag)) => {
                if tag_start > pos {
                    out.push(Token::InlineHtmlContents {
                        text: text[pos..tag_start].to_string(),
                    });
                }
                out.push(Token::tag(tag.contents(&text[tag_start..])));
                pos = tag_start + tag.len;
            }
            None => {
                let mut tail = text[pos..].to_string();
                tail.push('\n');
                out.push(Token::InlineHtmlContents { text: tail });
                break;
            }
        }
    }
    out
}

// Line ends with `--`, optional spaces, `>`.
fn is_comment_end(text: &str) -> bool {
    text.strip_suffix('>')
        .map(|t| t.trim_end_matches(' ').ends_with("--"))
        .unwrap_or(false)
}

fn parse_reference(tokens: &[Token], start: usize, refs: &mut LinkIds) -> Option<usize> {
    let line = tokens[start].text()?;
    let (id, url, title) = match_reference_line(line)?;
    let mut next = start + 1;
    let title = match title {
        Some(title) => title,
        None => {
            // The title may stand alone on the following line.
            match tokens
                .get(next)
                .and_then(Token::text)
                .and_then(match_separate_title)
            {
                Some(title) => {
                    next += 1;
                    title
                }
                None => String::new(),
            }
        }
    };
    refs.add(&id, &url, &title);
    Some(next)
}

// `[id]: <url> "title"` with the title in double quotes, single quotes or
// parentheses. Returns None for anything malformed, which then falls through
// as plain text.
fn match_reference_line(line: &str) -> Option<(String, String, Option<String>)> {
    let mut rest = line;
    let mut lead = 0;
    while lead < 3 && rest.starts_with(' ') {
        rest = &rest[1..];
        lead += 1;
    }
    rest = rest.strip_prefix('[')?;
    let split = rest.rfind("]:")?;
    let id = &rest[..split];
    if id.is_empty() {
        return None;
    }
    let after = &rest[split + 2..];
    if !after.starts_with(' ') {
        return None;
    }
    let after = after.trim_start_matches(' ');
    let mut url_part = after;
    if let Some(stripped) = url_part.strip_prefix('<') {
        url_part = stripped;
    }
    let url_end = url_part
        .find(|c| c == ' ' || c == '>')
        .unwrap_or(url_part.len());
    let url = &url_part[..url_end];
    if url.is_empty() {
        return None;
    }
    let mut rest = &url_part[url_end..];
    if let Some(stripped) = rest.strip_prefix('>') {
        rest = stripped;
    }
    if rest.is_empty() {
        return Some((id.to_string(), url.to_string(), None));
    }
    let title = rest.trim_start_matches(' ');
    let title = match title.chars().next() {
        Some(q @ ('"' | '\'')) => {
            let inner = &title[1..];
            inner.strip_suffix(q)?
        }
        Some('(') => {
            let inner = &title[1..];
            inner.strip_suffix(')')?
        }
        // Trailing junk after the URL disqualifies the whole line.
        _ => return None,
    };
    Some((id.to_string(), url.to_string(), Some(title.to_string())))
}

// ` "title" ` alone on a line; trailing spaces are allowed here.
fn match_separate_title(line: &str) -> Option<String> {
    let t = line.trim_start_matches(' ').trim_end_matches(' ');
    let first = t.chars().next()?;
    let inner = match first {
        '"' | '\'' => t[1..].strip_suffix(first)?,
        '(' => t[1..].strip_suffix(')')?,
        _ => return None,
    };
    Some(inner.to_string())
}

// ---------------------------------------------------------------------------
// Block structure

pub fn parse_block_structure(tokens: TokenGroup, depth: usize) -> TokenGroup {
    if depth >= MAX_NESTING {
        return tokens;
    }
    let mut out: TokenGroup = Vec::with_capacity(tokens.len());
    let mut prev_was_paragraph_line = false;
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if !token.is_blank_line() && token.can_contain_markup() {
            if let Some((block, next)) = parse_fenced_code_block(&tokens, i) {
                out.push(block);
                i = next;
                prev_was_paragraph_line = false;
                continue;
            }
            if let Some((block, next)) = parse_block_quote(&tokens, i, depth) {
                out.push(block);
                i = next;
                prev_was_paragraph_line = false;
                continue;
            }
            if let Some((block, next)) = parse_horizontal_rule(&tokens, i) {
                out.push(block);
                i = next;
                prev_was_paragraph_line = false;
                continue;
            }
            if let Some((block, next)) = parse_list(&tokens, i, depth) {
                out.push(block);
                i = next;
                prev_was_paragraph_line = false;
                continue;
            }
            if let Some((block, next)) = parse_header(&tokens, i) {
                out.push(block);
                i = next;
                prev_was_paragraph_line = false;
                continue;
            }
            if !prev_was_paragraph_line {
                if let Some((block, next)) = parse_indented_code_block(&tokens, i) {
                    out.push(block);
                    i = next;
                    prev_was_paragraph_line = false;
                    continue;
                }
            }
            out.push(token.clone());
            prev_was_paragraph_line = true;
            i += 1;
        } else if token.is_container() {
            let mut token = token.clone();
            let children = std::mem::take(token.children_mut().expect("container"));
            *token.children_mut().expect("container") = parse_block_structure(children, depth + 1);
            out.push(token);
            prev_was_paragraph_line = false;
            i += 1;
        } else {
            out.push(token.clone());
            prev_was_paragraph_line = false;
            i += 1;
        }
    }
    out
}

fn parse_block_quote(tokens: &[Token], start: usize, depth: usize) -> Option<(Token, usize)> {
    let line = tokens[start].text()?;
    let (level, content) = quote_prefix(line)?;
    let mut children = vec![quoted_content_token(content)];
    let mut i = start + 1;
    while i < tokens.len() {
        let Some(line) = tokens[i].text() else { break };
        match quote_continuation(line, level) {
            Some(content) => {
                children.push(quoted_content_token(content));
                i += 1;
            }
            None => break,
        }
    }
    let children = parse_block_structure(children, depth + 1);
    Some((Token::BlockQuote { children }, i))
}

fn quoted_content_token(content: &str) -> Token {
    if input::is_blank_line(content) {
        Token::blank(content)
    } else {
        Token::raw(content)
    }
}

// `(?: {0,3}>)+ ?` — depth is the number of `>` in the prefix.
fn quote_prefix(line: &str) -> Option<(usize, &str)> {
    let bytes = line.as_bytes();
    let mut i = 0;
    let mut level = 0;
    loop {
        let save = i;
        let mut spaces = 0;
        while spaces < 3 && bytes.get(i) == Some(&b' ') {
            i += 1;
            spaces += 1;
        }
        if bytes.get(i) == Some(&b'>') {
            i += 1;
            level += 1;
        } else {
            i = save;
            break;
        }
    }
    if level == 0 {
        return None;
    }
    if bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    Some((level, &line[i..]))
}

// Continuation lines must repeat exactly the same quote depth.
fn quote_continuation(line: &str, level: usize) -> Option<&str> {
    let bytes = line.as_bytes();
    let mut i = 0;
    for _ in 0..level {
        let mut spaces = 0;
        while spaces < 3 && bytes.get(i) == Some(&b' ') {
            i += 1;
            spaces += 1;
        }
        if bytes.get(i) == Some(&b'>') {
            i += 1;
        } else {
            return None;
        }
    }
    if bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    Some(&line[i..])
}

fn parse_horizontal_rule(tokens: &[Token], start: usize) -> Option<(Token, usize)> {
    let line = tokens[start].text()?;
    let mut rest = line;
    let mut lead = 0;
    while lead < 3 && rest.starts_with(' ') {
        rest = &rest[1..];
        lead += 1;
    }
    let rule_ch = match rest.chars().next() {
        Some(c @ ('*' | '-' | '_')) => c,
        _ => return None,
    };
    if !rest.chars().all(|c| c == rule_ch || c == ' ') {
        return None;
    }
    if rest.chars().filter(|c| *c == rule_ch).count() < 3 {
        return None;
    }
    Some((Token::tag("hr /"), start + 1))
}

#[derive(Clone, Copy, PartialEq)]
enum ListKind {
    Unordered(u8),
    Ordered(u8),
}

fn parse_list(tokens: &[Token], start: usize, depth: usize) -> Option<(Token, usize)> {
    let first_line = tokens[start].text()?;
    let (lead, kind, mut indent, first_content) = list_marker(first_line)?;

    let mut loose = false;
    let mut content: TokenGroup = vec![Token::raw(first_content)];
    let mut item_groups: Vec<TokenGroup> = Vec::new();
    let mut prev_blank = false;
    let mut single_line = true;
    let mut i = start + 1;
    while i < tokens.len() {
        let token = &tokens[i];
        if token.text().is_none() {
            break;
        }
        if token.is_blank_line() {
            match tokens.get(i + 1) {
                None => break,
                Some(next) if next.is_blank_line() => {
                    // Two blanks end the list; the first is consumed.
                    i += 1;
                    break;
                }
                Some(_) => {
                    i += 1;
                    prev_blank = true;
                    continue;
                }
            }
        }
        let line = token.text().unwrap_or("");
        if let Some(content_line) = item_continuation(line, indent) {
            if prev_blank {
                content.push(Token::blank(""));
            }
            content.push(Token::raw(content_line));
            loose |= prev_blank;
            prev_blank = false;
            single_line = false;
            i += 1;
            continue;
        }
        if let Some((new_indent, item_content)) = next_item(line, kind) {
            item_groups.push(std::mem::take(&mut content));
            content.push(Token::raw(item_content));
            indent = new_indent;
            loose |= prev_blank;
            prev_blank = false;
            i += 1;
            continue;
        }
        break;
    }
    item_groups.push(content);

    // A lone unindented marker line is a dash or number in running text, not
    // a list.
    if item_groups.len() == 1 && lead == 0 && single_line {
        return None;
    }

    let items: TokenGroup = item_groups
        .into_iter()
        .map(|children| Token::ListItem {
            children: parse_block_structure(children, depth + 1),
            wrap_paragraphs: loose,
        })
        .collect();
    let list = match kind {
        ListKind::Unordered(_) => Token::UnorderedList { items },
        ListKind::Ordered(_) => Token::OrderedList { items },
    };
    Some((list, i))
}

// `( {0,3})([*+-])( +)([^*-].*)` or `( {0,3})([0-9]+)([.)])( +)(.*)`.
// Returns (leading spaces, kind, content indent, first content).
fn list_marker(line: &str) -> Option<(usize, ListKind, usize, String)> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < 3 && bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    let lead = i;
    match bytes.get(i) {
        Some(&marker @ (b'*' | b'+' | b'-')) => {
            i += 1;
            let space_start = i;
            while bytes.get(i) == Some(&b' ') {
                i += 1;
            }
            let spaces = i - space_start;
            if spaces == 0 {
                return None;
            }
            let content = &line[i..];
            // Keeps horizontal rules like `* * *` out of list parsing.
            match content.bytes().next() {
                None | Some(b'*') | Some(b'-') => return None,
                _ => {}
            }
            Some((
                lead,
                ListKind::Unordered(marker),
                lead + spaces + 1,
                content.to_string(),
            ))
        }
        Some(d) if d.is_ascii_digit() => {
            let digit_start = i;
            while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                i += 1;
            }
            let digits = i - digit_start;
            let delim = match bytes.get(i) {
                Some(&d @ (b'.' | b')')) => d,
                _ => return None,
            };
            i += 1;
            let space_start = i;
            while bytes.get(i) == Some(&b' ') {
                i += 1;
            }
            let spaces = i - space_start;
            if spaces == 0 {
                return None;
            }
            Some((
                lead,
                ListKind::Ordered(delim),
                lead + digits + spaces + 1,
                line[i..].to_string(),
            ))
        }
        _ => None,
    }
}

// A line indented at least to the item's content column continues the item.
fn item_continuation(line: &str, indent: usize) -> Option<String> {
    let bytes = line.as_bytes();
    if bytes.len() < indent || !bytes[..indent].iter().all(|b| *b == b' ') {
        return None;
    }
    Some(line[indent..].to_string())
}

// A sibling item must reuse the same marker character or ordered delimiter.
fn next_item(line: &str, kind: ListKind) -> Option<(usize, String)> {
    let bytes = line.as_bytes();
    let mut i = 0;
    while i < 3 && bytes.get(i) == Some(&b' ') {
        i += 1;
    }
    let lead = i;
    match kind {
        ListKind::Unordered(marker) => {
            if bytes.get(i) != Some(&marker) {
                return None;
            }
            i += 1;
            let space_start = i;
            while bytes.get(i) == Some(&b' ') {
                i += 1;
            }
            let spaces = i - space_start;
            if spaces == 0 {
                return None;
            }
            Some((lead + spaces + 1, line[i..].to_string()))
        }
        ListKind::Ordered(delim) => {
            let digit_start = i;
            while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                i += 1;
            }
            if i == digit_start || bytes.get(i) != Some(&delim) {
                return None;
            }
            let digits = i - digit_start;
            i += 1;
            let space_start = i;
            while bytes.get(i) == Some(&b' ') {
                i += 1;
            }
            let spaces = i - space_start;
            if spaces == 0 {
                return None;
            }
            Some((lead + digits + spaces + 1, line[i..].to_string()))
        }
    }
}

fn parse_header(tokens: &[Token], start: usize) -> Option<(Token, usize)> {
    let line = tokens[start].text()?;

    if let Some((level, text)) = atx_header(line) {
        let children = vec![Token::raw(text)];
        return Some((Token::Header { level, children }, start + 1));
    }

    // Setext form: the next line is all `=` or all `-`.
    let next = tokens.get(start + 1)?;
    if next.is_blank_line() || !next.can_contain_markup() {
        return None;
    }
    let level = setext_underline(next.text()?)?;
    let mut title = line;
    let mut lead = 0;
    while lead < 3 && title.starts_with(' ') {
        title = &title[1..];
        lead += 1;
    }
    let title = title.trim_end_matches(' ').to_string();
    let children = vec![Token::raw(title)];
    Some((Token::Header { level, children }, start + 2))
}

fn atx_header(line: &str) -> Option<(usize, String)> {
    let mut rest = line;
    let mut lead = 0;
    while lead < 3 && rest.starts_with(' ') {
        rest = &rest[1..];
        lead += 1;
    }
    let hashes = rest.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &rest[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    let full = rest.trim_start_matches(' ');
    // Strip an optional trailing run of hashes, which must be preceded by a
    // space to count as decoration.
    let no_spaces = full.trim_end_matches(' ');
    let no_hashes = no_spaces.trim_end_matches('#');
    let content = if no_hashes.len() < no_spaces.len() && no_hashes.ends_with(' ') {
        no_hashes.trim_end_matches(' ')
    } else {
        no_spaces
    };
    Some((hashes, content.to_string()))
}

fn setext_underline(line: &str) -> Option<usize> {
    let mut rest = line;
    let mut lead = 0;
    while lead < 3 && rest.starts_with(' ') {
        rest = &rest[1..];
        lead += 1;
    }
    let ch = match rest.chars().next() {
        Some(c @ ('=' | '-')) => c,
        _ => return None,
    };
    let rest = rest.trim_start_matches(ch);
    if !rest.chars().all(|c| c == ' ') {
        return None;
    }
    Some(if ch == '=' { 1 } else { 2 })
}

fn parse_indented_code_block(tokens: &[Token], start: usize) -> Option<(Token, usize)> {
    if tokens[start].is_blank_line() {
        return None;
    }
    let mut i = start;
    let first = code_block_line(tokens, &mut i)?;
    let mut body = first;
    body.push('\n');
    while i < tokens.len() {
        match code_block_line(tokens, &mut i) {
            Some(chunk) => {
                body.push_str(&chunk);
                body.push('\n');
            }
            None => break,
        }
    }
    Some((Token::CodeBlock { text: body }, i))
}

// One line of an indented code block, dedented by four columns. An interior
// blank line only counts when another code line follows it.
fn code_block_line(tokens: &[Token], i: &mut usize) -> Option<String> {
    let token = tokens.get(*i)?;
    if token.is_blank_line() {
        let save = *i;
        *i += 1;
        if *i < tokens.len() {
            if let Some(rest) = code_block_line(tokens, i) {
                return Some(format!("\n{}", rest));
            }
        }
        *i = save;
        None
    } else if token.can_contain_markup() {
        let line = token.text()?;
        let bytes = line.as_bytes();
        if bytes.len() >= 4 && bytes[..4].iter().all(|b| *b == b' ') {
            *i += 1;
            Some(line[4..].to_string())
        } else {
            None
        }
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Paragraph consolidation

pub fn consolidate_paragraphs(children: TokenGroup, inhibit: bool) -> TokenGroup {
    let mut children = children;
    for child in &mut children {
        if child.is_container() {
            let inner_inhibit = child.inhibits_paragraphs();
            let group = child.children_mut().expect("container");
            let inner = std::mem::take(group);
            *child.children_mut().expect("container") = consolidate_paragraphs(inner, inner_inhibit);
        }
    }

    let count = children.len();
    let mut out: TokenGroup = Vec::with_capacity(count);
    let mut run: TokenGroup = Vec::new();
    for (idx, token) in children.into_iter().enumerate() {
        let mergeable =
            token.text().is_some() && token.can_contain_markup() && !token.inhibits_paragraphs();
        if mergeable {
            let text = token.text().unwrap_or("");
            let (content, hard_break) = split_trailing_break(text);
            run.push(Token::raw(content));
            // A trailing double space becomes a hard break, except on the
            // container's last line.
            if hard_break && idx + 1 < count {
                run.push(Token::tag("br /"));
            }
        } else {
            flush_paragraph(&mut run, &mut out, inhibit);
            out.push(token);
        }
    }
    flush_paragraph(&mut run, &mut out, inhibit);
    out
}

// Strips leading spaces; reports a trailing run of two or more spaces.
fn split_trailing_break(text: &str) -> (&str, bool) {
    let lead_stripped = text.trim_start_matches(' ');
    let no_trail = lead_stripped.trim_end_matches(' ');
    if lead_stripped.len() - no_trail.len() >= 2 {
        (no_trail, true)
    } else {
        (lead_stripped, false)
    }
}

fn flush_paragraph(run: &mut TokenGroup, out: &mut TokenGroup, inhibit: bool) {
    if run.is_empty() {
        return;
    }
    let tokens = std::mem::take(run);
    if !inhibit {
        out.push(Token::Paragraph { children: tokens });
        return;
    }
    let merged = merge_adjacent_raw_text(tokens);
    if merged.len() > 1 {
        out.push(Token::Container { children: merged });
    } else if let Some(single) = merged.into_iter().next() {
        out.push(single);
    }
}

// Paragraph-inhibited runs keep their line structure by joining adjacent
// text lines with a newline.
fn merge_adjacent_raw_text(tokens: TokenGroup) -> TokenGroup {
    let mut merged: TokenGroup = Vec::new();
    for token in tokens {
        if let Token::RawText {
            text,
            can_markup: true,
        } = &token
        {
            if let Some(Token::RawText {
                text: prev,
                can_markup: true,
            }) = merged.last_mut()
            {
                prev.push('\n');
                prev.push_str(text);
                continue;
            }
        }
        merged.push(token);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_lines(lines: &[&str]) -> TokenGroup {
        lines
            .iter()
            .map(|line| {
                if input::is_blank_line(line) {
                    Token::blank(*line)
                } else {
                    Token::raw(*line)
                }
            })
            .collect()
    }

    #[test]
    fn fence_extraction() {
        let tokens = raw_lines(&["```py", "print(1)", "```", "after"]);
        let out = extract_fenced_blocks(tokens);
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0],
            Token::FencedCodeBlock {
                text: "print(1)\n".to_string(),
                info: "py".to_string()
            }
        );
    }

    #[test]
    fn unclosed_fence_runs_to_end() {
        let tokens = raw_lines(&["~~~", "a", "b"]);
        let out = extract_fenced_blocks(tokens);
        assert_eq!(
            out[0],
            Token::FencedCodeBlock {
                text: "a\nb\n".to_string(),
                info: String::new()
            }
        );
    }

    #[test]
    fn fence_dedents_by_opening_indent() {
        let tokens = raw_lines(&["  ```", "    x", "  ```"]);
        let out = extract_fenced_blocks(tokens);
        assert_eq!(
            out[0],
            Token::FencedCodeBlock {
                text: "  x\n".to_string(),
                info: String::new()
            }
        );
    }

    #[test]
    fn short_closing_run_is_content() {
        let tokens = raw_lines(&["````", "```", "````"]);
        let out = extract_fenced_blocks(tokens);
        assert_eq!(
            out[0],
            Token::FencedCodeBlock {
                text: "```\n".to_string(),
                info: String::new()
            }
        );
    }

    #[test]
    fn reference_scan_lifts_definitions() {
        let mut refs = LinkIds::new();
        let tokens = raw_lines(&["[1]: http://example.com \"T\"", "text"]);
        let out = scan_inline_html_and_references(tokens, &mut refs);
        assert_eq!(out.len(), 1);
        let target = refs.find("1").expect("reference");
        assert_eq!(target.url, "http://example.com");
        assert_eq!(target.title, "T");
    }

    #[test]
    fn reference_title_on_next_line() {
        let mut refs = LinkIds::new();
        let tokens = raw_lines(&["[a]: <http://x.example>", "  (the title)"]);
        let out = scan_inline_html_and_references(tokens, &mut refs);
        assert!(out.is_empty());
        assert_eq!(refs.find("A").map(|t| t.title.as_str()), Some("the title"));
    }

    #[test]
    fn malformed_reference_stays_text() {
        let mut refs = LinkIds::new();
        let tokens = raw_lines(&["[a]: ", "[b] http://x.example"]);
        let out = scan_inline_html_and_references(tokens, &mut refs);
        assert_eq!(out.len(), 2);
        assert!(refs.is_empty());
    }

    #[test]
    fn quote_depths() {
        assert_eq!(quote_prefix("> a"), Some((1, "a")));
        assert_eq!(quote_prefix(">a"), Some((1, "a")));
        assert_eq!(quote_prefix(" > > b"), Some((2, "b")));
        assert_eq!(quote_prefix("no"), None);
        assert_eq!(quote_continuation("> x", 1), Some("x"));
        assert_eq!(quote_continuation("> > x", 1), Some("> x"));
        assert_eq!(quote_continuation("x", 1), None);
    }

    #[test]
    fn horizontal_rules() {
        let hr = |line: &str| parse_horizontal_rule(&[Token::raw(line)], 0).is_some();
        assert!(hr("***"));
        assert!(hr("- - -"));
        assert!(hr("  ___ _"));
        assert!(!hr("**"));
        assert!(!hr("*-*"));
    }

    #[test]
    fn atx_headers() {
        assert_eq!(atx_header("# Title"), Some((1, "Title".to_string())));
        assert_eq!(atx_header("### a b ##"), Some((3, "a b".to_string())));
        assert_eq!(atx_header("## keep#"), Some((2, "keep#".to_string())));
        assert_eq!(atx_header("####### x"), None);
        assert_eq!(atx_header("#nospace"), None);
    }

    #[test]
    fn setext_headers() {
        let tokens = raw_lines(&["Title", "====="]);
        let (header, next) = parse_header(&tokens, 0).expect("header");
        assert_eq!(next, 2);
        assert_eq!(
            header,
            Token::Header {
                level: 1,
                children: vec![Token::raw("Title")]
            }
        );
        let tokens = raw_lines(&["Sub", "--"]);
        let (header, _) = parse_header(&tokens, 0).expect("header");
        assert!(matches!(header, Token::Header { level: 2, .. }));
    }

    #[test]
    fn indented_code_merges_blank_interior() {
        let tokens = raw_lines(&["    a", "", "    b", "text"]);
        let (block, next) = parse_indented_code_block(&tokens, 0).expect("code");
        assert_eq!(next, 3);
        assert_eq!(
            block,
            Token::CodeBlock {
                text: "a\n\nb\n".to_string()
            }
        );
    }

    #[test]
    fn list_markers() {
        let (lead, _, indent, content) = list_marker("* one").expect("marker");
        assert_eq!((lead, indent, content.as_str()), (0, 2, "one"));
        let (_, _, indent, _) = list_marker("12. item").expect("marker");
        assert_eq!(indent, 4);
        assert!(list_marker("*nospace").is_none());
        assert!(list_marker("* * *").is_none());
        assert!(list_marker("1) ok").is_some());
    }

    #[test]
    fn single_unindented_item_is_not_a_list() {
        let tokens = raw_lines(&["- alone", "", "para"]);
        assert!(parse_list(&tokens, 0, 0).is_none());
    }

    #[test]
    fn two_items_form_a_list() {
        let tokens = raw_lines(&["* one", "* two"]);
        let (list, next) = parse_list(&tokens, 0, 0).expect("list");
        assert_eq!(next, 2);
        match list {
            Token::UnorderedList { items } => {
                assert_eq!(items.len(), 2);
                // No blank separation, so the list is tight.
                assert!(items.iter().all(Token::inhibits_paragraphs));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn blank_separated_items_are_loose() {
        let tokens = raw_lines(&["* one", "", "* two"]);
        let (list, _) = parse_list(&tokens, 0, 0).expect("list");
        match list {
            Token::UnorderedList { items } => {
                assert!(items.iter().all(|item| !item.inhibits_paragraphs()));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn paragraph_consolidation_inserts_breaks() {
        let tokens = vec![Token::raw("a  "), Token::raw("b")];
        let out = consolidate_paragraphs(tokens, false);
        assert_eq!(
            out,
            vec![Token::Paragraph {
                children: vec![Token::raw("a"), Token::tag("br /"), Token::raw("b")]
            }]
        );
    }

    #[test]
    fn trailing_break_needs_two_spaces_and_a_next_line() {
        let tokens = vec![Token::raw("a "), Token::raw("b  ")];
        let out = consolidate_paragraphs(tokens, false);
        assert_eq!(
            out,
            vec![Token::Paragraph {
                children: vec![Token::raw("a "), Token::raw("b")]
            }]
        );
    }
}
