//! HTML serialization. Every token type owns its exact output form; the
//! renderer adds no whitespace beyond what a node type specifies.

use crate::document::SyntaxHighlighter;
use crate::escape::{self, AMPS, ANGLES, DOUBLE_AMPS, QUOTES};
use crate::token::{MarkerState, Token, TokenGroup};

pub(crate) struct HtmlRenderer<'a> {
    highlighter: Option<&'a dyn SyntaxHighlighter>,
}

impl<'a> HtmlRenderer<'a> {
    pub(crate) fn new(highlighter: Option<&'a dyn SyntaxHighlighter>) -> Self {
        Self { highlighter }
    }

    pub(crate) fn render_group(&self, tokens: &TokenGroup) -> String {
        let mut out = String::new();
        for token in tokens {
            self.write_token(&mut out, token);
        }
        out
    }

    fn write_group(&self, out: &mut String, tokens: &TokenGroup) {
        for token in tokens {
            self.write_token(out, token);
        }
    }

    fn write_token(&self, out: &mut String, token: &Token) {
        match token {
            Token::RawText { text, .. } => escape::encode_into(out, text, AMPS | ANGLES),
            Token::BlankLine { text } => {
                out.push_str(text);
                out.push('\n');
            }
            Token::HtmlTag { contents } => {
                out.push('<');
                escape::encode_into(out, contents, AMPS | ANGLES);
                out.push('>');
            }
            Token::InlineHtmlContents { text } => escape::encode_into(out, text, AMPS),
            Token::InlineHtmlComment { text } => out.push_str(text),
            Token::CodeBlock { text } => {
                out.push_str("<pre><code>");
                escape::encode_into(out, text, DOUBLE_AMPS | ANGLES);
                out.push_str("</code></pre>\n");
            }
            Token::FencedCodeBlock { text, info } => self.write_fenced(out, text, info),
            Token::CodeSpan { text } => {
                out.push_str("<code>");
                escape::encode_into(out, text, DOUBLE_AMPS | ANGLES);
                out.push_str("</code>");
            }
            Token::AttributeText { text } => escape::encode_into(out, text, AMPS | ANGLES),
            Token::EscapedCharacter { ch } => {
                escape::encode_into(out, ch.encode_utf8(&mut [0u8; 4]), AMPS | ANGLES)
            }
            Token::Image { alt, url, title } => {
                out.push_str("<img src=\"");
                escape::encode_into(out, url, QUOTES | AMPS);
                out.push_str("\" alt=\"");
                escape::encode_into(out, alt, QUOTES | AMPS);
                out.push('"');
                if !title.is_empty() {
                    out.push_str(" title=\"");
                    escape::encode_into(out, title, QUOTES | AMPS);
                    out.push('"');
                }
                out.push_str("/>");
            }
            Token::AnchorOpen { url, title } => {
                out.push_str("<a href=\"");
                escape::encode_into(out, url, QUOTES | AMPS);
                out.push('"');
                if !title.is_empty() {
                    out.push_str(" title=\"");
                    escape::encode_into(out, title, QUOTES | AMPS);
                    out.push('"');
                }
                out.push('>');
            }
            Token::EmphasisMarker(marker) => match marker.state {
                MarkerState::Disabled => {}
                MarkerState::Candidate => out.push_str(&marker.literal()),
                MarkerState::Matched(_) => out.push_str(match (marker.open, marker.len) {
                    (true, 1) => "<em>",
                    (true, 2) => "<strong>",
                    (true, _) => "<strong><em>",
                    (false, 1) => "</em>",
                    (false, 2) => "</strong>",
                    (false, _) => "</em></strong>",
                }),
            },
            Token::Container { children } | Token::InlineHtmlBlock { children } => {
                self.write_group(out, children)
            }
            Token::Paragraph { children } => {
                out.push_str("<p>");
                for (idx, child) in children.iter().enumerate() {
                    self.write_token(out, child);
                    // Line fragments keep their soft breaks.
                    if let Some(next) = children.get(idx + 1) {
                        if next.is_raw_text()
                            || next.is_unmatched_open_marker()
                            || next.is_unmatched_close_marker()
                        {
                            out.push('\n');
                        }
                    }
                }
                out.push_str("</p>\n");
            }
            Token::Header { level, children } => {
                out.push_str(&format!("<h{}>", level));
                self.write_group(out, children);
                out.push_str(&format!("</h{}>\n", level));
            }
            Token::BlockQuote { children } => {
                out.push_str("<blockquote>\n");
                self.write_group(out, children);
                out.push_str("</blockquote>\n");
            }
            Token::ListItem { children, .. } => {
                out.push_str("<li>");
                self.write_group(out, children);
                out.push_str("</li>\n");
            }
            Token::UnorderedList { items } => {
                out.push_str("<ul>\n");
                self.write_group(out, items);
                out.push_str("</ul>\n");
            }
            Token::OrderedList { items } => {
                out.push_str("<ol>\n");
                self.write_group(out, items);
                out.push_str("</ol>\n");
            }
        }
    }

    fn write_fenced(&self, out: &mut String, text: &str, info: &str) {
        let lang = info.split_whitespace().next().unwrap_or("");
        if lang.is_empty() {
            out.push_str("<pre><code>");
            escape::encode_into(out, text, DOUBLE_AMPS | ANGLES);
        } else {
            out.push_str("<pre><code class=\"language-");
            escape::encode_into(out, lang, QUOTES | AMPS);
            out.push_str("\">");
            match self.highlighter {
                Some(highlighter) => highlighter.highlight(text, lang, out),
                None => out.push_str(text),
            }
        }
        out.push_str("</code></pre>\n\n");
    }
}

/// Render the token tree as indented type names, one per line, two spaces
/// per depth. Diagnostic output only.
pub(crate) fn token_dump(tokens: &TokenGroup) -> String {
    let mut out = String::new();
    for token in tokens {
        dump_token(&mut out, token, 0);
    }
    out
}

fn dump_token(out: &mut String, token: &Token, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(token.name());
    match token {
        Token::EmphasisMarker(marker) => {
            let state = match marker.state {
                MarkerState::Candidate => "unmatched",
                MarkerState::Matched(_) => "matched",
                MarkerState::Disabled => "disabled",
            };
            out.push_str(&format!(
                ": {} {} {}",
                marker.literal(),
                if marker.open { "open" } else { "close" },
                state
            ));
        }
        Token::EscapedCharacter { ch } => out.push_str(&format!(": {}", ch)),
        Token::Image { url, .. } | Token::AnchorOpen { url, .. } => {
            out.push_str(&format!(": {}", url))
        }
        Token::Header { level, .. } => out.push_str(&format!(": {}", level)),
        _ => {
            if let Some(text) = token.text() {
                out.push_str(": ");
                out.push_str(&text.replace('\n', "\\n"));
            }
        }
    }
    out.push('\n');
    if let Some(children) = token.children() {
        for child in children {
            dump_token(out, child, depth + 1);
        }
    }
}
