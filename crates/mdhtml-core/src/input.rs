//! Line ingestion: terminator handling, tab expansion, blank-line detection.

/// Tab stop for the leading-whitespace segment of a line, fixed by the
/// Markdown format. Later tabs use the configured width.
pub const INITIAL_TAB_STOP: usize = 4;

/// Split raw input into physical lines, accepting `\n`, `\r`, `\r\n` and
/// `\n\r` terminators, expanding tabs as it goes. A trailing line without a
/// terminator is kept; a trailing terminator does not produce an empty line.
pub fn split_lines(src: &str, spaces_per_tab: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut chars = src.chars().peekable();
    let mut line = LineBuilder::new(spaces_per_tab);
    while let Some(ch) = chars.next() {
        match ch {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                lines.push(line.finish());
                line = LineBuilder::new(spaces_per_tab);
            }
            '\n' => {
                if chars.peek() == Some(&'\r') {
                    chars.next();
                }
                lines.push(line.finish());
                line = LineBuilder::new(spaces_per_tab);
            }
            _ => line.push(ch),
        }
    }
    let last = line.finish();
    if !last.is_empty() {
        lines.push(last);
    }
    lines
}

struct LineBuilder {
    text: String,
    column: usize,
    leading: bool,
    spaces_per_tab: usize,
}

impl LineBuilder {
    fn new(spaces_per_tab: usize) -> Self {
        Self {
            text: String::new(),
            column: 0,
            leading: true,
            spaces_per_tab,
        }
    }

    fn push(&mut self, ch: char) {
        match ch {
            '\t' => {
                let stop = if self.leading {
                    INITIAL_TAB_STOP
                } else {
                    self.spaces_per_tab
                };
                self.leading = false;
                let pad = stop - self.column % stop;
                for _ in 0..pad {
                    self.text.push(' ');
                }
                self.column += pad;
            }
            ' ' => {
                self.text.push(' ');
                self.column += 1;
            }
            _ => {
                self.leading = false;
                self.text.push(ch);
                self.column += 1;
            }
        }
    }

    fn finish(self) -> String {
        self.text
    }
}

/// A line is blank when, after at most three leading spaces, it holds only
/// whitespace and complete `<!-- ... -->` comment spans.
pub fn is_blank_line(line: &str) -> bool {
    let mut rest = line;
    let mut lead = 0;
    while lead < 3 && rest.starts_with(' ') {
        rest = &rest[1..];
        lead += 1;
    }
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return true;
        }
        match rest.strip_prefix("<!--") {
            Some(after) => match skip_comment_close(after) {
                Some(after) => rest = after,
                None => return false,
            },
            None => return false,
        }
    }
}

// Find the end of a comment span: `--`, optional spaces, `>`.
fn skip_comment_close(text: &str) -> Option<&str> {
    let mut search = text;
    loop {
        let dash = search.find("--")?;
        let after = &search[dash + 2..];
        let trimmed = after.trim_start_matches(' ');
        if let Some(rest) = trimmed.strip_prefix('>') {
            return Some(rest);
        }
        search = &search[dash + 2..];
    }
}
