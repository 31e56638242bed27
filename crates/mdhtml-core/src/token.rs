pub type TokenGroup = Vec<Token>;

/// Resolution state of a bold/italic marker. Markers start as candidates,
/// get paired under a shared match id, and may be disabled when a run is
/// split into two smaller markers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MarkerState {
    Candidate,
    Matched(u32),
    Disabled,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EmphasisMarker {
    pub open: bool,
    pub ch: u8,
    pub len: usize,
    pub state: MarkerState,
}

impl EmphasisMarker {
    pub fn new(open: bool, ch: u8, len: usize) -> Self {
        Self {
            open,
            ch,
            len,
            state: MarkerState::Candidate,
        }
    }

    pub fn literal(&self) -> String {
        std::iter::repeat_n(self.ch as char, self.len).collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Literal text pending span processing. `can_markup` is cleared for
    /// text that must never be re-scanned (autolink labels and the like).
    RawText { text: String, can_markup: bool },
    /// A line that is empty or only whitespace/HTML comments. The original
    /// text is kept so HTML blocks can reproduce it.
    BlankLine { text: String },
    /// A literal or synthesized HTML tag; `contents` is everything between
    /// the angle brackets (`"hr /"`, `"/a"`, `"a href=..."`).
    HtmlTag { contents: String },
    InlineHtmlContents { text: String },
    InlineHtmlComment { text: String },
    CodeBlock { text: String },
    FencedCodeBlock { text: String, info: String },
    CodeSpan { text: String },
    /// A quoted attribute fragment (`= "value"`) protected from span
    /// processing inside a recognized tag.
    AttributeText { text: String },
    EscapedCharacter { ch: char },
    Image { alt: String, url: String, title: String },
    /// An opening `<a href=...>` produced by link resolution; the matching
    /// `</a>` is a plain `HtmlTag`.
    AnchorOpen { url: String, title: String },
    EmphasisMarker(EmphasisMarker),
    Container { children: TokenGroup },
    Paragraph { children: TokenGroup },
    Header { level: usize, children: TokenGroup },
    BlockQuote { children: TokenGroup },
    /// `wrap_paragraphs` is set when the owning list is loose.
    ListItem { children: TokenGroup, wrap_paragraphs: bool },
    UnorderedList { items: TokenGroup },
    OrderedList { items: TokenGroup },
    InlineHtmlBlock { children: TokenGroup },
}

impl Token {
    pub fn raw(text: impl Into<String>) -> Self {
        Token::RawText {
            text: text.into(),
            can_markup: true,
        }
    }

    pub fn raw_literal(text: impl Into<String>) -> Self {
        Token::RawText {
            text: text.into(),
            can_markup: false,
        }
    }

    pub fn blank(text: impl Into<String>) -> Self {
        Token::BlankLine { text: text.into() }
    }

    pub fn tag(contents: impl Into<String>) -> Self {
        Token::HtmlTag {
            contents: contents.into(),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Token::RawText { text, .. }
            | Token::BlankLine { text }
            | Token::InlineHtmlContents { text }
            | Token::InlineHtmlComment { text }
            | Token::CodeBlock { text }
            | Token::FencedCodeBlock { text, .. }
            | Token::CodeSpan { text }
            | Token::AttributeText { text } => Some(text),
            Token::HtmlTag { contents } => Some(contents),
            _ => None,
        }
    }

    pub fn is_raw_text(&self) -> bool {
        matches!(self, Token::RawText { .. })
    }

    pub fn is_blank_line(&self) -> bool {
        matches!(self, Token::BlankLine { .. })
    }

    pub fn can_contain_markup(&self) -> bool {
        matches!(self, Token::RawText { can_markup: true, .. })
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Token::Container { .. }
                | Token::Paragraph { .. }
                | Token::Header { .. }
                | Token::BlockQuote { .. }
                | Token::ListItem { .. }
                | Token::UnorderedList { .. }
                | Token::OrderedList { .. }
                | Token::InlineHtmlBlock { .. }
        )
    }

    /// True for containers whose raw-text runs must not be wrapped in
    /// paragraph nodes by the consolidation pass.
    pub fn inhibits_paragraphs(&self) -> bool {
        match self {
            Token::Header { .. } | Token::Paragraph { .. } => true,
            Token::ListItem {
                wrap_paragraphs, ..
            } => !*wrap_paragraphs,
            _ => false,
        }
    }

    pub fn children(&self) -> Option<&TokenGroup> {
        match self {
            Token::Container { children }
            | Token::Paragraph { children }
            | Token::Header { children, .. }
            | Token::BlockQuote { children }
            | Token::ListItem { children, .. }
            | Token::UnorderedList { items: children }
            | Token::OrderedList { items: children }
            | Token::InlineHtmlBlock { children } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut TokenGroup> {
        match self {
            Token::Container { children }
            | Token::Paragraph { children }
            | Token::Header { children, .. }
            | Token::BlockQuote { children }
            | Token::ListItem { children, .. }
            | Token::UnorderedList { items: children }
            | Token::OrderedList { items: children }
            | Token::InlineHtmlBlock { children } => Some(children),
            _ => None,
        }
    }

    pub fn marker(&self) -> Option<&EmphasisMarker> {
        match self {
            Token::EmphasisMarker(marker) => Some(marker),
            _ => None,
        }
    }

    pub fn marker_mut(&mut self) -> Option<&mut EmphasisMarker> {
        match self {
            Token::EmphasisMarker(marker) => Some(marker),
            _ => None,
        }
    }

    pub fn is_unmatched_open_marker(&self) -> bool {
        self.marker()
            .is_some_and(|m| m.open && m.state == MarkerState::Candidate)
    }

    pub fn is_unmatched_close_marker(&self) -> bool {
        self.marker()
            .is_some_and(|m| !m.open && m.state == MarkerState::Candidate)
    }

    pub fn is_matched_open_marker(&self) -> bool {
        self.marker()
            .is_some_and(|m| m.open && matches!(m.state, MarkerState::Matched(_)))
    }

    pub fn is_matched_close_marker(&self) -> bool {
        self.marker()
            .is_some_and(|m| !m.open && matches!(m.state, MarkerState::Matched(_)))
    }

    /// Type name for the debug token dump.
    pub fn name(&self) -> &'static str {
        match self {
            Token::RawText { .. } => "RawText",
            Token::BlankLine { .. } => "BlankLine",
            Token::HtmlTag { .. } => "HtmlTag",
            Token::InlineHtmlContents { .. } => "InlineHtmlContents",
            Token::InlineHtmlComment { .. } => "InlineHtmlComment",
            Token::CodeBlock { .. } => "CodeBlock",
            Token::FencedCodeBlock { .. } => "FencedCodeBlock",
            Token::CodeSpan { .. } => "CodeSpan",
            Token::AttributeText { .. } => "AttributeText",
            Token::EscapedCharacter { .. } => "EscapedCharacter",
            Token::Image { .. } => "Image",
            Token::AnchorOpen { .. } => "AnchorOpen",
            Token::EmphasisMarker(_) => "EmphasisMarker",
            Token::Container { .. } => "Container",
            Token::Paragraph { .. } => "Paragraph",
            Token::Header { .. } => "Header",
            Token::BlockQuote { .. } => "BlockQuote",
            Token::ListItem { .. } => "ListItem",
            Token::UnorderedList { .. } => "UnorderedList",
            Token::OrderedList { .. } => "OrderedList",
            Token::InlineHtmlBlock { .. } => "InlineHtmlBlock",
        }
    }
}
