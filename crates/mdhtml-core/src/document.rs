//! The document front door: input accumulation, the fixed pass pipeline,
//! memoized rendering, and the thin host facade.

use std::io::{self, Read, Write};

use thiserror::Error;

use crate::block;
use crate::input;
use crate::refs::LinkIds;
use crate::render::{self, HtmlRenderer};
use crate::span;
use crate::token::{Token, TokenGroup};

pub const DEFAULT_SPACES_PER_TAB: usize = 4;

#[derive(Clone, Copy, Debug)]
pub struct Options {
    /// Tab stop used past the leading-whitespace segment of a line. The
    /// leading segment always uses a stop of four, as the format requires.
    pub spaces_per_tab: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            spaces_per_tab: DEFAULT_SPACES_PER_TAB,
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// `read` was called after processing had begun.
    #[error("document no longer accepts input once processing has started")]
    ClosedForInput,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Collaborator invoked while rendering fenced code blocks that carry a
/// language tag. The default behavior writes the code verbatim.
pub trait SyntaxHighlighter {
    fn highlight(&self, code: &str, lang: &str, out: &mut String) {
        let _ = lang;
        out.push_str(code);
    }
}

/// The built-in pass-through highlighter.
#[derive(Clone, Copy, Debug, Default)]
pub struct VerbatimHighlighter;

impl SyntaxHighlighter for VerbatimHighlighter {}

/// A single Markdown document. Input may be fed in several `read` calls;
/// the first `write` runs the transformation pipeline exactly once and
/// caches the rendered HTML, after which the document is closed for input.
pub struct Document<'h> {
    options: Options,
    children: TokenGroup,
    refs: LinkIds,
    highlighter: Option<&'h dyn SyntaxHighlighter>,
    processed: bool,
    rendered: Option<String>,
}

impl<'h> Document<'h> {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            children: TokenGroup::new(),
            refs: LinkIds::new(),
            highlighter: None,
            processed: false,
            rendered: None,
        }
    }

    pub fn with_highlighter(highlighter: &'h dyn SyntaxHighlighter, options: Options) -> Self {
        Self {
            highlighter: Some(highlighter),
            ..Self::new(options)
        }
    }

    /// Append more source text. Fails once processing has begun, leaving
    /// the document untouched.
    pub fn read(&mut self, src: &str) -> Result<(), Error> {
        if self.processed {
            return Err(Error::ClosedForInput);
        }
        for line in input::split_lines(src, self.options.spaces_per_tab) {
            if input::is_blank_line(&line) {
                self.children.push(Token::blank(line));
            } else {
                self.children.push(Token::raw(line));
            }
        }
        Ok(())
    }

    pub fn read_from<R: Read>(&mut self, mut reader: R) -> Result<(), Error> {
        if self.processed {
            return Err(Error::ClosedForInput);
        }
        let mut src = String::new();
        reader.read_to_string(&mut src)?;
        self.read(&src)
    }

    /// Render to HTML, transforming on first use.
    pub fn write<W: Write>(&mut self, mut out: W) -> Result<(), Error> {
        let html = self.rendered_html();
        out.write_all(html.as_bytes())?;
        Ok(())
    }

    pub fn to_html(&mut self) -> String {
        self.rendered_html().to_string()
    }

    /// Dump the processed token tree, one node per line. Diagnostic output.
    pub fn write_tokens<W: Write>(&mut self, mut out: W) -> Result<(), Error> {
        let dump = self.token_dump();
        out.write_all(dump.as_bytes())?;
        Ok(())
    }

    pub fn token_dump(&mut self) -> String {
        self.process();
        render::token_dump(&self.children)
    }

    fn rendered_html(&mut self) -> &str {
        if self.rendered.is_none() {
            self.process();
            let renderer = HtmlRenderer::new(self.highlighter);
            self.rendered = Some(renderer.render_group(&self.children));
        }
        self.rendered.as_deref().expect("rendered html")
    }

    fn process(&mut self) {
        if self.processed {
            return;
        }
        let children = std::mem::take(&mut self.children);
        log::trace!(
            target: "mdhtml.pipeline",
            "processing document of {} lines",
            children.len()
        );
        let children = block::extract_fenced_blocks(children);
        let children = block::merge_multiline_html_tags(children);
        let children = block::scan_inline_html_and_references(children, &mut self.refs);
        log::trace!(target: "mdhtml.pipeline", "parsing block structure");
        let children = block::parse_block_structure(children, 0);
        let children = block::consolidate_paragraphs(children, false);
        log::trace!(target: "mdhtml.pipeline", "resolving spans");
        let children = span::process_spans(children, &self.refs);
        self.children = children;
        self.processed = true;
    }
}

/// Document kinds the facade can dispatch to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum DocumentKind {
    Markdown,
}

/// Thin facade for hosts that pick a document kind at run time and only
/// forward read and write calls.
pub struct Processor<'h> {
    document: Document<'h>,
}

impl<'h> Processor<'h> {
    pub fn new(kind: DocumentKind, options: Options) -> Self {
        match kind {
            DocumentKind::Markdown => Self {
                document: Document::new(options),
            },
        }
    }

    pub fn with_highlighter(
        kind: DocumentKind,
        highlighter: &'h dyn SyntaxHighlighter,
        options: Options,
    ) -> Self {
        match kind {
            DocumentKind::Markdown => Self {
                document: Document::with_highlighter(highlighter, options),
            },
        }
    }

    pub fn read(&mut self, src: &str) -> Result<(), Error> {
        self.document.read(src)
    }

    pub fn read_from<R: Read>(&mut self, reader: R) -> Result<(), Error> {
        self.document.read_from(reader)
    }

    pub fn write<W: Write>(&mut self, out: W) -> Result<(), Error> {
        self.document.write(out)
    }

    pub fn to_html(&mut self) -> String {
        self.document.to_html()
    }
}
