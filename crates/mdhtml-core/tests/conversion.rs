use mdhtml_core::{Document, Options};
use pretty_assertions::assert_eq;

fn html(src: &str) -> String {
    let mut doc = Document::new(Options::default());
    doc.read(src).expect("document accepts input");
    doc.to_html()
}

#[test]
fn plain_text_becomes_one_paragraph() {
    assert_eq!(html("line one\nline two\n"), "<p>line one\nline two</p>\n");
}

#[test]
fn text_is_html_escaped() {
    assert_eq!(
        html("AT&T <3 &amp; more\n"),
        "<p>AT&amp;T &lt;3 &amp; more</p>\n"
    );
}

#[test]
fn strong_emphasis() {
    assert_eq!(html("**bold**\n"), "<p><strong>bold</strong></p>\n");
}

#[test]
fn emphasis_with_both_marker_characters() {
    assert_eq!(html("*a* _b_\n"), "<p><em>a</em> <em>b</em></p>\n");
}

#[test]
fn unbalanced_emphasis_is_pinned() {
    // The first pair crosses the second and is unmatched by the nesting
    // stack; the inner pair survives.
    assert_eq!(html("*a *b* c*\n"), "<p>*a <em>b* c</em></p>\n");
}

#[test]
fn doubly_ambiguous_triple_runs_are_pinned() {
    assert_eq!(
        html("***a***b***\n"),
        "<p><strong><em>a***b</em></strong></p>\n"
    );
}

#[test]
fn triple_against_single_splits() {
    assert_eq!(html("***a*\n"), "<p>**<em>a</em></p>\n");
}

#[test]
fn combined_bold_italic() {
    assert_eq!(
        html("***both***\n"),
        "<p><strong><em>both</em></strong></p>\n"
    );
}

#[test]
fn underscores_inside_words_stay_literal() {
    assert_eq!(
        html("a_b_c and _under_\n"),
        "<p>a_b_c and <em>under</em></p>\n"
    );
}

#[test]
fn fenced_code_with_language() {
    assert_eq!(
        html("```py\nprint(1)\n```\n"),
        "<pre><code class=\"language-py\">print(1)\n</code></pre>\n\n"
    );
}

#[test]
fn fenced_code_without_info_is_escaped() {
    assert_eq!(
        html("~~~\na < b\n~~~\n"),
        "<pre><code>a &lt; b\n</code></pre>\n\n"
    );
}

#[test]
fn reference_link_resolves_with_title() {
    assert_eq!(
        html("[x][1]\n\n[1]: http://example.com \"T\"\n"),
        "<p><a href=\"http://example.com\" title=\"T\">x</a></p>\n\n"
    );
}

#[test]
fn reference_ids_are_case_insensitive() {
    assert_eq!(
        html("[x][Ref]\n\n[ref]: http://example.com\n"),
        "<p><a href=\"http://example.com\">x</a></p>\n\n"
    );
}

#[test]
fn unresolved_reference_degrades_to_text() {
    assert_eq!(html("[x][nope]\n"), "<p>[x][nope]</p>\n");
}

#[test]
fn inline_link_and_image() {
    assert_eq!(
        html("[go](http://example.com)\n"),
        "<p><a href=\"http://example.com\">go</a></p>\n"
    );
    assert_eq!(
        html("![alt](img.png \"T\")\n"),
        "<p><img src=\"img.png\" alt=\"alt\" title=\"T\"/></p>\n"
    );
}

#[test]
fn inline_link_url_may_contain_parentheses() {
    assert_eq!(
        html("[x](http://e.example/a(b)c)\n"),
        "<p><a href=\"http://e.example/a(b)c\">x</a></p>\n"
    );
}

#[test]
fn inline_link_text_matches_greedily() {
    // The link text match is greedy: with two bracket pairs on one line the
    // outermost span wins and the last URL segment supplies the target.
    assert_eq!(
        html("see [a](x) and [b](y)\n"),
        "<p>see <a href=\"y\">a](x) and [b</a></p>\n"
    );
}

#[test]
fn emphasis_resolves_inside_link_text() {
    assert_eq!(
        html("[*em* text](http://example.com)\n"),
        "<p><a href=\"http://example.com\"><em>em</em> text</a></p>\n"
    );
}

#[test]
fn autolink_url() {
    assert_eq!(
        html("<http://example.com>\n"),
        "<p><a href=\"http://example.com\">http://example.com</a></p>\n"
    );
}

#[test]
fn autolink_email_is_obfuscated() {
    let out = html("<a@b.com>\n");
    assert!(out.starts_with("<p><a href=\"&#109;&#x61;"), "got {out}");
    assert!(out.ends_with("</a></p>\n"), "got {out}");
    assert!(!out.contains("a@b.com"), "address must be obfuscated: {out}");
}

#[test]
fn unknown_angle_construct_stays_literal() {
    assert_eq!(html("<nope>\n"), "<p>&lt;nope&gt;</p>\n");
}

#[test]
fn escaped_punctuation() {
    assert_eq!(html("\\*not em\\*\n"), "<p>*not em*</p>\n");
    assert_eq!(html("\\q stays\n"), "<p>\\q stays</p>\n");
}

#[test]
fn hard_line_break() {
    assert_eq!(html("a  \nb\n"), "<p>a<br />\nb</p>\n");
}

#[test]
fn trailing_double_space_on_last_line_is_not_a_break() {
    assert_eq!(html("a  \n"), "<p>a</p>\n");
}

#[test]
fn atx_headers() {
    assert_eq!(html("# One\n"), "<h1>One</h1>\n");
    assert_eq!(html("### Three ###\n"), "<h3>Three</h3>\n");
}

#[test]
fn setext_headers() {
    assert_eq!(html("One\n===\n"), "<h1>One</h1>\n");
    assert_eq!(html("Two\n---\n"), "<h2>Two</h2>\n");
}

#[test]
fn horizontal_rule() {
    assert_eq!(html("* * *\n"), "<hr />");
    assert_eq!(html("---\n"), "<hr />");
}

#[test]
fn block_quote() {
    assert_eq!(
        html("> a\n> b\n"),
        "<blockquote>\n<p>a\nb</p>\n</blockquote>\n"
    );
}

#[test]
fn nested_block_quote() {
    assert_eq!(
        html("> outer\n> > inner\n"),
        "<blockquote>\n<p>outer</p>\n<blockquote>\n<p>inner</p>\n</blockquote>\n</blockquote>\n"
    );
}

#[test]
fn indented_code_block() {
    assert_eq!(html("    a & b\n"), "<pre><code>a &amp; b\n</code></pre>\n");
}

#[test]
fn code_after_paragraph_line_is_continuation() {
    assert_eq!(
        html("para\n    still para\n"),
        "<p>para\nstill para</p>\n"
    );
}

#[test]
fn tight_list() {
    assert_eq!(
        html("* one\n* two\n"),
        "<ul>\n<li>one</li>\n<li>two</li>\n</ul>\n"
    );
}

#[test]
fn loose_list_wraps_items_in_paragraphs() {
    assert_eq!(
        html("* one\n\n* two\n"),
        "<ul>\n<li><p>one</p>\n</li>\n<li><p>two</p>\n</li>\n</ul>\n"
    );
}

#[test]
fn ordered_list() {
    assert_eq!(
        html("1. a\n2. b\n"),
        "<ol>\n<li>a</li>\n<li>b</li>\n</ol>\n"
    );
}

#[test]
fn nested_list() {
    assert_eq!(
        html("* top\n  * sub\n  * sub2\n* next\n"),
        "<ul>\n<li>top<ul>\n<li>sub</li>\n<li>sub2</li>\n</ul>\n</li>\n<li>next</li>\n</ul>\n"
    );
}

#[test]
fn lone_marker_line_is_not_a_list() {
    assert_eq!(html("- alone\n"), "<p>- alone</p>\n");
    assert_eq!(
        html("1986. What a season.\n"),
        "<p>1986. What a season.</p>\n"
    );
}

#[test]
fn html_block_passthrough() {
    assert_eq!(
        html("<div class=\"note\">\ncontent & more\n</div>\n"),
        "<div class=\"note\">\ncontent &amp; more\n</div>\n"
    );
}

#[test]
fn single_line_span_tag_is_not_a_block() {
    assert_eq!(
        html("<em>x</em>\n"),
        "<p><em>x</em></p>\n"
    );
}

#[test]
fn html_comment_block_passthrough() {
    assert_eq!(
        html("<!-- note\nstill going -->\n"),
        "<!-- note\nstill going -->\n"
    );
}

#[test]
fn split_tag_lines_are_merged() {
    let out = html("<div\n class=\"x\">\ncontent\n</div>\n");
    assert!(out.contains("class=\"x\""), "got {out}");
    assert!(out.contains("</div>"), "got {out}");
}

#[test]
fn attribute_values_protect_markup() {
    assert_eq!(
        html("<a href=\"x_y_z\">t</a>\n"),
        "<p><a href=\"x_y_z\">t</a></p>\n"
    );
}
