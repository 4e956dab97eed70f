//! Markdown conversion behind the `MarkupConverter` seam

use pulldown_cmark::{html, Options, Parser};

use crate::render::sanitize::sanitize_html;

/// Fixed output for empty or whitespace-only source text; conversion is
/// bypassed entirely
pub const EMPTY_PREVIEW_HTML: &str = "<p>Preview will appear here.</p>";

/// Converts document text to markup. Structural output is trusted; any
/// content echoed from the source text is not.
pub trait MarkupConverter {
    fn to_markup(&self, text: &str) -> String;
}

/// GFM-flavored converter backed by pulldown-cmark
pub struct CommonMarkConverter {
    options: Options,
}

impl CommonMarkConverter {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options }
    }
}

impl Default for CommonMarkConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupConverter for CommonMarkConverter {
    fn to_markup(&self, text: &str) -> String {
        let parser = Parser::new_ext(text, self.options);
        let mut out = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// Convert and sanitize document text into display-ready markup
pub fn render_preview(content: &str, converter: &dyn MarkupConverter) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return EMPTY_PREVIEW_HTML.to_string();
    }
    sanitize_html(&converter.to_markup(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(content: &str) -> String {
        render_preview(content, &CommonMarkConverter::new())
    }

    #[test]
    fn empty_or_whitespace_content_yields_placeholder() {
        assert_eq!(render(""), EMPTY_PREVIEW_HTML);
        assert_eq!(render("   \n\t  "), EMPTY_PREVIEW_HTML);
    }

    #[test]
    fn renders_gfm_table() {
        let md = "| Name | Age |\n| --- | --- |\n| Alice | 30 |";
        let out = render(md);
        assert!(out.contains("<table>"));
        assert!(out.contains("<th>Name</th>"));
        assert!(out.contains("<td>Alice</td>"));
    }

    #[test]
    fn renders_task_list_checkboxes() {
        let out = render("- [x] Done\n- [ ] Todo");
        assert!(out.contains("type=\"checkbox\""));
        assert!(out.contains("checked"));
    }

    #[test]
    fn renders_code_blocks() {
        let out = render("```js\nconsole.log('hi');\n```");
        assert!(out.contains("<pre>"));
        assert!(out.contains("<code"));
    }

    #[test]
    fn renders_inline_code() {
        let out = render("Use `foo()` here.");
        assert!(out.contains("<code>foo()</code>"));
    }

    #[test]
    fn renders_strikethrough() {
        let out = render("~~gone~~");
        assert!(out.contains("<del>gone</del>"));
    }

    #[test]
    fn inline_script_is_sanitized_away() {
        let out = render("<script>alert(1)</script>Hello");
        assert!(!out.contains("<script"));
        assert!(out.contains("Hello"));
    }

    #[test]
    fn inline_event_handlers_are_sanitized_away() {
        let out = render("<div onclick=\"x\">Click</div>");
        assert!(!out.contains("onclick="));
        assert!(out.contains("Click"));
    }

    #[test]
    fn javascript_links_are_sanitized_away() {
        let out = render("<a href=\"javascript:alert(1)\">link</a>");
        assert!(!out.contains("javascript:"));
    }

    #[test]
    fn rendered_output_is_a_sanitizer_fixed_point() {
        let out = render("# Title\n\n<div style=\"x\">body</div>\n\n- [ ] task");
        assert_eq!(crate::render::sanitize::sanitize_html(&out), out);
    }
}
