//! Story body rendering.

use comrak::{Options, markdown_to_html};

/// Render Markdown to HTML with GitHub Flavored Markdown extensions.
///
/// Raw HTML in the source is not passed through.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    options.render.r#unsafe = false;

    markdown_to_html(content, &options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_basic_markdown() {
        let html = render_markdown("# Gayo\n\nNotes of **dark chocolate**.");
        assert!(html.contains("<h1>"));
        assert!(html.contains("<strong>dark chocolate</strong>"));
    }

    #[test]
    fn test_raw_html_is_not_passed_through() {
        let html = render_markdown("hello <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_tables_enabled() {
        let html = render_markdown("| Brew | Ratio |\n|---|---|\n| V60 | 1:15 |");
        assert!(html.contains("<table>"));
    }
}
