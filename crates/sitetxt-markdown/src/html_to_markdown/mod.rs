//! Converts HTML content to Markdown.
pub mod converter;
pub mod error;
pub mod node;
pub mod options;
pub mod parser;

use scraper::{Html, Selector};
use std::sync::LazyLock;

pub use error::HtmlToMarkdownError;
pub use options::ConversionOptions;

pub(crate) static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("Failed to parse 'body' selector"));

/// Converts a whole HTML document (or fragment) to Markdown.
///
/// The `<body>` children are converted when a body exists, otherwise the
/// input is treated as a fragment. Blank input yields an empty string.
pub fn convert_html_to_markdown(
    html_input: &str,
    options: &ConversionOptions,
) -> Result<String, HtmlToMarkdownError> {
    if html_input.trim().is_empty() {
        return Ok(String::new());
    }

    let document = Html::parse_document(html_input);
    let nodes = match document.select(&BODY_SELECTOR).next() {
        Some(body) => parser::map_children(body),
        None => parser::map_children(document.root_element()),
    };

    converter::convert_nodes_to_markdown(&nodes, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "")]
    #[case("   \n", "")]
    #[case("<p>Hello <strong>world</strong>!</p>", "Hello **world**!")]
    #[case(
        "<html><head><title>Ignored</title></head><body><h1>Doc</h1><p>Body</p></body></html>",
        "# Doc\n\nBody"
    )]
    #[case(
        "<p>See <a href=\"/guide\" title=\"The guide\">the guide</a>.</p>",
        "See [the guide](/guide \"The guide\")."
    )]
    #[case("<p>line one<br>line two</p>", "line one\nline two")]
    #[case(
        "<table><tr><th style=\"text-align:center\">Name</th></tr><tr><td>sitetxt</td></tr></table>",
        "| Name |\n|:---:|\n| sitetxt |"
    )]
    fn test_convert_html_to_markdown(#[case] html: &str, #[case] expected: &str) {
        let markdown = convert_html_to_markdown(html, &ConversionOptions::default()).unwrap();
        assert_eq!(markdown, expected);
    }
}
