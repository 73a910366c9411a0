use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HtmlToMarkdownError {
    #[error("Invalid HTML structure: {message}")]
    #[diagnostic(
        code(sitetxt_markdown::html::invalid_structure),
        help("The HTML structure is invalid or unexpected.")
    )]
    InvalidStructure { message: String },

    #[error("no main content found")]
    #[diagnostic(
        code(sitetxt_markdown::content::not_found),
        help("The page has no body, or its main region is empty once navigation and boilerplate are removed.")
    )]
    NoContentFound,
}
