//! # sitetxt-markdown: main-content extraction for sitetxt
//!
//! Turns a fetched HTML page into clean Markdown:
//!
//! - **Content detection**: pick the region of the page holding its readable content
//! - **Noise removal**: drop navigation, ads and similar blocks inside that region
//! - **HTML conversion**: render the region as Markdown
//! - **Cleanup**: normalize whitespace, rules and empty links
//!
//! ## Quick Start
//!
//! ```rust
//! use sitetxt_markdown::{ConversionOptions, extract_main_markdown};
//!
//! let html = "<html><body><nav>Home</nav><main><h1>Hello</h1><p>World</p></main></body></html>";
//! let content = extract_main_markdown(html, &ConversionOptions::default()).unwrap();
//! assert_eq!(content.markdown, "# Hello\n\nWorld");
//! ```
pub mod cleanup;
pub mod content;
pub mod html_to_markdown;

pub use cleanup::normalize_markdown;
pub use content::{ContentStrategy, MainContent, extract_main_markdown, find_main_content, strip_noise};
pub use html_to_markdown::{ConversionOptions, HtmlToMarkdownError, convert_html_to_markdown};
