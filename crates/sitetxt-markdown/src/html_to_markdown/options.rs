/// Controls which constructs survive the HTML to Markdown conversion.
///
/// Everything is preserved by default. Output is never wrapped at a fixed
/// column width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionOptions {
    /// Emit link text only, dropping the `[..](..)` syntax.
    pub ignore_links: bool,
    /// Drop `<img>` elements entirely.
    pub ignore_images: bool,
    /// Render table rows as plain lines instead of a pipe table.
    pub ignore_tables: bool,
    /// Emit strong/emphasis/strikethrough content without markers.
    pub ignore_emphasis: bool,
}
