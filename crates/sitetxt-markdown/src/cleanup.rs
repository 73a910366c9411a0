//! Deterministic post-processing of converted Markdown.

use itertools::Itertools;
use regex_lite::{Captures, Regex};
use std::sync::LazyLock;

static BLANK_LINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("Failed to compile blank line pattern"));
static SPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"  +").expect("Failed to compile space run pattern"));
static EMPTY_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(!?)\[\]\([^)\n]*\)").expect("Failed to compile empty link pattern")
});
static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("Failed to compile newline run pattern"));

/// Lines made only of these characters are rules or setext underlines.
fn is_decoration_line(line: &str) -> bool {
    !line.is_empty()
        && line
            .chars()
            .all(|c| c.is_whitespace() || matches!(c, '-' | '_' | '=' | '*' | '#'))
}

/// Removes `[](...)` constructs on a single line. `![](...)` is image syntax
/// and stays.
fn remove_empty_links(text: &str) -> String {
    EMPTY_LINK
        .replace_all(text, |caps: &Captures| {
            if &caps[1] == "!" {
                caps[0].to_string()
            } else {
                String::new()
            }
        })
        .into_owned()
}

fn normalize_once(markdown: &str) -> String {
    let collapsed = BLANK_LINE_RUN.replace_all(markdown, "\n\n");
    let trimmed = collapsed.lines().map(str::trim_end).join("\n");
    let undecorated = trimmed
        .lines()
        .filter(|line| !is_decoration_line(line))
        .join("\n");
    let unlinked = remove_empty_links(&undecorated);
    let spaced = SPACE_RUN.replace_all(&unlinked, " ");
    EXCESS_NEWLINES.replace_all(&spaced, "\n\n").into_owned()
}

/// Normalizes converted Markdown.
///
/// In order: blank line runs become one blank line, trailing whitespace is
/// stripped, rule/underline-only lines are dropped, empty links are removed,
/// space runs collapse to one space and three or more newlines become two.
/// The sequence is repeated until the text stops changing, so applying this
/// function to its own output is a no-op.
pub fn normalize_markdown(markdown: &str) -> String {
    let mut current = normalize_once(markdown);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
