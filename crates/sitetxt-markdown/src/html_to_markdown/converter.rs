use itertools::Itertools;

use super::error::HtmlToMarkdownError;
use super::node::{HtmlElement, HtmlNode};
use super::options::ConversionOptions;

type Result<T> = std::result::Result<T, HtmlToMarkdownError>;

/// Elements whose children are converted as a sequence of blocks.
const CONTAINER_TAGS: &[&str] = &[
    "html", "body", "div", "main", "article", "section", "header", "footer", "nav", "aside",
    "hgroup", "figure", "details", "form", "fieldset", "center", "li",
];

/// Elements that flow inside the surrounding paragraph.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "br", "cite", "code", "del", "em", "i", "img", "input", "kbd", "label",
    "mark", "q", "s", "small", "span", "strike", "strong", "sub", "sup", "svg", "time", "u",
];

/// Elements that never produce output.
const SILENT_TAGS: &[&str] = &[
    "head", "link", "meta", "noscript", "script", "style", "template", "title",
];

fn extract_text_from_pre_children(nodes: &[HtmlNode]) -> String {
    let mut text_content = String::new();
    for node in nodes {
        match node {
            HtmlNode::Text(text) => text_content.push_str(text),
            HtmlNode::Element(el) if el.tag_name == "br" => text_content.push('\n'),
            HtmlNode::Element(el) => {
                text_content.push_str(&extract_text_from_pre_children(&el.children));
            }
            HtmlNode::Comment(_) => {}
        }
    }
    text_content
}

/// Collapses every whitespace run to a single space, keeping one space at
/// either edge when the source had whitespace there.
fn collapse_whitespace(text: &str) -> String {
    let words = text.split_whitespace().join(" ");
    if words.is_empty() {
        return if text.is_empty() {
            String::new()
        } else {
            " ".to_string()
        };
    }
    let lead = if text.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if text.ends_with(char::is_whitespace) { " " } else { "" };
    format!("{lead}{words}{trail}")
}

/// Renders the trimmed content with `render` and puts back a single space on
/// each side that had whitespace, so markers hug the text.
fn with_outer_whitespace(content: &str, render: impl FnOnce(&str) -> String) -> String {
    let inner = content.trim();
    let lead = if content.starts_with(char::is_whitespace) { " " } else { "" };
    let trail = if !inner.is_empty() && content.ends_with(char::is_whitespace) {
        " "
    } else {
        ""
    };
    format!("{lead}{}{trail}", render(inner))
}

fn normalize_inline(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().join(" "))
        .join("\n")
        .trim()
        .to_string()
}

#[derive(PartialEq, Debug, Clone, Copy)]
enum Alignment {
    Left,
    Center,
    Right,
    Default,
}

fn parse_alignment(value: &str) -> Option<Alignment> {
    match value.trim().to_lowercase().as_str() {
        "left" => Some(Alignment::Left),
        "center" => Some(Alignment::Center),
        "right" => Some(Alignment::Right),
        _ => None,
    }
}

fn get_cell_alignment(element: &HtmlElement) -> Alignment {
    let from_style = element.attr("style").and_then(|style| {
        style.split(';').find_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            if property.trim() == "text-align" {
                parse_alignment(value)
            } else {
                None
            }
        })
    });

    from_style
        .or_else(|| element.attr("align").and_then(parse_alignment))
        .unwrap_or(Alignment::Default)
}

fn escape_table_cell_content(content: &str) -> String {
    content.replace('\n', " ").replace('|', "\\|")
}

fn collect_table_rows<'a>(
    element: &'a HtmlElement,
    in_head: bool,
    rows: &mut Vec<(&'a HtmlElement, bool)>,
) {
    for child in element.child_elements() {
        match child.tag_name.as_str() {
            "tr" => rows.push((child, in_head)),
            "thead" => collect_table_rows(child, true, rows),
            "tbody" | "tfoot" => collect_table_rows(child, in_head, rows),
            _ => {}
        }
    }
}

fn convert_table_row(
    row: &HtmlElement,
    options: &ConversionOptions,
) -> Result<Vec<(String, Alignment)>> {
    row.child_elements()
        .filter(|cell| cell.tag_name == "th" || cell.tag_name == "td")
        .map(|cell| {
            let content = convert_children_to_string(&cell.children, options)?;
            Ok((
                escape_table_cell_content(&normalize_inline(&content)),
                get_cell_alignment(cell),
            ))
        })
        .collect()
}

fn convert_html_table_to_markdown(
    table_element: &HtmlElement,
    options: &ConversionOptions,
) -> Result<Option<String>> {
    let mut rows = Vec::new();
    collect_table_rows(table_element, false, &mut rows);

    let header_index = rows.iter().position(|(_, in_head)| *in_head).unwrap_or(0);
    let mut converted = Vec::with_capacity(rows.len());
    for (row, _) in &rows {
        converted.push(convert_table_row(row, options)?);
    }

    if options.ignore_tables {
        let lines = converted
            .iter()
            .map(|cells| cells.iter().map(|(content, _)| content.as_str()).join(" "))
            .filter(|line| !line.trim().is_empty())
            .join("\n");
        return Ok(Some(lines).filter(|lines| !lines.is_empty()));
    }

    let Some(header) = converted.get(header_index).filter(|cells| !cells.is_empty()) else {
        return Ok(None);
    };
    let column_count = header.len();

    let mut markdown_table = format!(
        "| {} |\n|",
        header.iter().map(|(content, _)| content.as_str()).join(" | ")
    );
    for (_, alignment) in header {
        markdown_table.push_str(match alignment {
            Alignment::Left => ":---",
            Alignment::Center => ":---:",
            Alignment::Right => "---:",
            Alignment::Default => "---",
        });
        markdown_table.push('|');
    }

    for (index, cells) in converted.iter().enumerate() {
        if index == header_index {
            continue;
        }
        let row = (0..column_count)
            .map(|i| cells.get(i).map(|(content, _)| content.as_str()).unwrap_or(""))
            .join(" | ");
        markdown_table.push_str(&format!("\n| {} |", row));
    }

    Ok(Some(markdown_table))
}

fn process_url_for_markdown(url: &str) -> String {
    let processed_url = url.trim().replace(' ', "%20");
    let needs_angle_brackets =
        processed_url.is_empty() || processed_url.contains('(') || processed_url.contains(')');
    if needs_angle_brackets {
        format!("<{}>", processed_url)
    } else {
        processed_url
    }
}

fn title_suffix(element: &HtmlElement) -> String {
    element
        .non_empty_attr("title")
        .map(|title| format!(" \"{}\"", title.replace('"', "\\\"")))
        .unwrap_or_default()
}

fn handle_heading_element(
    element: &HtmlElement,
    options: &ConversionOptions,
) -> Result<Option<String>> {
    let content = normalize_inline(&convert_children_to_string(&element.children, options)?)
        .replace('\n', " ");
    if content.is_empty() {
        return Ok(None);
    }
    let marker_level = element.tag_name[1..].parse().unwrap_or(1);
    Ok(Some(format!("{} {}", "#".repeat(marker_level), content)))
}

fn handle_blockquote_element(
    element: &HtmlElement,
    options: &ConversionOptions,
) -> Result<Option<String>> {
    let inner_markdown = convert_nodes_to_markdown(&element.children, options)?;
    if inner_markdown.is_empty() {
        return Ok(None);
    }
    Ok(Some(
        inner_markdown
            .lines()
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {}", line)
                }
            })
            .join("\n"),
    ))
}

fn code_language(element: &HtmlElement) -> Option<String> {
    element.classes().find_map(|class_name| {
        class_name
            .strip_prefix("language-")
            .or_else(|| class_name.strip_prefix("lang-"))
            .map(str::to_string)
    })
}

fn handle_pre_element(element: &HtmlElement) -> Option<String> {
    let mut lang_specifier = code_language(element);
    let mut content_nodes = &element.children;

    let mut element_children = element.child_elements();
    if let (Some(code_element), None) = (element_children.next(), element_children.next()) {
        if code_element.tag_name == "code" {
            content_nodes = &code_element.children;
            lang_specifier = code_language(code_element).or(lang_specifier);
        }
    }

    let text_content = extract_text_from_pre_children(content_nodes);
    let text_content = text_content
        .strip_prefix('\n')
        .unwrap_or(&text_content)
        .trim_end();
    if text_content.is_empty() {
        return None;
    }

    Some(format!(
        "```{}\n{}\n```",
        lang_specifier.unwrap_or_default(),
        text_content
    ))
}

fn handle_dl_element(element: &HtmlElement, options: &ConversionOptions) -> Result<Option<String>> {
    let mut dl_content_parts = Vec::new();
    for child_node in &element.children {
        match child_node {
            HtmlNode::Element(dt_el) if dt_el.tag_name == "dt" => {
                let dt_text = normalize_inline(&convert_children_to_string(&dt_el.children, options)?);
                if !dt_text.is_empty() {
                    dl_content_parts.push(format!("**{}**", dt_text));
                }
            }
            HtmlNode::Element(dd_el) if dd_el.tag_name == "dd" => {
                let dd_markdown_block = convert_nodes_to_markdown(&dd_el.children, options)?;
                if !dd_markdown_block.is_empty() {
                    dl_content_parts.push(
                        dd_markdown_block
                            .lines()
                            .map(|line| format!("  {}", line))
                            .join("\n"),
                    );
                }
            }
            HtmlNode::Text(_) | HtmlNode::Comment(_) => {}
            _ => {
                let unexpected_block =
                    convert_nodes_to_markdown(std::slice::from_ref(child_node), options)?;
                if !unexpected_block.is_empty() {
                    dl_content_parts.push(unexpected_block);
                }
            }
        }
    }
    Ok(Some(dl_content_parts.join("\n")).filter(|content| !content.is_empty()))
}

fn handle_embedded_content_element(element: &HtmlElement) -> Option<String> {
    let tag_name = element.tag_name.as_str();
    let mut additional_info = String::new();
    let src_url = match tag_name {
        "iframe" | "embed" => element.non_empty_attr("src"),
        "video" | "audio" => {
            if tag_name == "video" {
                if let Some(poster_url) = element.non_empty_attr("poster") {
                    additional_info = format!(" (Poster: {})", poster_url);
                }
            }
            element.non_empty_attr("src").or_else(|| {
                element
                    .child_elements()
                    .filter(|child| child.tag_name == "source")
                    .find_map(|source| source.non_empty_attr("src"))
            })
        }
        "object" => element.non_empty_attr("data"),
        _ => None,
    }?;

    let description = element
        .non_empty_attr("title")
        .unwrap_or(match tag_name {
            "iframe" => "Embedded Iframe",
            "video" => "Video",
            "audio" => "Audio",
            "embed" => "Embedded Content",
            "object" => "Embedded Object",
            _ => "Embedded Resource",
        });

    Some(format!(
        "[{}]({}{}){}",
        description,
        process_url_for_markdown(src_url),
        title_suffix(element),
        additional_info
    ))
}

fn handle_svg_element(element: &HtmlElement, options: &ConversionOptions) -> Result<String> {
    let Some(title_el) = element.child_elements().find(|child| child.tag_name == "title") else {
        return Ok(String::new());
    };
    let title = normalize_inline(&convert_children_to_string(&title_el.children, options)?);
    if title.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("[SVG: {}]", title))
    }
}

fn convert_html_list_to_markdown(
    list_element: &HtmlElement,
    options: &ConversionOptions,
) -> Result<Option<String>> {
    let mut markdown_items = Vec::new();
    let mut current_list_number = list_element
        .attr("start")
        .and_then(|start| start.trim().parse::<usize>().ok())
        .unwrap_or(1);

    for li_element in list_element.child_elements().filter(|el| el.tag_name == "li") {
        let marker_prefix = match list_element.tag_name.as_str() {
            "ul" => "* ".to_string(),
            "ol" => {
                let marker = format!("{}. ", current_list_number);
                current_list_number = current_list_number.saturating_add(1);
                marker
            }
            other => {
                return Err(HtmlToMarkdownError::InvalidStructure {
                    message: format!("unexpected list tag name: {}", other),
                });
            }
        };

        let li_content_markdown = convert_nodes_to_markdown(&li_element.children, options)?;
        let continuation_indent = " ".repeat(marker_prefix.len());
        let mut lines = li_content_markdown.lines().filter(|line| !line.trim().is_empty());
        match lines.next() {
            Some(first_line) => {
                markdown_items.push(format!("{}{}", marker_prefix, first_line));
                markdown_items.extend(lines.map(|line| format!("{}{}", continuation_indent, line)));
            }
            None => markdown_items.push(marker_prefix.trim_end().to_string()),
        }
    }

    Ok(Some(markdown_items.join("\n")).filter(|items| !items.is_empty()))
}

fn image_markdown(element: &HtmlElement, options: &ConversionOptions) -> String {
    if options.ignore_images {
        return String::new();
    }
    match element.non_empty_attr("src") {
        Some(src_url) => format!(
            "![{}]({}{})",
            element.attr("alt").unwrap_or_default().trim(),
            process_url_for_markdown(src_url),
            title_suffix(element)
        ),
        None => String::new(),
    }
}

fn input_markdown(element: &HtmlElement) -> String {
    match element.attr("type").map(str::to_lowercase).as_deref() {
        Some("checkbox") | Some("radio") => {
            if element.attributes.contains_key("checked") {
                "[x] ".to_string()
            } else {
                "[ ] ".to_string()
            }
        }
        Some("text") | Some("number") | Some("button") | Some("url") | Some("email") => {
            element.attr("value").unwrap_or_default().to_string()
        }
        _ => String::new(),
    }
}

fn inline_code(content: &str) -> String {
    with_outer_whitespace(content, |code| {
        if code.is_empty() {
            String::new()
        } else if code.contains('`') {
            format!("`` {} ``", code)
        } else {
            format!("`{}`", code)
        }
    })
}

fn wrap_emphasis(content: &str, marker: &str, options: &ConversionOptions) -> String {
    if options.ignore_emphasis || content.trim().is_empty() {
        return content.to_string();
    }
    with_outer_whitespace(content, |inner| format!("{marker}{inner}{marker}"))
}

fn link_markdown(element: &HtmlElement, content: &str, options: &ConversionOptions) -> String {
    let content = content.replace('\n', " ");
    match element.attr("href") {
        Some(href) if !options.ignore_links => with_outer_whitespace(&content, |text| {
            format!(
                "[{}]({}{})",
                text,
                process_url_for_markdown(href),
                title_suffix(element)
            )
        }),
        _ => content,
    }
}

fn convert_inline_element(element: &HtmlElement, options: &ConversionOptions) -> Result<String> {
    let tag_name = element.tag_name.as_str();
    match tag_name {
        "br" => return Ok("\n".to_string()),
        "img" => return Ok(image_markdown(element, options)),
        "input" => return Ok(input_markdown(element)),
        "svg" => return handle_svg_element(element, options),
        _ if SILENT_TAGS.contains(&tag_name) => return Ok(String::new()),
        _ => {}
    }

    let content = convert_children_to_string(&element.children, options)?;
    Ok(match tag_name {
        "strong" | "b" => wrap_emphasis(&content, "**", options),
        "em" | "i" => wrap_emphasis(&content, "*", options),
        "s" | "strike" | "del" => wrap_emphasis(&content, "~~", options),
        "code" => inline_code(&content),
        "a" => link_markdown(element, &content, options),
        "kbd" => format!("<kbd>{}</kbd>", content.trim()),
        _ => content,
    })
}

/// Converts nodes that sit inside a paragraph-like context into a single
/// inline markdown string.
pub fn convert_children_to_string(
    nodes: &[HtmlNode],
    options: &ConversionOptions,
) -> Result<String> {
    let mut parts = String::new();
    for node in nodes {
        match node {
            HtmlNode::Text(text) => parts.push_str(&collapse_whitespace(text)),
            HtmlNode::Element(element) => {
                parts.push_str(&convert_inline_element(element, options)?)
            }
            HtmlNode::Comment(_) => {}
        }
    }
    Ok(parts)
}

fn convert_block_element(
    element: &HtmlElement,
    options: &ConversionOptions,
) -> Result<Option<String>> {
    let tag_name = element.tag_name.as_str();
    if CONTAINER_TAGS.contains(&tag_name) {
        return Ok(Some(convert_nodes_to_markdown(&element.children, options)?));
    }

    match tag_name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => handle_heading_element(element, options),
        "p" => Ok(Some(normalize_inline(&convert_children_to_string(
            &element.children,
            options,
        )?))),
        "hr" => Ok(Some("---".to_string())),
        "ul" | "ol" => convert_html_list_to_markdown(element, options),
        "blockquote" => handle_blockquote_element(element, options),
        "pre" => Ok(handle_pre_element(element)),
        "table" => convert_html_table_to_markdown(element, options),
        "dl" => handle_dl_element(element, options),
        "iframe" | "video" | "audio" | "embed" | "object" => {
            Ok(handle_embedded_content_element(element))
        }
        _ => Ok(Some(convert_nodes_to_markdown(&element.children, options)?)),
    }
}

fn flush_inline_run(inline_run: &mut String, blocks: &mut Vec<String>) {
    let paragraph = normalize_inline(inline_run);
    if !paragraph.is_empty() {
        blocks.push(paragraph);
    }
    inline_run.clear();
}

/// Converts a sequence of sibling nodes into markdown blocks separated by a
/// blank line. Consecutive text and inline elements form one paragraph.
pub fn convert_nodes_to_markdown(
    nodes: &[HtmlNode],
    options: &ConversionOptions,
) -> Result<String> {
    let mut blocks = Vec::new();
    let mut inline_run = String::new();

    for node in nodes {
        match node {
            HtmlNode::Text(text) => inline_run.push_str(&collapse_whitespace(text)),
            HtmlNode::Comment(_) => {}
            HtmlNode::Element(element) => {
                let tag_name = element.tag_name.as_str();
                if SILENT_TAGS.contains(&tag_name) {
                    continue;
                }
                if INLINE_TAGS.contains(&tag_name) {
                    inline_run.push_str(&convert_inline_element(element, options)?);
                    continue;
                }

                let block = convert_block_element(element, options)?;
                flush_inline_run(&mut inline_run, &mut blocks);
                if let Some(block) = block.filter(|block| !block.trim().is_empty()) {
                    blocks.push(block);
                }
            }
        }
    }
    flush_inline_run(&mut inline_run, &mut blocks);

    Ok(blocks.join("\n\n"))
}
