use super::node::{HtmlElement, HtmlNode};
use rustc_hash::FxHashMap;
use scraper::{ElementRef, Node};

/// Copies a parsed `scraper` element and its subtree into an owned [`HtmlElement`].
pub fn map_element(element: ElementRef<'_>) -> HtmlElement {
    let attributes: FxHashMap<String, String> = element
        .value()
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    let children = element
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(text) => Some(HtmlNode::Text(String::from(&**text))),
            Node::Comment(comment) => Some(HtmlNode::Comment(String::from(&**comment))),
            Node::Element(_) => {
                ElementRef::wrap(child).map(|el| HtmlNode::Element(map_element(el)))
            }
            _ => None,
        })
        .collect();

    HtmlElement::new(element.value().name(), attributes, children)
}

/// Maps the children of `element`, leaving the element itself out.
pub fn map_children(element: ElementRef<'_>) -> Vec<HtmlNode> {
    map_element(element).children
}
