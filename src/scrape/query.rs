//! Structural queries over a parsed HTML tree
//!
//! The extraction code only needs four capabilities: find a descendant by
//! selector, iterate matching descendants, read an attribute, and iterate text
//! nodes. They are implemented here once, on top of `scraper`, so the gallery
//! logic never touches the parser's node types directly.

use scraper::element_ref::{Select, Text};
use scraper::{ElementRef, Html, Selector};

/// A parsed HTML document
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// The `<html>` element
    pub fn root(&self) -> Node<'_> {
        Node {
            element: self.html.root_element(),
        }
    }
}

/// An element of a [`Document`]
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    element: ElementRef<'a>,
}

impl<'a> Node<'a> {
    /// First descendant matching `selector`, in document order
    pub fn find(&self, selector: &Selector) -> Option<Node<'a>> {
        self.element
            .select(selector)
            .next()
            .map(|element| Node { element })
    }

    /// Every descendant matching `selector`, lazily, in document order
    pub fn find_all<'b>(&self, selector: &'b Selector) -> Nodes<'a, 'b> {
        Nodes {
            inner: self.element.select(selector),
        }
    }

    /// Value of attribute `name`, if present
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    pub fn tag(&self) -> &'a str {
        self.element.value().name()
    }

    /// Every text node below this element, in document order
    pub fn text_fragments(&self) -> Text<'a> {
        self.element.text()
    }

    /// All text fragments concatenated with no separator
    pub fn text(&self) -> String {
        self.text_fragments().collect()
    }
}

/// Lazy iterator returned by [`Node::find_all`]
pub struct Nodes<'a, 'b> {
    inner: Select<'a, 'b>,
}

impl<'a, 'b> Iterator for Nodes<'a, 'b> {
    type Item = Node<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|element| Node { element })
    }
}
