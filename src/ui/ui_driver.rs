//! Capability surface the bridge needs from the browser-automation layer.
//!
//! The core never talks to an automation engine directly. Anything that can
//! locate elements, read their attributes and text, and click them can drive a
//! session. The scripted board in `harness::scripted_board` is the in-crate
//! implementation.

use std::fmt;

use crate::bridge_errors::BridgeResult;

/// How an element is located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A single class token.
    ClassName(String),
    /// A CSS query, matched by the driver as a whole.
    Css(String),
    Id(String),
}

impl Selector {
    pub fn class(name: impl Into<String>) -> Self {
        Selector::ClassName(name.into())
    }

    pub fn css(query: impl Into<String>) -> Self {
        Selector::Css(query.into())
    }

    pub fn id(id: impl Into<String>) -> Self {
        Selector::Id(id.into())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::ClassName(name) => write!(f, "class={name}"),
            Selector::Css(query) => write!(f, "css={query}"),
            Selector::Id(id) => write!(f, "id={id}"),
        }
    }
}

/// Browser-automation capabilities used by the observer and the executor.
///
/// `find_element*` must return `BridgeError::ElementNotFound` when nothing
/// matches; `find_elements` returns an empty vector instead. Elements come back
/// in document order.
pub trait UiDriver {
    /// Handle to a located element. May go stale when the page changes.
    type Element: Clone + fmt::Debug;

    /// First match in document order.
    fn find_element(&mut self, selector: &Selector) -> BridgeResult<Self::Element>;

    /// Every match in document order, possibly none.
    fn find_elements(&mut self, selector: &Selector) -> BridgeResult<Vec<Self::Element>>;

    /// Lookup scoped to the subtree of `parent`.
    fn find_element_in(
        &mut self,
        parent: &Self::Element,
        selector: &Selector,
    ) -> BridgeResult<Self::Element>;

    /// Attribute value, empty string when the attribute is absent.
    fn attribute(&mut self, element: &Self::Element, name: &str) -> BridgeResult<String>;

    /// Plain click, as used for selecting a piece or a promotion choice.
    fn click(&mut self, element: &Self::Element) -> BridgeResult<()>;

    /// Click relative to the element's center.
    fn click_at_offset(&mut self, element: &Self::Element, dx: i32, dy: i32) -> BridgeResult<()>;

    /// Visible text of the element.
    fn read_text(&mut self, element: &Self::Element) -> BridgeResult<String>;

    /// End the automation session. Called exactly once, from teardown.
    fn quit(&mut self) -> BridgeResult<()>;
}

/// Class attribute split into tokens.
pub fn class_tokens<D: UiDriver>(driver: &mut D, element: &D::Element) -> BridgeResult<Vec<String>> {
    Ok(driver
        .attribute(element, "class")?
        .split_whitespace()
        .map(str::to_owned)
        .collect())
}
