// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use indexmap::IndexMap;
use std::fmt;

/// The XML namespace that every element of a TRX document lives in.
pub const TRX_NAMESPACE: &str = "http://microsoft.com/schemas/VisualStudio/TeamTest/2010";

/// The attribute name used for default namespace declarations.
pub const XMLNS_ATTRIBUTE: &str = "xmlns";

/// The namespace an [`XmlElement`] belongs to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// The element is not in any namespace.
    ///
    /// Under a namespaced parent this is serialized as `xmlns=""`.
    #[default]
    None,

    /// The element is in the namespace with this URI.
    Uri(Box<str>),
}

impl Namespace {
    /// Creates a namespace from a URI.
    pub fn uri(uri: impl Into<String>) -> Self {
        Self::Uri(uri.into().into_boxed_str())
    }

    /// Returns true if this is the "no namespace" state.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns the URI, or the empty string if there's no namespace.
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "",
            Self::Uri(uri) => uri,
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single element in a generic XML tree.
///
/// A [`TestRun`](crate::TestRun) lowers into this form before being normalized and written out.
/// Attribute order is preserved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// The local name of this element.
    pub name: String,

    /// The namespace this element is in.
    pub namespace: Namespace,

    /// Attributes, in document order.
    pub attributes: IndexMap<String, String>,

    /// Text content, written before any children.
    pub text: Option<String>,

    /// Child elements, in document order.
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Creates a new element that is not in any namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Creates a new element in the given namespace.
    pub fn with_namespace(name: impl Into<String>, namespace: Namespace) -> Self {
        Self {
            name: name.into(),
            namespace,
            ..Default::default()
        }
    }

    /// Sets an attribute, replacing any existing value. Non-printable characters are removed.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl AsRef<str>) -> &mut Self {
        self.attributes
            .insert(name.into(), strip_control_chars(value.as_ref()));
        self
    }

    /// Builder form of [`set_attribute`](Self::set_attribute).
    pub fn attr(mut self, name: impl Into<String>, value: impl AsRef<str>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Sets the text content. Non-printable characters are removed.
    pub fn set_text(&mut self, text: impl AsRef<str>) -> &mut Self {
        self.text = Some(strip_control_chars(text.as_ref()));
        self
    }

    /// Builder form of [`set_text`](Self::set_text).
    pub fn text(mut self, text: impl AsRef<str>) -> Self {
        self.set_text(text);
        self
    }

    /// Appends a child element.
    pub fn push_child(&mut self, child: XmlElement) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Builder form of [`push_child`](Self::push_child).
    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Returns the value of the attribute with this name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the first direct child with this name.
    pub fn find_child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Returns all direct children with this name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Returns this element and all of its descendants, depth-first in document order.
    pub fn descendants(&self) -> Vec<&XmlElement> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(element) = stack.pop() {
            out.push(element);
            // Reversed so the first child is popped next.
            stack.extend(element.children.iter().rev());
        }
        out
    }
}

// XML 1.0 cannot represent most C0 control characters or the U+FFFE and U+FFFF noncharacters,
// even escaped.
fn strip_control_chars(s: &str) -> String {
    s.replace(
        |c| {
            matches!(
                c,
                '\x00'..='\x08' | '\x0b' | '\x0c' | '\x0e'..='\x1f' | '\u{fffe}' | '\u{ffff}'
            )
        },
        "",
    )
}
