// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize an element tree.

use crate::{Namespace, SerializeError, XMLNS_ATTRIBUTE, XmlElement};
use quick_xml::{
    Writer,
    escape::escape,
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event, attributes::Attribute},
    name::QName,
};
use std::{borrow::Cow, io};

pub(crate) fn serialize_element(
    root: &XmlElement,
    writer: impl io::Write,
) -> Result<(), SerializeError> {
    let mut writer = Writer::new_with_indent(writer, b' ', 2);

    let decl = BytesDecl::new("1.0", Some("UTF-8"), None);
    writer.write_event(Event::Decl(decl))?;

    serialize_element_impl(root, &Namespace::None, &mut writer)?;

    // Add a trailing newline.
    writer.write_indent()?;
    Ok(())
}

fn serialize_element_impl(
    element: &XmlElement,
    parent_namespace: &Namespace,
    writer: &mut Writer<impl io::Write>,
) -> io::Result<()> {
    // Use the destructuring syntax to ensure that all fields are handled.
    let XmlElement {
        name,
        namespace,
        attributes,
        text,
        children,
    } = element;

    let mut tag = BytesStart::new(name.as_str());
    // A namespace that differs from the one in scope needs a declaration, unless one was set
    // explicitly.
    if namespace != parent_namespace && !attributes.contains_key(XMLNS_ATTRIBUTE) {
        tag.push_attribute((XMLNS_ATTRIBUTE, namespace.as_str()));
    }
    for (k, v) in attributes {
        tag.push_attribute(Attribute {
            key: QName(k.as_bytes()),
            value: Cow::Owned(escape_attribute_value(v).into_bytes()),
        });
    }

    if text.is_none() && children.is_empty() {
        return writer.write_event(Event::Empty(tag));
    }

    writer.write_event(Event::Start(tag))?;
    if let Some(text) = text {
        writer.write_event(Event::Text(BytesText::new(text)))?;
    }
    for child in children {
        serialize_element_impl(child, namespace, writer)?;
    }
    writer.write_event(Event::End(BytesEnd::new(name.as_str())))
}

// Readers normalize literal whitespace in attribute values to spaces, so it is written as character
// references instead.
fn escape_attribute_value(value: &str) -> String {
    escape(value)
        .replace('\n', "&#10;")
        .replace('\r', "&#13;")
        .replace('\t', "&#9;")
}
