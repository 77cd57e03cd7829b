// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Namespace cleanup for a lowered tree.

use crate::{Namespace, XMLNS_ATTRIBUTE, XmlElement};

/// Moves every descendant that has no namespace into the namespace of its parent.
///
/// Any `xmlns` declaration on such a descendant is removed as well. After this pass the namespace
/// is only declared on `root`, which is what consumers of the legacy TRX schema expect.
///
/// Returns the number of elements that were changed. Running this on an already-normalized tree
/// changes nothing and returns 0.
pub fn normalize_namespaces(root: &mut XmlElement) -> usize {
    let namespace = root.namespace.clone();
    root.children
        .iter_mut()
        .map(|child| normalize_impl(child, &namespace))
        .sum()
}

fn normalize_impl(element: &mut XmlElement, parent_namespace: &Namespace) -> usize {
    let mut changed = 0;
    if element.namespace.is_none() {
        let removed = element.attributes.shift_remove(XMLNS_ATTRIBUTE).is_some();
        let reparented = element.namespace != *parent_namespace;
        element.namespace = parent_namespace.clone();
        if removed || reparented {
            changed += 1;
        }
    }

    let namespace = element.namespace.clone();
    changed
        + element
            .children
            .iter_mut()
            .map(|child| normalize_impl(child, &namespace))
            .sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TRX_NAMESPACE;
    use pretty_assertions::assert_eq;
    use test_strategy::proptest;

    fn sample_tree() -> XmlElement {
        XmlElement::with_namespace("TestRun", Namespace::uri(TRX_NAMESPACE))
            .child(
                XmlElement::new("Results").child(
                    XmlElement::new("UnitTestResult")
                        .attr(XMLNS_ATTRIBUTE, "")
                        .child(XmlElement::new("Output")),
                ),
            )
            .child(XmlElement::with_namespace(
                "Foreign",
                Namespace::uri("urn:other"),
            ))
    }

    #[test]
    fn reparents_unscoped_descendants() {
        let mut tree = sample_tree();
        assert_eq!(normalize_namespaces(&mut tree), 3);

        for element in tree.descendants() {
            if element.name == "Foreign" {
                assert_eq!(element.namespace, Namespace::uri("urn:other"));
            } else {
                assert_eq!(
                    element.namespace,
                    Namespace::uri(TRX_NAMESPACE),
                    "{} is in the TRX namespace",
                    element.name
                );
            }
            assert_eq!(element.attribute(XMLNS_ATTRIBUTE), None);
        }
    }

    #[test]
    fn children_of_foreign_elements_inherit_the_foreign_namespace() {
        let mut tree = XmlElement::with_namespace("TestRun", Namespace::uri(TRX_NAMESPACE)).child(
            XmlElement::with_namespace("Foreign", Namespace::uri("urn:other"))
                .child(XmlElement::new("Inner")),
        );
        normalize_namespaces(&mut tree);
        assert_eq!(
            tree.children[0].children[0].namespace,
            Namespace::uri("urn:other")
        );
    }

    #[test]
    fn root_is_left_alone() {
        let mut tree = XmlElement::new("Root").attr(XMLNS_ATTRIBUTE, "");
        assert_eq!(normalize_namespaces(&mut tree), 0);
        assert_eq!(tree.attribute(XMLNS_ATTRIBUTE), Some(""));
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let mut tree = sample_tree();
        normalize_namespaces(&mut tree);
        let once = tree.clone();
        assert_eq!(normalize_namespaces(&mut tree), 0);
        assert_eq!(tree, once);
    }

    #[proptest]
    fn normalization_is_idempotent(
        #[strategy(proptest::collection::vec((0usize..8, proptest::bool::ANY, proptest::bool::ANY), 0..24))]
        shape: Vec<(usize, bool, bool)>,
    ) {
        // Build a tree by attaching each new node under an earlier node chosen by index.
        let mut nodes = vec![XmlElement::with_namespace(
            "TestRun",
            Namespace::uri(TRX_NAMESPACE),
        )];
        let mut parents = vec![None];
        for (i, (parent, foreign, declared)) in shape.iter().enumerate() {
            let mut node = if *foreign {
                XmlElement::with_namespace(format!("n{i}"), Namespace::uri("urn:other"))
            } else {
                XmlElement::new(format!("n{i}"))
            };
            if *declared {
                node.set_attribute(XMLNS_ATTRIBUTE, "");
            }
            parents.push(Some(parent % nodes.len()));
            nodes.push(node);
        }
        // Attach children to parents from the back so indexes stay valid.
        while nodes.len() > 1 {
            let node = nodes.pop().expect("non-empty");
            let parent = parents.pop().flatten().expect("non-root node has a parent");
            nodes[parent].children.insert(0, node);
        }
        let mut tree = nodes.pop().expect("root exists");

        normalize_namespaces(&mut tree);
        let once = tree.clone();
        proptest::prop_assert_eq!(normalize_namespaces(&mut tree), 0);
        proptest::prop_assert_eq!(tree, once);
    }
}
