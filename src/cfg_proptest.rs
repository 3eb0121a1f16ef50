//! Property-based tests for the ConfigTree parser, serializer and merge.
//!
//! These tests use proptest to generate random trees and verify that
//! invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::cfg::ConfigTree;
    use proptest::collection::{btree_map, vec};
    use proptest::prelude::*;

    /// Option values: no braces, no leading `=`, and already trimmed.
    fn value_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_.:,/ -]{0,16}".prop_map(|s| s.trim().to_string())
    }

    /// A tree up to three levels deep. Option names start with `o` and
    /// section names with `s` so the two never collide within one node.
    fn tree_strategy() -> impl Strategy<Value = ConfigTree> {
        let leaf = btree_map("o[A-Za-z0-9_.]{0,8}", value_strategy(), 0..5).prop_map(|options| {
            let mut tree = ConfigTree::new();
            for (name, value) in options {
                tree.set_option(name.as_str(), value).unwrap();
            }
            tree
        });

        leaf.prop_recursive(3, 24, 4, |inner| {
            (
                btree_map("o[A-Za-z0-9_.]{0,8}", value_strategy(), 0..5),
                btree_map("s[A-Za-z0-9_.-]{0,8}", inner, 0..4),
            )
                .prop_map(|(options, children)| {
                    let mut tree = ConfigTree::new();
                    for (name, value) in options {
                        tree.set_option(name.as_str(), value).unwrap();
                    }
                    for (name, child) in children {
                        tree.update(name.as_str(), &child);
                    }
                    tree
                })
        })
    }

    proptest! {
        /// Property: parse(to_string(tree)) is structurally equal to tree
        #[test]
        fn serialization_round_trips(tree in tree_strategy()) {
            let text = tree.to_string();
            let reparsed = ConfigTree::parse(&text);
            prop_assert!(reparsed.is_ok(), "failed to reparse:\n{}", text);
            prop_assert_eq!(reparsed.unwrap(), tree);
        }

        /// Property: repeated `+=` joins all values with ", " in order
        #[test]
        fn plus_equals_accumulates_in_order(values in vec("[A-Za-z0-9_]{1,8}", 1..6)) {
            let text: String = values.iter().map(|v| format!("Acc += {}\n", v)).collect();
            let tree = ConfigTree::parse(&text).unwrap();
            prop_assert_eq!(tree.get("Acc").unwrap(), values.join(", "));
        }

        /// Property: update never removes options or sections absent from `other`
        #[test]
        fn update_only_adds_or_overwrites(base in tree_strategy(), other in tree_strategy()) {
            let mut merged = base.clone();
            merged.update("", &other);

            for (name, value) in base.options() {
                prop_assert!(merged.is_option(name));
                if !other.is_option(name) {
                    prop_assert_eq!(merged.get(name).unwrap(), value);
                }
            }
            for (name, _) in base.children() {
                prop_assert!(merged.is_section(name));
            }
            for (name, value) in other.options() {
                prop_assert_eq!(merged.get(name).unwrap(), value);
            }
            for (name, _) in other.children() {
                prop_assert!(merged.is_section(name));
            }
        }

        /// Property: merging a tree into itself changes nothing
        #[test]
        fn self_merge_is_identity(tree in tree_strategy()) {
            let mut merged = tree.clone();
            merged.merge(&tree);
            prop_assert_eq!(merged, tree);
        }
    }
}
