// Copyright © 2022 The Radicle Link Contributors
//
// This file is part of radicle-link, distributed under the GPLv3 with Radicle
// Linking Exception. For full terms see the included LICENSE file.

use std::collections::HashSet;

use proptest::prelude::*;

use fabric::reduce::{NodeRef, Topology};

proptest! {
    #[test]
    fn invariants(n in 1usize..=512, k in 1usize..=16) {
        let topo = Topology::new(n, k);

        prop_total_node_count(&topo);
        prop_chain_lengths_balanced(&topo);
        prop_tree_is_full(&topo);
        prop_links_are_reciprocal(&topo);
        prop_single_root(&topo);
        prop_subtree_sizes(&topo);
        prop_order_is_an_in_order_bijection(&topo);
        prop_chain_length_bound(&topo);
    }
}

fn refs(topo: &Topology) -> Vec<NodeRef> {
    let mut refs: Vec<NodeRef> = (0..topo.tree().len()).map(NodeRef::Tree).collect();
    for (chain, nodes) in topo.chains().iter().enumerate() {
        refs.extend((0..nodes.len()).map(|index| NodeRef::Chain { chain, index }))
    }
    refs
}

fn prop_total_node_count(topo: &Topology) {
    assert_eq!(refs(topo).len(), topo.object_count())
}

fn prop_chain_lengths_balanced(topo: &Topology) {
    let min = topo.chains().iter().map(Vec::len).min().unwrap();
    let max = topo.chains().iter().map(Vec::len).max().unwrap();
    assert!(max - min <= 1, "chain lengths {} and {} differ by more than 1", min, max)
}

fn prop_tree_is_full(topo: &Topology) {
    if topo.depth() > 0 {
        assert_eq!(topo.tree().len(), (1 << topo.depth()) - 1);
        assert_eq!(topo.chains().len(), 1 << topo.depth());
    } else {
        assert!(topo.tree().is_empty());
        assert_eq!(topo.chains().len(), 1);
    }
}

fn prop_links_are_reciprocal(topo: &Topology) {
    for r in refs(topo) {
        let node = topo.node(r);
        for child in node.left_child.iter().chain(node.right_child.iter()) {
            assert_eq!(topo.node(*child).parent, Some(r));
        }
        if let Some(parent) = node.parent {
            let parent = topo.node(parent);
            assert!(
                parent.left_child == Some(r) || parent.right_child == Some(r),
                "parent does not own its child"
            );
        }
    }
}

fn prop_single_root(topo: &Topology) {
    let orphans: Vec<NodeRef> = refs(topo)
        .into_iter()
        .filter(|r| topo.node(*r).parent.is_none())
        .collect();
    assert_eq!(orphans, vec![topo.root()])
}

fn prop_subtree_sizes(topo: &Topology) {
    for r in refs(topo) {
        let node = topo.node(r);
        let children: usize = node
            .left_child
            .iter()
            .chain(node.right_child.iter())
            .map(|c| topo.node(*c).subtree_size)
            .sum();
        assert_eq!(node.subtree_size, 1 + children);
    }
    assert_eq!(topo.node(topo.root()).subtree_size, topo.object_count())
}

fn prop_order_is_an_in_order_bijection(topo: &Topology) {
    let mut seen = HashSet::new();
    for r in refs(topo) {
        let node = topo.node(r);
        assert!(node.order < topo.object_count());
        assert!(seen.insert(node.order), "order {} assigned twice", node.order);
        assert_eq!(topo.by_order(node.order), r);

        // in-order: the left subtree precedes the node, the right one follows
        if let Some(left) = node.left_child {
            assert!(topo.node(left).order < node.order);
        }
        if let Some(right) = node.right_child {
            assert!(topo.node(right).order > node.order);
        }
    }
    assert_eq!(seen.len(), topo.object_count())
}

/// For workloads of at least `k + 1` positions the depth formula keeps every
/// chain within roughly twice the requested bound.
fn prop_chain_length_bound(topo: &Topology) {
    if topo.object_count() >= topo.max_chain_length() + 1 {
        let longest = topo.chains().iter().map(Vec::len).max().unwrap();
        assert!(
            longest <= 2 * topo.max_chain_length() + 1,
            "chain of {} exceeds the bound for k = {}",
            longest,
            topo.max_chain_length()
        )
    }
}
