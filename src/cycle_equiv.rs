// SPDX-License-Identifier: MPL-2.0
//! Cycle-equivalence classification of spanning-tree edges, after Johnson
//! and Pedersen: two tree edges land in the same class iff they are cut by
//! the same set of fundamental cycles, and each non-trivial class delimits
//! one region of variation.
//!
//! At a branch node whose second-highest cycle reach still climbs above
//! the node, the pass pushes a synthetic capping bracket aimed at that
//! reach, exactly as in the original algorithm. The cap keeps bracket
//! lists from conflating classes across the branch; the classes it sits
//! on top of are the ones whose real regions the concealed pass recovers.

use crate::bracket_list::{Bracket, BracketArena, BracketList};
use crate::spanning_tree::SpanningTree;

/// What the pass learned about one equivalence class.
#[derive(Debug, Default)]
pub struct ClassInfo {
    /// Member tree edges, each named by the child node below it, in
    /// assignment (post-order) order.
    pub edges: Vec<usize>,
    /// The real back-edges whose brackets sat on the class when it was
    /// created (capping brackets excluded). By cycle equivalence the same
    /// set spans every member edge.
    pub brackets: Vec<usize>,
    /// Whether any member edge carried a bracket when classified. Classes
    /// without brackets are cut by no cycle and delimit nothing.
    pub has_brackets: bool,
    /// Whether an inverting bracket or an inverting member edge was seen.
    pub inverting_taint: bool,
}

/// One capping bracket the pass inserted: at `origin`, aimed at the node
/// holding the second-highest cycle reach below it.
#[derive(Debug, Clone, Copy)]
pub struct CapEvent {
    /// Branch node the capping bracket was pushed at.
    pub origin: usize,
    /// Node the cap is aimed at; its bracket retires when this node is
    /// left.
    pub upper: usize,
}

/// Runs the pass over a spanning tree, assigning a class to every tree
/// edge. Returns the per-class summaries indexed by class id, plus the
/// capping brackets that were inserted.
pub fn assign_classes(st: &mut SpanningTree) -> (Vec<ClassInfo>, Vec<CapEvent>) {
    let n = st.node_count();
    let real_count = st.back_edges().len();
    let mut arena = BracketArena::new();
    let mut lists: Vec<Option<BracketList>> = (0..n).map(|_| None).collect();
    let mut classes: Vec<ClassInfo> = Vec::new();

    // highest (smallest dfs) back-edge target reachable from each subtree
    let mut hi = vec![usize::MAX; n];
    let mut caps: Vec<CapEvent> = Vec::new();
    let mut cap_ending: Vec<Vec<usize>> = vec![Vec::new(); n];

    for i in 0..st.postorder().len() {
        let node = st.postorder()[i];
        let mut blist = BracketList::new();

        // the node's own list starts as the union of its children's lists
        for c in 0..st.children_of(node).len() {
            let child = st.children_of(node)[c];
            if let Some(mut cl) = lists[child].take() {
                blist.concat(&mut arena, &mut cl);
            }
        }

        // brackets of back-edges that close at this node retire here;
        // self-loop back-edges have an empty lifetime and never enter a list
        for k in 0..st.ending_at(node).len() {
            let be_id = st.ending_at(node)[k];
            blist.delete(&mut arena, be_id);
        }
        for k in 0..cap_ending[node].len() {
            let cap_id = cap_ending[node][k];
            blist.delete(&mut arena, cap_id);
        }
        let mut hi0 = usize::MAX;
        for k in 0..st.origin_at(node).len() {
            let be_id = st.origin_at(node)[k];
            let be = st.back_edge(be_id);
            if be.is_self() {
                continue;
            }
            hi0 = hi0.min(be.upper);
            blist.push(&mut arena, Bracket::new(be_id, false, be.inverting));
        }

        // branch bookkeeping: hi1 and hi2 are the two highest reaches
        // among the children's subtrees
        let mut child_his: Vec<usize> = st
            .children_of(node)
            .iter()
            .map(|&c| hi[c])
            .collect();
        child_his.sort_unstable();
        let hi1 = child_his.first().copied().unwrap_or(usize::MAX);
        let hi2 = child_his.get(1).copied().unwrap_or(usize::MAX);
        hi[node] = hi0.min(hi1);

        if node != 0 && hi2 < node {
            // a second subtree also reaches above this node: cap it
            let cap_id = real_count + caps.len();
            caps.push(CapEvent {
                origin: node,
                upper: hi2,
            });
            cap_ending[hi2].push(cap_id);
            blist.push(&mut arena, Bracket::new(cap_id, true, false));
        }

        if node != 0 {
            let size = blist.len() as u32;
            let class = if blist.is_empty() {
                // bracket-free edge: a fresh singleton class
                classes.push(ClassInfo::default());
                (classes.len() - 1) as u32
            } else {
                let reuse = blist.top(&arena).and_then(|top| {
                    match (top.recent_size, top.recent_class) {
                        (Some(s), Some(c)) if s == size => Some(c),
                        _ => None,
                    }
                });
                match reuse {
                    Some(c) => c,
                    None => {
                        let c = classes.len() as u32;
                        let brackets: Vec<usize> = blist
                            .iter(&arena)
                            .filter(|b| !b.capping)
                            .map(|b| b.back_edge_id)
                            .collect();
                        classes.push(ClassInfo {
                            brackets,
                            has_brackets: true,
                            ..ClassInfo::default()
                        });
                        if let Some(top) = blist.top_mut(&mut arena) {
                            top.recent_size = Some(size);
                            top.recent_class = Some(c);
                        }
                        c
                    }
                }
            };
            let info = &mut classes[class as usize];
            info.edges.push(node);
            info.has_brackets |= !blist.is_empty();
            info.inverting_taint |=
                blist.inverting_count() > 0 || st.tree_edge_inverting(node);
            st.set_class(node, class);
        }

        lists[node] = Some(blist);
    }

    tracing::debug!(
        classes = classes.len(),
        bracketed = classes.iter().filter(|c| c.has_brackets).count(),
        caps = caps.len(),
        "cycle-equivalence pass done"
    );
    (classes, caps)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bidirected::{VariationGraph, VgBuilder};
    use crate::spanning_tree::SpanningTree;
    use crate::types::VtxEnd::{Left, Right};
    use crate::types::VtxId;

    fn classify(g: &VariationGraph) -> (SpanningTree, Vec<ClassInfo>, Vec<CapEvent>) {
        let mut st = SpanningTree::from_graph(g).unwrap();
        let (classes, caps) = assign_classes(&mut st);
        (st, classes, caps)
    }

    fn sub_graph() -> VariationGraph {
        // 1 -> {2 | 3} -> 4
        let mut b = VgBuilder::new();
        for (id, s) in [(1, "A"), (2, "C"), (3, "G"), (4, "T")] {
            b.add_vertex(id, s).unwrap();
        }
        b.add_edge(1, Right, 2, Left).unwrap();
        b.add_edge(1, Right, 3, Left).unwrap();
        b.add_edge(2, Right, 4, Left).unwrap();
        b.add_edge(3, Right, 4, Left).unwrap();
        b.freeze().unwrap()
    }

    #[test]
    fn every_tree_edge_gets_a_class() {
        let g = sub_graph();
        let (st, _, _) = classify(&g);
        for n in 1..st.node_count() {
            assert!(st.class_of(n).is_some(), "edge above node {n} unclassified");
        }
    }

    #[test]
    fn sub_bubble_is_one_bracketed_class() {
        let g = sub_graph();
        let (_, classes, caps) = classify(&g);
        let bracketed: Vec<&ClassInfo> =
            classes.iter().filter(|c| c.has_brackets).collect();
        assert_eq!(bracketed.len(), 1);
        // the single fundamental cycle cuts five tree edges
        assert_eq!(bracketed[0].edges.len(), 5);
        assert_eq!(bracketed[0].brackets.len(), 1);
        assert!(!bracketed[0].inverting_taint);
        // one cycle reaching above the fork: nothing to cap
        assert!(caps.is_empty());
    }

    #[test]
    fn deletion_bubble_is_one_bracketed_class() {
        let mut b = VgBuilder::new();
        for (id, s) in [(1, "A"), (2, "C"), (3, "G")] {
            b.add_vertex(id, s).unwrap();
        }
        b.add_edge(1, Right, 2, Left).unwrap();
        b.add_edge(2, Right, 3, Left).unwrap();
        b.add_edge(1, Right, 3, Left).unwrap();
        let g = b.freeze().unwrap();
        let (_, classes, _) = classify(&g);
        let bracketed: Vec<&ClassInfo> =
            classes.iter().filter(|c| c.has_brackets).collect();
        assert_eq!(bracketed.len(), 1);
        assert_eq!(bracketed[0].edges.len(), 3);
    }

    #[test]
    fn nested_bubbles_share_the_outer_class_across_the_gap() {
        // outer 1 -> {2 | 3..5} -> 6 with inner 3 -> {4 | direct} -> 5
        let mut b = VgBuilder::new();
        for id in 1..=6 {
            b.add_vertex(id, "A").unwrap();
        }
        b.add_edge(1, Right, 2, Left).unwrap();
        b.add_edge(2, Right, 6, Left).unwrap();
        b.add_edge(1, Right, 3, Left).unwrap();
        b.add_edge(3, Right, 4, Left).unwrap();
        b.add_edge(4, Right, 5, Left).unwrap();
        b.add_edge(3, Right, 5, Left).unwrap();
        b.add_edge(5, Right, 6, Left).unwrap();
        let g = b.freeze().unwrap();
        let (_, classes, caps) = classify(&g);
        let mut sizes: Vec<usize> = classes
            .iter()
            .filter(|c| c.has_brackets)
            .map(|c| c.edges.len())
            .collect();
        sizes.sort_unstable();
        // inner cycle cuts 3 edges; the outer class spans 6 edges, picked
        // up again after the inner region through the recent-size check
        assert_eq!(sizes, vec![3, 6]);
        // nesting keeps both reaches on one child: no branch to cap
        assert!(caps.is_empty());
    }

    #[test]
    fn two_arms_reaching_above_a_branch_get_capped() {
        // 1 -> {2 | 3 | 4} -> 5: at the sink fork both arm cycles climb
        // back to vertex 1, so the second one is capped there
        let mut b = VgBuilder::new();
        for id in 1..=5 {
            b.add_vertex(id, "A").unwrap();
        }
        for arm in [2, 3, 4] {
            b.add_edge(1, Right, arm, Left).unwrap();
            b.add_edge(arm, Right, 5, Left).unwrap();
        }
        let g = b.freeze().unwrap();
        let (st, classes, caps) = classify(&g);
        assert_eq!(caps.len(), 1);
        let cap = caps[0];
        // the cap sits at the sink fork and is aimed at the entry end
        let (v_idx, end) = st.end_of(cap.origin).unwrap();
        assert_eq!(g.v_idx_to_id(v_idx), VtxId(5));
        assert_eq!(end, Left);
        let (v_idx, end) = st.end_of(cap.upper).unwrap();
        assert_eq!(g.v_idx_to_id(v_idx), VtxId(1));
        assert_eq!(end, Right);
        // the entry-side class still snapshots both real arm cycles
        let entry_class = classes
            .iter()
            .filter(|c| c.has_brackets)
            .max_by_key(|c| c.brackets.len())
            .unwrap();
        assert_eq!(entry_class.brackets.len(), 2);
    }

    #[test]
    fn linear_chain_has_only_bracketless_classes() {
        let mut b = VgBuilder::new();
        for id in 1..=4 {
            b.add_vertex(id, "A").unwrap();
        }
        for id in 1..4 {
            b.add_edge(id, Right, id + 1, Left).unwrap();
        }
        let g = b.freeze().unwrap();
        let (st, classes, caps) = classify(&g);
        assert!(classes.iter().all(|c| !c.has_brackets));
        assert!(caps.is_empty());
        // one singleton class per tree edge
        assert_eq!(classes.len(), st.tree_edge_count());
    }

    #[test]
    fn inverting_attachment_taints_its_classes() {
        let mut b = VgBuilder::new();
        for (id, s) in [(1, "A"), (2, "C"), (3, "G"), (4, "T")] {
            b.add_vertex(id, s).unwrap();
        }
        b.add_edge(1, Right, 2, Left).unwrap();
        b.add_edge(2, Right, 4, Left).unwrap();
        b.add_edge(2, Right, 3, Right).unwrap();
        b.add_edge(3, Left, 4, Left).unwrap();
        let g = b.freeze().unwrap();
        let (_, classes, _) = classify(&g);
        let bracketed: Vec<&ClassInfo> =
            classes.iter().filter(|c| c.has_brackets).collect();
        assert!(!bracketed.is_empty());
        assert!(bracketed.iter().all(|c| c.inverting_taint));
    }
}
