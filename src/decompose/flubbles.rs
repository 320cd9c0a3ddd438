// SPDX-License-Identifier: MPL-2.0
//! Flubble discovery: turns clean cycle-equivalence classes into
//! two-boundary regions.
//!
//! A class's tree edges lie on one root path. Walking them in depth order
//! (nested-class gaps crossed as pass-throughs) the boundary nodes of the
//! region are exactly the nodes flanked by two link-type connections: the
//! points where the class's cycles reverse. The flanking connections at
//! the chain's two ends come from the class's own brackets: how its
//! cycles close at (or continue past) the shallowest and deepest node.

use crate::cycle_equiv::ClassInfo;
use crate::pvst::Family;
use crate::spanning_tree::{BackEdge, BackVia, SpanningTree, TreeConn};

/// A region candidate: two boundary nodes, the DFS span it covers, and the
/// family it will be filed under.
#[derive(Debug, Clone)]
pub(crate) struct Region {
    /// Shallower boundary node (the entry).
    pub upper: usize,
    /// Deeper boundary node (the exit).
    pub lower: usize,
    /// DFS node interval covered by the region, endpoints included.
    pub span: (usize, usize),
    /// Sub-intervals of `span` that belong to the graph beyond a boundary,
    /// not to the region: the subtree behind a boundary vertex's off-path
    /// twin end.
    pub holes: Vec<(usize, usize)>,
    /// Family the region is filed under.
    pub family: Family,
    /// Whether an orientation-flipping connection participates.
    pub hairpin: bool,
}

impl Region {
    /// Whether a DFS node belongs to the region.
    pub fn contains_node(&self, node: usize) -> bool {
        node >= self.span.0
            && node <= self.span.1
            && !self.holes.iter().any(|&(a, b)| node >= a && node <= b)
    }

    /// Whether another region's whole span sits inside this one.
    pub fn contains_region(&self, other: &Region) -> bool {
        self.span.0 <= other.span.0
            && other.span.1 <= self.span.1
            && !self
                .holes
                .iter()
                .any(|&(a, b)| a <= other.span.0 && other.span.1 <= b)
    }
}

/// Result of a successful boundary extraction.
#[derive(Debug, Clone)]
pub(crate) struct Extraction {
    pub upper: usize,
    pub lower: usize,
    pub span: (usize, usize),
    pub holes: Vec<(usize, usize)>,
    pub hairpin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conn {
    /// Crossing through a vertex (twin connection) or through a nested
    /// region's gap.
    Pass,
    /// A graph edge.
    Link { inverting: bool },
}

impl Conn {
    fn is_link(self) -> bool {
        matches!(self, Conn::Link { .. })
    }

    fn is_inverting(self) -> bool {
        matches!(self, Conn::Link { inverting: true })
    }
}

/// Scans every bracketed class once: clean ones become flubble regions,
/// inversion-tainted ones are deferred to the smothered pass.
pub(crate) fn find_flubbles(
    st: &SpanningTree,
    classes: &[ClassInfo],
) -> (Vec<Region>, Vec<usize>) {
    let mut regions = Vec::new();
    let mut inverting_deferred = Vec::new();

    for (cid, class) in classes.iter().enumerate() {
        if !class.has_brackets {
            continue;
        }
        if class.inverting_taint {
            inverting_deferred.push(cid);
            continue;
        }
        if let Some(x) = extract_boundaries(st, &class.edges, &class.brackets) {
            regions.push(Region {
                upper: x.upper,
                lower: x.lower,
                span: x.span,
                holes: x.holes,
                family: Family::Flubble,
                hairpin: x.hairpin,
            });
        }
    }
    (regions, inverting_deferred)
}

/// Runs the reversal-node boundary extraction over a set of tree edges
/// (each named by its child node), using the back-edges whose brackets cut
/// them. Returns `None` when the edges do not sit on one root path or do
/// not close into exactly two boundaries.
pub(crate) fn extract_boundaries(
    st: &SpanningTree,
    edges: &[usize],
    brackets: &[usize],
) -> Option<Extraction> {
    if edges.is_empty() {
        return None;
    }

    let mut pairs: Vec<(usize, usize, Conn)> = Vec::with_capacity(edges.len());
    for &child in edges {
        let parent = st.parent_of(child)?;
        let conn = match st.conn_of(child) {
            TreeConn::Root => return None,
            TreeConn::Twin => Conn::Pass,
            TreeConn::Link(_) => Conn::Link {
                inverting: st.tree_edge_inverting(child),
            },
        };
        pairs.push((parent, child, conn));
    }
    pairs.sort_by_key(|&(upper, _, _)| upper);

    // the edges must form a chain down one root path, gaps allowed
    for w in pairs.windows(2) {
        let (_, prev_lower, _) = w[0];
        let (next_upper, _, _) = w[1];
        if !st.is_ancestor(prev_lower, next_upper) {
            return None;
        }
    }

    let shallowest = pairs[0].0;
    let deepest = pairs[pairs.len() - 1].1;
    let (top, bottom) = end_conns(st, brackets, shallowest, deepest);

    let mut nodes = vec![shallowest];
    let mut conns: Vec<Conn> = Vec::new();
    for &(upper, lower, conn) in &pairs {
        if *nodes.last()? != upper {
            conns.push(Conn::Pass);
            nodes.push(upper);
        }
        conns.push(conn);
        nodes.push(lower);
    }

    let mut boundaries = Vec::new();
    for (i, &node) in nodes.iter().enumerate() {
        let before = if i == 0 { top } else { conns[i - 1] };
        let after = if i == nodes.len() - 1 { bottom } else { conns[i] };
        if before.is_link() && after.is_link() {
            boundaries.push(node);
        }
    }
    if boundaries.len() != 2 {
        return None;
    }

    let (upper, lower) = if boundaries[0] < boundaries[1] {
        (boundaries[0], boundaries[1])
    } else {
        (boundaries[1], boundaries[0])
    };
    let span = (shallowest, st.last_desc_of(deepest));

    // a boundary vertex is entered and left through the same end; whatever
    // hangs behind its other end is the graph beyond the region, not region
    // content, even when the DFS tucked it inside the span
    let mut holes = Vec::new();
    for &boundary in &[upper, lower] {
        for &child in st.children_of(boundary) {
            if st.conn_of(child) != TreeConn::Twin {
                continue;
            }
            if !nodes.contains(&child) && child >= span.0 && child <= span.1 {
                holes.push((child, st.last_desc_of(child)));
            }
        }
    }

    Some(Extraction {
        upper,
        lower,
        span,
        holes,
        hairpin: conns.iter().any(|c| c.is_inverting())
            || top.is_inverting()
            || bottom.is_inverting(),
    })
}

/// How the brackets' cycles meet the two ends of the edge chain: closing
/// there (a link-type reversal) or passing through to structure beyond.
fn end_conns(
    st: &SpanningTree,
    brackets: &[usize],
    shallowest: usize,
    deepest: usize,
) -> (Conn, Conn) {
    let bes: Vec<&BackEdge> = brackets.iter().map(|&id| st.back_edge(id)).collect();

    // a single back-edge closing the whole chain settles both ends
    if let Some(be) = bes
        .iter()
        .copied()
        .find(|be| be.lower == deepest && be.upper == shallowest)
    {
        return (via_conn(be), via_conn(be));
    }

    // brackets alive over the topmost edge: do they all retire at the
    // shallowest node, or does some cycle continue above it?
    let top_alive: Vec<&BackEdge> = bes
        .iter()
        .copied()
        .filter(|be| be.upper <= shallowest)
        .collect();
    let top = if top_alive.is_empty() {
        Conn::Pass
    } else if top_alive.iter().all(|be| be.upper == shallowest) {
        Conn::Link { inverting: false }
    } else {
        // a cycle runs on through the tree edge above the shallowest node
        child_conn(st, shallowest)
    };

    // symmetric at the bottom: a bracket may originate at the deepest node
    // itself or somewhere below it
    let bot_alive: Vec<&BackEdge> = bes
        .iter()
        .copied()
        .filter(|be| st.is_ancestor(deepest, be.lower))
        .collect();
    let bottom = if bot_alive.is_empty() {
        Conn::Pass
    } else if let Some(be) = bot_alive.iter().copied().find(|be| be.lower == deepest) {
        via_conn(be)
    } else {
        st.children_of(deepest)
            .iter()
            .find(|&&c| bot_alive.iter().any(|be| st.is_ancestor(c, be.lower)))
            .map(|&c| child_conn(st, c))
            .unwrap_or(Conn::Pass)
    };

    (top, bottom)
}

fn via_conn(be: &BackEdge) -> Conn {
    match be.via {
        BackVia::Twin => Conn::Pass,
        BackVia::Link(_) => Conn::Link {
            inverting: be.inverting,
        },
    }
}

fn child_conn(st: &SpanningTree, child: usize) -> Conn {
    match st.conn_of(child) {
        TreeConn::Root | TreeConn::Twin => Conn::Pass,
        TreeConn::Link(_) => Conn::Link {
            inverting: st.tree_edge_inverting(child),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bidirected::{VariationGraph, VgBuilder};
    use crate::cycle_equiv::assign_classes;
    use crate::types::VtxEnd::{Left, Right};

    fn boundaries_of(g: &VariationGraph) -> Vec<(u32, crate::types::VtxEnd, u32, crate::types::VtxEnd)> {
        let mut st = crate::spanning_tree::SpanningTree::from_graph(g).unwrap();
        let (classes, _) = assign_classes(&mut st);
        let (regions, _) = find_flubbles(&st, &classes);
        regions
            .iter()
            .map(|r| {
                let (uv, ue) = st.end_of(r.upper).unwrap();
                let (lv, le) = st.end_of(r.lower).unwrap();
                (
                    g.v_idx_to_id(uv).0,
                    ue,
                    g.v_idx_to_id(lv).0,
                    le,
                )
            })
            .collect()
    }

    #[test]
    fn sub_bubble_boundaries() {
        let mut b = VgBuilder::new();
        for id in 1..=4 {
            b.add_vertex(id, "A").unwrap();
        }
        b.add_edge(1, Right, 2, Left).unwrap();
        b.add_edge(1, Right, 3, Left).unwrap();
        b.add_edge(2, Right, 4, Left).unwrap();
        b.add_edge(3, Right, 4, Left).unwrap();
        let g = b.freeze().unwrap();
        assert_eq!(boundaries_of(&g), vec![(1, Right, 4, Left)]);
    }

    #[test]
    fn deletion_bubble_boundaries() {
        let mut b = VgBuilder::new();
        for id in 1..=3 {
            b.add_vertex(id, "A").unwrap();
        }
        b.add_edge(1, Right, 2, Left).unwrap();
        b.add_edge(2, Right, 3, Left).unwrap();
        b.add_edge(1, Right, 3, Left).unwrap();
        let g = b.freeze().unwrap();
        assert_eq!(boundaries_of(&g), vec![(1, Right, 3, Left)]);
    }

    #[test]
    fn single_arm_classes_yield_nothing() {
        // a three-arm bubble: the two arm classes must not become regions
        let mut b = VgBuilder::new();
        for id in 1..=5 {
            b.add_vertex(id, "A").unwrap();
        }
        for arm in [2, 3, 4] {
            b.add_edge(1, Right, arm, Left).unwrap();
            b.add_edge(arm, Right, 5, Left).unwrap();
        }
        let g = b.freeze().unwrap();
        assert_eq!(boundaries_of(&g), vec![(1, Right, 5, Left)]);
    }

    #[test]
    fn empty_edge_set_has_no_boundaries() {
        let mut b = VgBuilder::new();
        b.add_vertex(1, "A").unwrap();
        let g = b.freeze().unwrap();
        let st = crate::spanning_tree::SpanningTree::from_graph(&g).unwrap();
        assert!(extract_boundaries(&st, &[], &[]).is_none());
    }

    #[test]
    fn segment_classes_whose_cycles_continue_past_them_yield_nothing() {
        // overlapping bubbles 1->{2,3}->4 and 2->{3}->5: the 3R-5L edge is
        // its own class, but its cycle passes through 3 and closes at 2R,
        // so the segment alone is no region
        let mut b = VgBuilder::new();
        for id in 1..=5 {
            b.add_vertex(id, "A").unwrap();
        }
        b.add_edge(1, Right, 2, Left).unwrap();
        b.add_edge(2, Right, 3, Left).unwrap();
        b.add_edge(3, Right, 4, Left).unwrap();
        b.add_edge(1, Right, 4, Left).unwrap();
        b.add_edge(3, Right, 5, Left).unwrap();
        b.add_edge(2, Right, 5, Left).unwrap();
        let g = b.freeze().unwrap();
        // only the first bubble closes within its own class
        assert_eq!(boundaries_of(&g), vec![(1, Right, 4, Left)]);
    }
}
