// SPDX-License-Identifier: MPL-2.0
//! DFS spanning tree over the end-graph of a bidirected graph.
//!
//! Every `(vertex, end)` tuple is a tree node; a synthetic root (node 0) is
//! conceptually connected to every end and adopts the first unvisited end
//! whenever the search runs dry, so the whole graph hangs off one tree.
//! Because every connection is scanned from both sides, a non-tree edge
//! can only ever lead to an open ancestor: every non-tree edge is a
//! back-edge, unconditionally. Hitting a closed non-ancestor would mean
//! the scan skipped a connection and is reported as an invariant
//! violation. Capping back-edges are not discovered here; the
//! cycle-equivalence pass synthesises them at branch nodes.

use crate::bidirected::VariationGraph;
use crate::error::{Error, Result};
use crate::types::{VtxEnd, VtxIdx};

const UNSET: usize = usize::MAX;

/// How a tree node is connected to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeConn {
    /// Adopted directly by the synthetic root.
    Root,
    /// Through the implicit connection between the two ends of one vertex.
    Twin,
    /// Through a graph edge.
    Link(usize),
}

/// How a back-edge connects its two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackVia {
    /// Through the implicit twin connection of one vertex.
    Twin,
    /// Through a graph edge.
    Link(usize),
}

/// A non-tree edge, pointing from its deeper (`lower`) to its shallower
/// (`upper`) endpoint.
#[derive(Debug, Clone)]
pub struct BackEdge {
    /// Deeper endpoint (larger dfs number); where the bracket is created.
    pub lower: usize,
    /// Shallower endpoint; leaving it retires the bracket.
    pub upper: usize,
    /// The underlying connection.
    pub via: BackVia,
    /// True when crossing the underlying edge flips orientation.
    pub inverting: bool,
}

impl BackEdge {
    /// A back-edge from a node to itself (a graph self-loop).
    pub fn is_self(&self) -> bool {
        self.lower == self.upper
    }
}

/// The spanning tree. Node indices double as DFS numbers: node `i` was the
/// `i`-th node discovered, with the root at 0.
#[derive(Debug)]
pub struct SpanningTree {
    /// `(vertex, end)` per node; `None` only for the root.
    ends: Vec<Option<(VtxIdx, VtxEnd)>>,
    parent: Vec<Option<usize>>,
    conn: Vec<TreeConn>,
    depth: Vec<u32>,
    children: Vec<Vec<usize>>,
    /// Largest dfs number inside each node's subtree.
    last_desc: Vec<usize>,
    postorder: Vec<usize>,
    back_edges: Vec<BackEdge>,
    origin: Vec<Vec<usize>>,
    ending: Vec<Vec<usize>>,
    edge_class: Vec<Option<u32>>,
    tree_inverting: Vec<bool>,
    node_of: Vec<usize>,
}

#[derive(Debug, Clone, Copy)]
enum Conn {
    Twin,
    Link { e_idx: usize, to: (VtxIdx, VtxEnd) },
}

struct Frame {
    node: usize,
    v_idx: VtxIdx,
    end: VtxEnd,
    conns: Vec<Conn>,
    next: usize,
}

impl Frame {
    fn new(g: &VariationGraph, node: usize, v_idx: VtxIdx, end: VtxEnd) -> Frame {
        Frame {
            node,
            v_idx,
            end,
            conns: conns_of(g, v_idx, end),
            next: 0,
        }
    }
}

impl SpanningTree {
    /// Runs the DFS over a frozen graph.
    pub fn from_graph(g: &VariationGraph) -> Result<SpanningTree> {
        let nv = g.vertex_count();
        let mut st = SpanningTree {
            ends: vec![None],
            parent: vec![None],
            conn: vec![TreeConn::Root],
            depth: vec![0],
            children: vec![Vec::new()],
            last_desc: vec![0],
            postorder: Vec::new(),
            back_edges: Vec::new(),
            origin: vec![Vec::new()],
            ending: vec![Vec::new()],
            edge_class: vec![None],
            tree_inverting: vec![false],
            node_of: vec![UNSET; nv * 2],
        };

        let mut twin_done = vec![false; nv];
        let mut edge_done = vec![false; g.edge_count()];
        let mut open = vec![true]; // the root stays open for the whole run
        let mut stack: Vec<Frame> = Vec::new();

        // the root is connected to every end; adopt them in (vertex, L, R)
        // order whenever the search has not reached them yet
        for v_idx in 0..nv {
            for end in [VtxEnd::Left, VtxEnd::Right] {
                if st.node_of[slot(v_idx, end)] != UNSET {
                    continue;
                }
                let n = st.new_node(v_idx, end, 0, TreeConn::Root, &mut open);
                stack.push(Frame::new(g, n, v_idx, end));

                while !stack.is_empty() {
                    // take the next connection out of the top frame, then
                    // release the borrow so children can be pushed
                    let (cur, cur_v, cur_end, conn) = {
                        let frame = match stack.last_mut() {
                            Some(f) => f,
                            None => break,
                        };
                        if frame.next >= frame.conns.len() {
                            open[frame.node] = false;
                            st.postorder.push(frame.node);
                            stack.pop();
                            continue;
                        }
                        let conn = frame.conns[frame.next];
                        frame.next += 1;
                        (frame.node, frame.v_idx, frame.end, conn)
                    };

                    match conn {
                        Conn::Twin => {
                            if twin_done[cur_v] {
                                continue;
                            }
                            twin_done[cur_v] = true;
                            let t_end = cur_end.complement();
                            match st.node_of[slot(cur_v, t_end)] {
                                UNSET => {
                                    let child = st.new_node(
                                        cur_v,
                                        t_end,
                                        cur,
                                        TreeConn::Twin,
                                        &mut open,
                                    );
                                    stack.push(Frame::new(g, child, cur_v, t_end));
                                }
                                target => {
                                    st.add_back_edge(cur, target, BackVia::Twin, false, &open)?;
                                }
                            }
                        }
                        Conn::Link { e_idx, to } => {
                            if edge_done[e_idx] {
                                continue;
                            }
                            edge_done[e_idx] = true;
                            let (t_v, t_end) = to;
                            let inverting = g.edge(e_idx).is_inverting();
                            match st.node_of[slot(t_v, t_end)] {
                                UNSET => {
                                    let child = st.new_node(
                                        t_v,
                                        t_end,
                                        cur,
                                        TreeConn::Link(e_idx),
                                        &mut open,
                                    );
                                    st.tree_inverting[child] = inverting;
                                    stack.push(Frame::new(g, child, t_v, t_end));
                                }
                                target => {
                                    st.add_back_edge(
                                        cur,
                                        target,
                                        BackVia::Link(e_idx),
                                        inverting,
                                        &open,
                                    )?;
                                }
                            }
                        }
                    }
                }
            }
        }
        st.postorder.push(0);

        // the subtree extent of every node, for O(1) ancestor tests
        for i in (1..st.ends.len()).rev() {
            if let Some(p) = st.parent[i] {
                st.last_desc[p] = st.last_desc[p].max(st.last_desc[i]);
            }
        }

        if let Some(e_idx) = edge_done.iter().position(|&d| !d) {
            return Err(Error::InvariantViolation {
                node: e_idx,
                trace: "graph edge never reached by the spanning DFS".into(),
            });
        }
        Ok(st)
    }

    fn new_node(
        &mut self,
        v_idx: VtxIdx,
        end: VtxEnd,
        parent: usize,
        conn: TreeConn,
        open: &mut Vec<bool>,
    ) -> usize {
        let n = self.ends.len();
        self.ends.push(Some((v_idx, end)));
        self.parent.push(Some(parent));
        self.conn.push(conn);
        self.depth.push(self.depth[parent] + 1);
        self.children.push(Vec::new());
        self.children[parent].push(n);
        self.last_desc.push(n);
        self.origin.push(Vec::new());
        self.ending.push(Vec::new());
        self.edge_class.push(None);
        self.tree_inverting.push(false);
        self.node_of[slot(v_idx, end)] = n;
        open.push(true);
        n
    }

    fn add_back_edge(
        &mut self,
        from: usize,
        target: usize,
        via: BackVia,
        inverting: bool,
        open: &[bool],
    ) -> Result<()> {
        // an open target is on the current root path, hence an ancestor
        // (or the node itself, for a self-loop); with every connection
        // scanned from both sides nothing else can be reached
        if !open[target] {
            return Err(Error::InvariantViolation {
                node: target,
                trace: "non-tree edge reached a closed non-ancestor".into(),
            });
        }
        let id = self.back_edges.len();
        self.back_edges.push(BackEdge {
            lower: from,
            upper: target,
            via,
            inverting,
        });
        self.origin[from].push(id);
        if target != from {
            self.ending[target].push(id);
        }
        Ok(())
    }

    /// Number of nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.ends.len()
    }

    /// Number of tree edges; always `node_count() - 1`.
    pub fn tree_edge_count(&self) -> usize {
        self.node_count() - 1
    }

    /// The `(vertex, end)` a node stands for; `None` for the root.
    pub fn end_of(&self, node: usize) -> Option<(VtxIdx, VtxEnd)> {
        self.ends[node]
    }

    /// Parent node; `None` for the root.
    pub fn parent_of(&self, node: usize) -> Option<usize> {
        self.parent[node]
    }

    /// How a node hangs off its parent.
    pub fn conn_of(&self, node: usize) -> TreeConn {
        self.conn[node]
    }

    /// DFS depth; 0 for the root.
    pub fn depth_of(&self, node: usize) -> u32 {
        self.depth[node]
    }

    /// Children in discovery order.
    pub fn children_of(&self, node: usize) -> &[usize] {
        &self.children[node]
    }

    /// Largest dfs number in the node's subtree.
    pub fn last_desc_of(&self, node: usize) -> usize {
        self.last_desc[node]
    }

    /// Nodes in post-order; the root comes last.
    pub fn postorder(&self) -> &[usize] {
        &self.postorder
    }

    /// All back-edges.
    pub fn back_edges(&self) -> &[BackEdge] {
        &self.back_edges
    }

    /// One back-edge by id.
    pub fn back_edge(&self, id: usize) -> &BackEdge {
        &self.back_edges[id]
    }

    /// Ids of back-edges whose lower endpoint is `node`.
    pub fn origin_at(&self, node: usize) -> &[usize] {
        &self.origin[node]
    }

    /// Ids of back-edges whose upper endpoint is `node` (self-loops
    /// excluded).
    pub fn ending_at(&self, node: usize) -> &[usize] {
        &self.ending[node]
    }

    /// Whether `a` is an ancestor of `d` (or the same node).
    pub fn is_ancestor(&self, a: usize, d: usize) -> bool {
        a <= d && d <= self.last_desc[a]
    }

    /// A back-edge running exactly from `lower` to `upper`, if one exists.
    pub fn find_back_edge(&self, lower: usize, upper: usize) -> Option<&BackEdge> {
        self.origin[lower]
            .iter()
            .map(|&id| &self.back_edges[id])
            .find(|be| be.upper == upper)
    }

    /// Whether the tree connection above `node` is an inverting link.
    pub fn tree_edge_inverting(&self, node: usize) -> bool {
        self.tree_inverting[node]
    }

    /// Records the equivalence class of the tree edge above `node`.
    pub fn set_class(&mut self, node: usize, class: u32) {
        self.edge_class[node] = Some(class);
    }

    /// The equivalence class of the tree edge above `node`, once assigned.
    pub fn class_of(&self, node: usize) -> Option<u32> {
        self.edge_class[node]
    }

    /// The node a `(vertex, end)` tuple was discovered as, if any.
    pub fn node_at(&self, v_idx: VtxIdx, end: VtxEnd) -> Option<usize> {
        match self.node_of[slot(v_idx, end)] {
            UNSET => None,
            n => Some(n),
        }
    }
}

fn slot(v_idx: VtxIdx, end: VtxEnd) -> usize {
    v_idx * 2 + end as usize
}

fn conns_of(g: &VariationGraph, v_idx: VtxIdx, end: VtxEnd) -> Vec<Conn> {
    let mut conns = Vec::with_capacity(1 + g.neighbors(v_idx, end).len());
    conns.push(Conn::Twin);
    for &e_idx in g.neighbors(v_idx, end) {
        let to = g.edge(e_idx).other(v_idx, end);
        conns.push(Conn::Link { e_idx, to });
    }
    conns
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bidirected::VgBuilder;
    use crate::types::VtxEnd::{Left, Right};

    // the seven-vertex graph used by the original spanning-tree unit test:
    // two bubbles in series plus a reverse attachment of vertex 7
    fn two_bubble_graph() -> VariationGraph {
        let mut b = VgBuilder::new();
        b.add_vertex(1, "AAT").unwrap();
        b.add_vertex(2, "GTC").unwrap();
        b.add_vertex(3, "GTG").unwrap();
        b.add_vertex(4, "TA").unwrap();
        b.add_vertex(5, "AA").unwrap();
        b.add_vertex(6, "TTG").unwrap();
        b.add_vertex(7, "C").unwrap();
        b.add_edge(1, Right, 3, Left).unwrap();
        b.add_edge(1, Right, 4, Left).unwrap();
        b.add_edge(2, Right, 4, Left).unwrap();
        b.add_edge(3, Right, 4, Left).unwrap();
        b.add_edge(4, Right, 5, Left).unwrap();
        b.add_edge(4, Right, 6, Left).unwrap();
        b.add_edge(4, Left, 7, Right).unwrap();
        b.add_edge(5, Right, 7, Left).unwrap();
        b.add_edge(6, Right, 7, Left).unwrap();
        b.freeze().unwrap()
    }

    #[test]
    fn tree_edge_count_is_nodes_minus_one() {
        let g = two_bubble_graph();
        let st = SpanningTree::from_graph(&g).unwrap();
        // every end of every vertex becomes a node, plus the root
        assert_eq!(st.node_count(), 2 * g.vertex_count() + 1);
        assert_eq!(st.tree_edge_count(), st.node_count() - 1);
        for v_idx in 0..g.vertex_count() {
            for end in [Left, Right] {
                assert!(st.node_at(v_idx, end).is_some());
            }
        }
    }

    #[test]
    fn every_non_tree_edge_is_a_back_edge() {
        let g = two_bubble_graph();
        let st = SpanningTree::from_graph(&g).unwrap();
        let mut tree_links = 0;
        for n in 1..st.node_count() {
            if matches!(st.conn_of(n), TreeConn::Link(_)) {
                tree_links += 1;
            }
        }
        // twin connections consumed per visited vertex are not graph edges;
        // the rest of the graph edges must all show up as back-edges
        let back_links = st
            .back_edges()
            .iter()
            .filter(|be| matches!(be.via, BackVia::Link(_)))
            .count();
        assert_eq!(tree_links + back_links, g.edge_count());
    }

    #[test]
    fn back_edges_point_upward() {
        let g = two_bubble_graph();
        let st = SpanningTree::from_graph(&g).unwrap();
        assert!(!st.back_edges().is_empty());
        for be in st.back_edges() {
            if be.is_self() {
                continue;
            }
            // node index doubles as dfs number
            assert!(be.lower > be.upper, "{be:?}");
            assert!(st.is_ancestor(be.upper, be.lower));
        }
    }

    #[test]
    fn root_is_depth_zero_and_parents_shrink_depth() {
        let g = two_bubble_graph();
        let st = SpanningTree::from_graph(&g).unwrap();
        assert_eq!(st.depth_of(0), 0);
        for n in 1..st.node_count() {
            let p = st.parent_of(n).unwrap();
            assert_eq!(st.depth_of(n), st.depth_of(p) + 1);
            assert!(st.is_ancestor(p, n));
        }
    }

    #[test]
    fn postorder_visits_children_before_parents() {
        let g = two_bubble_graph();
        let st = SpanningTree::from_graph(&g).unwrap();
        assert_eq!(st.postorder().len(), st.node_count());
        let mut seen = vec![false; st.node_count()];
        for &n in st.postorder() {
            for &c in st.children_of(n) {
                assert!(seen[c], "child {c} after parent {n}");
            }
            seen[n] = true;
        }
        assert_eq!(st.postorder().last(), Some(&0));
    }

    #[test]
    fn disconnected_components_hang_off_the_root() {
        let mut b = VgBuilder::new();
        b.add_vertex(1, "A").unwrap();
        b.add_vertex(2, "C").unwrap();
        // no edges at all
        let g = b.freeze().unwrap();
        let st = SpanningTree::from_graph(&g).unwrap();
        assert_eq!(st.node_count(), 5);
        let root_children = st.children_of(0).len();
        assert_eq!(root_children, 2); // one restart per vertex, twin covers the other end
    }

    #[test]
    fn same_end_edges_yield_inverting_back_edges() {
        // 1 -> 2 -> 4 with an inversion attachment of 3: 2R-3R and 3L-4L
        let mut b = VgBuilder::new();
        for (id, s) in [(1, "A"), (2, "C"), (3, "G"), (4, "T")] {
            b.add_vertex(id, s).unwrap();
        }
        b.add_edge(1, Right, 2, Left).unwrap();
        b.add_edge(2, Right, 4, Left).unwrap();
        b.add_edge(2, Right, 3, Right).unwrap();
        b.add_edge(3, Left, 4, Left).unwrap();
        let g = b.freeze().unwrap();
        let st = SpanningTree::from_graph(&g).unwrap();
        assert!(st.back_edges().iter().any(|be| be.inverting));
    }

    #[test]
    fn self_loop_becomes_back_edge_to_self() {
        let mut b = VgBuilder::new();
        b.add_vertex(1, "A").unwrap();
        b.add_vertex(2, "C").unwrap();
        b.add_edge(1, Right, 2, Left).unwrap();
        b.add_edge(2, Right, 2, Right).unwrap();
        let g = b.freeze().unwrap();
        let st = SpanningTree::from_graph(&g).unwrap();
        let selfs: Vec<&BackEdge> = st.back_edges().iter().filter(|be| be.is_self()).collect();
        assert_eq!(selfs.len(), 1);
        assert!(selfs[0].inverting);
    }
}
