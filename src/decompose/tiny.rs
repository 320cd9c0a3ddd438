// SPDX-License-Identifier: MPL-2.0
//! Tiny and parallel refinement: relabels leaf flubbles whose interior is
//! a single bridging vertex (tiny) or a bank of at least three
//! single-vertex arms (parallel). Both families are leaves by definition.

use rustc_hash::FxHashSet;

use crate::bidirected::VariationGraph;
use crate::pvst::{Family, RouteParams};
use crate::types::{VtxEnd, VtxId, VtxIdx};

use super::Decomposition;

pub(crate) fn find_tiny(dec: &mut Decomposition, g: &VariationGraph) {
    for idx in 1..dec.pvst.len() {
        if dec.pvst.vertex(idx).family != Family::Flubble || !dec.pvst.is_leaf(idx) {
            continue;
        }
        let route = match dec.pvst.vertex(idx).route {
            Some(r) => r,
            None => continue,
        };
        if let Some(family) = refine(g, &route, dec.vertices_of(idx)) {
            dec.pvst.vertex_mut(idx).family = family;
        }
    }
}

fn refine(g: &VariationGraph, route: &RouteParams, vertices: &[VtxId]) -> Option<Family> {
    let (s_idx, t_idx) = (
        g.v_id_to_idx(route.start.0).ok()?,
        g.v_id_to_idx(route.end.0).ok()?,
    );
    let start_adj = adjacent_ids(g, s_idx, route.start.1);
    let end_adj = adjacent_ids(g, t_idx, route.end.1);

    let interior: Vec<VtxId> = vertices
        .iter()
        .copied()
        .filter(|&v| v != route.start.0 && v != route.end.0)
        .collect();

    if interior.len() == 1 && start_adj.contains(&interior[0]) && end_adj.contains(&interior[0]) {
        return Some(Family::Tiny);
    }

    // parallel: every interior vertex is its own arm, and there are at
    // least three arms counting a direct start-end edge
    if interior.len() >= 2
        && interior
            .iter()
            .all(|v| start_adj.contains(v) && end_adj.contains(v))
    {
        let interior_set: FxHashSet<VtxId> = interior.iter().copied().collect();
        let no_interior_edges = g.edges().iter().all(|e| {
            !(interior_set.contains(&g.v_idx_to_id(e.v1))
                && interior_set.contains(&g.v_idx_to_id(e.v2)))
        });
        let direct = start_adj.contains(&route.end.0) as usize;
        if no_interior_edges && interior.len() + direct >= 3 {
            return Some(Family::Parallel);
        }
    }
    None
}

fn adjacent_ids(g: &VariationGraph, v_idx: VtxIdx, end: VtxEnd) -> FxHashSet<VtxId> {
    g.neighbors(v_idx, end)
        .iter()
        .map(|&e| {
            let (u, _) = g.edge(e).other(v_idx, end);
            g.v_idx_to_id(u)
        })
        .collect()
}
