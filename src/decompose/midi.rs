// SPDX-License-Identifier: MPL-2.0
//! Midi refinement: relabels flubbles whose interior is serial-parallel
//! and cycle-free. The telltale is an interior vertex that is not directly
//! adjacent to both boundaries (a genuinely serial composition) in a
//! region free of orientation-flipping edges.

use rustc_hash::FxHashSet;

use crate::bidirected::VariationGraph;
use crate::pvst::Family;
use crate::types::{VtxEnd, VtxId, VtxIdx};

use super::Decomposition;

pub(crate) fn find_midi(dec: &mut Decomposition, g: &VariationGraph) {
    for idx in 1..dec.pvst.len() {
        if dec.pvst.vertex(idx).family != Family::Flubble {
            continue;
        }
        let route = match dec.pvst.vertex(idx).route {
            Some(r) => r,
            None => continue,
        };
        let vertices: FxHashSet<VtxId> = dec.vertices_of(idx).iter().copied().collect();

        // any inverting edge or self-loop in the region rules midi out
        let tangled_orientation = g.edges().iter().any(|e| {
            vertices.contains(&g.v_idx_to_id(e.v1))
                && vertices.contains(&g.v_idx_to_id(e.v2))
                && (e.is_inverting() || e.is_self_loop())
        });
        if tangled_orientation {
            continue;
        }

        let (s_idx, t_idx) = match (
            g.v_id_to_idx(route.start.0),
            g.v_id_to_idx(route.end.0),
        ) {
            (Ok(s), Ok(t)) => (s, t),
            _ => continue,
        };
        let start_adj = adjacent_ids(g, s_idx, route.start.1);
        let end_adj = adjacent_ids(g, t_idx, route.end.1);

        let serial = vertices.iter().any(|&v| {
            v != route.start.0
                && v != route.end.0
                && !(start_adj.contains(&v) && end_adj.contains(&v))
        });
        if serial {
            dec.pvst.vertex_mut(idx).family = Family::Midi;
        }
    }
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
