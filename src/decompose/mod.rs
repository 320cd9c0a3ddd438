// SPDX-License-Identifier: MPL-2.0
//! Builds the PVST from a frozen graph: spanning tree, cycle-equivalence
//! classes, boundary extraction, nesting, then the family refinement
//! passes in their authoritative order (tiny, midi, concealed, smothered;
//! the last two recover regions the flubble phase had to defer).

mod concealed;
mod flubbles;
mod midi;
mod smothered;
mod tiny;

use rustc_hash::FxHashSet;

use crate::bidirected::VariationGraph;
use crate::cycle_equiv::assign_classes;
use crate::error::{Error, Result};
use crate::pvst::{Pvst, RouteParams};
use crate::spanning_tree::SpanningTree;
use crate::types::VtxId;

pub(crate) use flubbles::{extract_boundaries, Region};

/// The assembled PVST together with, per vertex, the graph vertices its
/// region spans (used later to seed each RoV's sorted vertex table).
#[derive(Debug)]
pub struct Decomposition {
    /// The variation structure tree.
    pub pvst: Pvst,
    region_vertices: Vec<Vec<VtxId>>,
}

impl Decomposition {
    /// Graph vertices covered by one PVST vertex's region, ascending by
    /// id; empty for the root.
    pub fn vertices_of(&self, pvst_idx: usize) -> &[VtxId] {
        &self.region_vertices[pvst_idx]
    }
}

/// Runs the whole decomposition over a frozen graph.
pub fn build_pvst(g: &VariationGraph) -> Result<Decomposition> {
    let mut st = SpanningTree::from_graph(g)?;
    let (classes, caps) = assign_classes(&mut st);

    let (mut regions, inverting_deferred) = flubbles::find_flubbles(&st, &classes);
    let recovered = concealed::find_concealed(&st, &caps, &regions);
    regions.extend(recovered);
    regions.extend(smothered::find_smothered(&st, &classes, &inverting_deferred));

    let mut dec = assemble(&st, g, regions)?;
    tiny::find_tiny(&mut dec, g);
    midi::find_midi(&mut dec, g);
    dec.pvst.assign_clans();
    dec.pvst.validate(g)?;
    check_containment(&dec)?;

    tracing::debug!(regions = dec.pvst.len() - 1, "pvst assembled");
    Ok(dec)
}

/// Orders regions by their DFS spans and nests them by containment. A
/// region sitting inside another's span but behind one of its boundaries
/// (inside a hole) is a sibling, not a child.
fn assemble(
    st: &SpanningTree,
    g: &VariationGraph,
    mut regions: Vec<Region>,
) -> Result<Decomposition> {
    regions.sort_by(|a, b| a.span.0.cmp(&b.span.0).then(b.span.1.cmp(&a.span.1)));

    let mut pvst = Pvst::new();
    let mut region_vertices: Vec<Vec<VtxId>> = vec![Vec::new()];
    let mut stack: Vec<(usize, Region)> = Vec::new();

    for r in regions {
        while let Some((_, top)) = stack.last() {
            if top.span.0 <= r.span.0 && r.span.1 <= top.span.1 {
                break;
            }
            stack.pop();
        }
        let parent = stack
            .iter()
            .rev()
            .find(|(_, anc)| anc.contains_region(&r))
            .map(|&(idx, _)| idx)
            .unwrap_or(0);
        let route = RouteParams {
            start: boundary_end(st, g, r.upper)?,
            end: boundary_end(st, g, r.lower)?,
            hairpin: r.hairpin,
        };
        let idx = pvst.add_vertex(parent, r.family, route);
        region_vertices.push(region_vertex_ids(st, g, &r));
        stack.push((idx, r));
    }

    Ok(Decomposition {
        pvst,
        region_vertices,
    })
}

fn boundary_end(
    st: &SpanningTree,
    g: &VariationGraph,
    node: usize,
) -> Result<(VtxId, crate::types::VtxEnd)> {
    let (v_idx, end) = st.end_of(node).ok_or(Error::InvariantViolation {
        node,
        trace: "region boundary resolved to the synthetic root".into(),
    })?;
    Ok((g.v_idx_to_id(v_idx), end))
}

fn region_vertex_ids(st: &SpanningTree, g: &VariationGraph, r: &Region) -> Vec<VtxId> {
    let mut set = FxHashSet::default();
    for node in r.span.0..=r.span.1 {
        if !r.contains_node(node) {
            continue;
        }
        if let Some((v_idx, _)) = st.end_of(node) {
            set.insert(g.v_idx_to_id(v_idx));
        }
    }
    let mut ids: Vec<VtxId> = set.into_iter().collect();
    ids.sort_unstable();
    ids
}

/// Every child region's vertex set must sit inside its parent's.
fn check_containment(dec: &Decomposition) -> Result<()> {
    for idx in 1..dec.pvst.len() {
        let parent = match dec.pvst.vertex(idx).parent {
            Some(p) if p != dec.pvst.root() => p,
            _ => continue,
        };
        let parent_set: FxHashSet<VtxId> =
            dec.vertices_of(parent).iter().copied().collect();
        if let Some(stray) = dec
            .vertices_of(idx)
            .iter()
            .find(|v| !parent_set.contains(v))
        {
            return Err(Error::InvariantViolation {
                node: idx,
                trace: format!("region vertex {stray} escapes the parent region"),
            });
        }
    }
    Ok(())
}
