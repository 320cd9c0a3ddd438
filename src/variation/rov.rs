// SPDX-License-Identifier: MPL-2.0
//! Region-of-variation generation: walks the PVST, elects the deepest
//! vertices every call-set reference can witness, applies the optional
//! genomic region filter, and materialises one RoV per elected vertex.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::bidirected::VariationGraph;
use crate::decompose::Decomposition;
use crate::error::{Error, Result};
use crate::pvst::{Family, RouteParams};
use crate::refs::GenomicRegion;
use crate::types::{VtxId, Walk};

use super::overlay::{AlleleSlice, PairwiseVariants};
use super::walks::MAX_FLUBBLE_STEPS;

/// What to call and how: the sample, an optional phase, an optional
/// genomic window, and the walk step bound.
#[derive(Debug, Clone)]
pub struct CallOpts {
    /// Sample whose references form the call set.
    pub sample: String,
    /// Haplotype phase to restrict to when the sample's ploidy exceeds 1.
    pub phase: Option<u32>,
    /// Only call regions whose boundaries fall inside this window.
    pub region: Option<GenomicRegion>,
    /// Walk enumeration bound.
    pub max_steps: usize,
}

impl CallOpts {
    /// Options for a sample with the default step bound and no filters.
    pub fn new(sample: &str) -> CallOpts {
        CallOpts {
            sample: sample.to_string(),
            phase: None,
            region: None,
            max_steps: MAX_FLUBBLE_STEPS,
        }
    }
}

/// One region of variation: its PVST vertex, sorted vertex table, and,
/// once resolved, its walks, itineraries and typed variants.
#[derive(Debug)]
pub struct RoV {
    /// The PVST vertex this region was called from.
    pub pvst_idx: usize,
    /// The region's boundary route.
    pub route: RouteParams,
    sorted_vertices: Vec<VtxId>,
    sort_order: FxHashMap<VtxId, usize>,
    /// Enumerated walks, DFS discovery order.
    pub walks: Vec<Walk>,
    /// Typed pairwise variants, walk order.
    pub irreducibles: Vec<PairwiseVariants>,
    /// Per-reference allele slices, sorted by position in the reference.
    pub itineraries: FxHashMap<usize, Vec<AlleleSlice>>,
    /// Set when some reference traverses the region more than once.
    pub tangled: bool,
    /// Set when walk enumeration exhausted its bound; the region carries
    /// no walks or variants.
    pub unresolved: bool,
}

impl RoV {
    fn new(pvst_idx: usize, route: RouteParams, vertices: &[VtxId]) -> RoV {
        let mut sorted: Vec<VtxId> = vertices.to_vec();
        sorted.sort_unstable();
        let sort_order = sorted
            .iter()
            .enumerate()
            .map(|(rank, &v)| (v, rank))
            .collect();
        RoV {
            pvst_idx,
            route,
            sorted_vertices: sorted,
            sort_order,
            walks: Vec::new(),
            irreducibles: Vec::new(),
            itineraries: FxHashMap::default(),
            tangled: false,
            unresolved: false,
        }
    }

    /// The region's vertices, ascending by id.
    pub fn sorted_vertices(&self) -> &[VtxId] {
        &self.sorted_vertices
    }

    /// Rank of a vertex in the sorted table.
    pub fn get_sorted_pos(&self, v_id: VtxId) -> Option<usize> {
        self.sort_order.get(&v_id).copied()
    }

    /// Vertex at a rank in the sorted table.
    pub fn get_sorted_vertex(&self, pos: usize) -> Option<VtxId> {
        self.sorted_vertices.get(pos).copied()
    }

    /// Number of enumerated walks.
    pub fn walk_count(&self) -> usize {
        self.walks.len()
    }
}

/// Builds the call set for a sample: every reference of the sample when
/// its ploidy is 1 or unknown, otherwise the references matching the
/// requested phase. An empty result is a failed run.
pub fn call_set(g: &VariationGraph, sample: &str, phase: Option<u32>) -> Result<Vec<usize>> {
    let all = g.refs_of_sample(sample);
    if all.is_empty() {
        return Err(Error::ReferenceMissing(sample.to_string()));
    }
    let chosen: Vec<usize> = match (g.ploidy(sample), phase) {
        (Some(p), Some(ph)) if p > 1 => all
            .iter()
            .copied()
            .filter(|&r| g.get_ref(r).hap_id() == Some(ph))
            .collect(),
        _ => all.to_vec(),
    };
    if chosen.is_empty() {
        return Err(Error::ReferenceMissing(format!(
            "{sample} phase {}",
            phase.map(|p| p.to_string()).unwrap_or_default()
        )));
    }
    Ok(chosen)
}

/// Elects PVST vertices and materialises RoVs for them, in PVST
/// pre-order.
pub fn generate_rovs(
    g: &VariationGraph,
    dec: &Decomposition,
    opts: &CallOpts,
) -> Result<Vec<RoV>> {
    let cs = call_set(g, &opts.sample, opts.phase)?;

    let region_ref = match &opts.region {
        Some(region) => Some(
            g.ref_id_by_tag(&region.ref_name)
                .ok_or_else(|| Error::ReferenceMissing(region.ref_name.clone()))?,
        ),
        None => None,
    };

    let pvst = &dec.pvst;
    let mut to_call: FxHashSet<usize> = FxHashSet::default();
    let mut stack = vec![pvst.root()];
    while let Some(idx) = stack.pop() {
        for &c in pvst.vertex(idx).children.iter().rev() {
            stack.push(c);
        }
        let v = pvst.vertex(idx);
        let route = match &v.route {
            Some(r) => *r,
            None => continue,
        };
        // nested cap/hairpin recoveries are reported via their ancestor
        if matches!(v.family, Family::Concealed | Family::Smothered) {
            if let Some(p) = v.parent {
                if pvst.vertex(p).route.is_some() {
                    continue;
                }
            }
        }
        if !witnessed_by_all(g, &cs, &route)? {
            continue;
        }
        to_call.insert(idx);
        if let Some(p) = v.parent {
            if to_call.contains(&p) {
                // prefer the deepest eligible vertex
                to_call.remove(&p);
            }
        }
    }

    if let (Some(ref_id), Some(region)) = (region_ref, &opts.region) {
        to_call.retain(|&idx| match &pvst.vertex(idx).route {
            Some(route) => route_in_window(g, ref_id, route, region),
            None => false,
        });
    }

    let mut order: Vec<usize> = to_call.into_iter().collect();
    let rank: FxHashMap<usize, usize> = pvst
        .pre_order()
        .into_iter()
        .enumerate()
        .map(|(r, idx)| (idx, r))
        .collect();
    order.sort_by_key(|idx| rank.get(idx).copied().unwrap_or(usize::MAX));

    Ok(order
        .into_iter()
        .filter_map(|idx| {
            pvst.vertex(idx)
                .route
                .map(|route| RoV::new(idx, route, dec.vertices_of(idx)))
        })
        .collect())
}

/// True iff every call-set reference visits both boundary vertices.
fn witnessed_by_all(g: &VariationGraph, cs: &[usize], route: &RouteParams) -> Result<bool> {
    let s = g.v_id_to_idx(route.start.0)?;
    let t = g.v_id_to_idx(route.end.0)?;
    Ok(cs.iter().all(|&r| {
        !g.vertex_ref_visits(s, r).is_empty() && !g.vertex_ref_visits(t, r).is_empty()
    }))
}

/// True iff both boundary vertices have a visit on `ref_id` whose base
/// offset falls inside `[start, end)`.
fn route_in_window(
    g: &VariationGraph,
    ref_id: usize,
    route: &RouteParams,
    window: &GenomicRegion,
) -> bool {
    let r = g.get_ref(ref_id);
    let in_window = |v_id: VtxId| -> bool {
        let v_idx = match g.v_id_to_idx(v_id) {
            Ok(i) => i,
            Err(_) => return false,
        };
        g.vertex_ref_visits(v_idx, ref_id).iter().any(|&step| {
            r.step_offset(step)
                .map(|at| at >= window.start && at < window.end)
                .unwrap_or(false)
        })
    };
    in_window(route.start.0) && in_window(route.end.0)
}
