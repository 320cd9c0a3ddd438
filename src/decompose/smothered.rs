// SPDX-License-Identifier: MPL-2.0
//! Smothered recovery: hairpin-tainted classes fragment what would
//! otherwise be one region, because each inverting back-edge cuts its own
//! bracket span. Maximal runs of path-adjacent tainted classes are unioned
//! and the boundary extraction re-run over the merged edge set; a clean
//! result becomes a smothered region carrying the hairpin flag.

use rustc_hash::FxHashSet;

use crate::cycle_equiv::ClassInfo;
use crate::pvst::Family;
use crate::spanning_tree::SpanningTree;

use super::{extract_boundaries, Region};

pub(crate) fn find_smothered(
    st: &SpanningTree,
    classes: &[ClassInfo],
    deferred: &[usize],
) -> Vec<Region> {
    // every deferred tree edge as (upper, child, class), shallowest first
    let mut edges: Vec<(usize, usize, usize)> = deferred
        .iter()
        .flat_map(|&cid| classes[cid].edges.iter().map(move |&child| (child, cid)))
        .filter_map(|(child, cid)| st.parent_of(child).map(|p| (p, child, cid)))
        .collect();
    edges.sort_unstable();

    let mut regions = Vec::new();
    let mut group: Vec<usize> = Vec::new();
    let mut group_cids: FxHashSet<usize> = FxHashSet::default();
    let mut group_deepest = 0usize;

    for (upper, child, cid) in edges {
        let adjacent = !group.is_empty() && st.is_ancestor(group_deepest, upper);
        if !adjacent && !group.is_empty() {
            if let Some(r) = close_group(st, classes, &group, &group_cids) {
                regions.push(r);
            }
            group.clear();
            group_cids.clear();
        }
        group_deepest = child.max(if group.is_empty() { 0 } else { group_deepest });
        group.push(child);
        group_cids.insert(cid);
    }
    if !group.is_empty() {
        if let Some(r) = close_group(st, classes, &group, &group_cids) {
            regions.push(r);
        }
    }
    regions
}

fn close_group(
    st: &SpanningTree,
    classes: &[ClassInfo],
    group: &[usize],
    group_cids: &FxHashSet<usize>,
) -> Option<Region> {
    let mut brackets: Vec<usize> = group_cids
        .iter()
        .flat_map(|&cid| classes[cid].brackets.iter().copied())
        .collect::<FxHashSet<usize>>()
        .into_iter()
        .collect();
    brackets.sort_unstable();

    let x = extract_boundaries(st, group, &brackets)?;
    Some(Region {
        upper: x.upper,
        lower: x.lower,
        span: x.span,
        holes: x.holes,
        family: Family::Smothered,
        // the group exists because hairpin back-edges split it; the flag is
        // set even when the surviving tree edges are all plain links
        hairpin: true,
    })
}
