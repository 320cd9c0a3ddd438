// SPDX-License-Identifier: MPL-2.0
//! Concealed recovery: when the cycle-equivalence pass caps a branch, the
//! capped cycle's region no longer falls out of any single class (its
//! edges are spread over the classes the cap sits on top of, as happens
//! with overlapping bubbles). Each capping bracket names the back-edge it
//! shadowed; re-running the boundary extraction over that back-edge's
//! fundamental cycle recovers the obscured region as `Concealed`.

use rustc_hash::FxHashSet;

use crate::cycle_equiv::CapEvent;
use crate::pvst::Family;
use crate::spanning_tree::SpanningTree;

use super::{extract_boundaries, Region};

pub(crate) fn find_concealed(
    st: &SpanningTree,
    caps: &[CapEvent],
    existing: &[Region],
) -> Vec<Region> {
    let mut seen: FxHashSet<(usize, usize)> =
        existing.iter().map(|r| (r.upper, r.lower)).collect();
    let mut regions = Vec::new();

    for cap in caps {
        for (be_id, be) in st.back_edges().iter().enumerate() {
            // the capped cycles are the ones closing at the cap's target
            // from below the branch node
            if be.upper != cap.upper || be.is_self() || be.inverting {
                continue;
            }
            if !st.is_ancestor(cap.origin, be.lower) {
                continue;
            }

            // tree edges of the back-edge's fundamental cycle
            let mut edges = Vec::new();
            let mut cur = be.lower;
            while cur != be.upper {
                edges.push(cur);
                cur = match st.parent_of(cur) {
                    Some(p) => p,
                    None => break,
                };
            }
            if cur != be.upper {
                continue;
            }

            if let Some(x) = extract_boundaries(st, &edges, &[be_id]) {
                if seen.insert((x.upper, x.lower)) {
                    regions.push(Region {
                        upper: x.upper,
                        lower: x.lower,
                        span: x.span,
                        holes: x.holes,
                        family: Family::Concealed,
                        hairpin: x.hairpin,
                    });
                }
            }
        }
    }
    regions
}

#[cfg(test)]
mod test {
    use crate::bidirected::VgBuilder;
    use crate::decompose::build_pvst;
    use crate::pvst::Family;
    use crate::types::VtxEnd::{Left, Right};
    use crate::types::VtxId;

    #[test]
    fn overlapping_bubbles_recover_a_concealed_region() {
        // bubble A: 1 -> {2 -> 3 | direct} -> 4; bubble B: 2 -> {3 | direct} -> 5.
        // they share the 2..3 chain, so bubble B's class is capped apart
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
        let dec = build_pvst(&g).unwrap();

        assert_eq!(dec.pvst.len(), 3);
        let concealed: Vec<usize> = (1..dec.pvst.len())
            .filter(|&i| dec.pvst.vertex(i).family == Family::Concealed)
            .collect();
        assert_eq!(concealed.len(), 1);
        let r = dec.pvst.vertex(concealed[0]).route.unwrap();
        assert_eq!(r.start, (VtxId(2), Right));
        assert_eq!(r.end, (VtxId(5), Left));
        assert!(!r.hairpin);
        // the two overlapping regions are siblings
        assert_eq!(dec.pvst.vertex(1).parent, Some(0));
        assert_eq!(dec.pvst.vertex(2).parent, Some(0));
    }

    #[test]
    fn capped_multi_arm_bubble_is_not_duplicated() {
        // a three-arm bubble caps its sink fork, but the recovered cycles
        // describe the same region the flubble phase already found
        let mut b = VgBuilder::new();
        for id in 1..=5 {
            b.add_vertex(id, "A").unwrap();
        }
        for arm in [2, 3, 4] {
            b.add_edge(1, Right, arm, Left).unwrap();
            b.add_edge(arm, Right, 5, Left).unwrap();
        }
        let g = b.freeze().unwrap();
        let dec = build_pvst(&g).unwrap();
        assert_eq!(dec.pvst.len(), 2);
        assert_eq!(dec.pvst.vertex(1).family, Family::Parallel);
    }
}
