// SPDX-License-Identifier: MPL-2.0
//! Bounded enumeration of allelic walks between the two boundary ends of a
//! region.

use rustc_hash::FxHashSet;

use crate::bidirected::VariationGraph;
use crate::error::{Error, Result};
use crate::types::{Orientation, Step, VtxEnd, VtxId, Walk};

/// Maximum number of steps taken from a region's start to its end; walks
/// that would grow longer are abandoned.
pub const MAX_FLUBBLE_STEPS: usize = 20;

/// Enumerates every walk from `(start vertex, exit end)` to
/// `(end vertex, entry end)` within `max_steps` steps, in DFS discovery
/// order, duplicates removed. Crossing an edge flips orientation iff the
/// edge joins two ends of the same type.
///
/// Fails with [`Error::EnumerationBound`] when no walk fits the bound.
pub fn enumerate_walks(
    g: &VariationGraph,
    start: (VtxId, VtxEnd),
    end: (VtxId, VtxEnd),
    max_steps: usize,
) -> Result<Vec<Walk>> {
    let start_idx = g.v_id_to_idx(start.0)?;
    g.v_id_to_idx(end.0)?;

    let first = Step {
        v_id: start.0,
        // leaving through the right end is a forward traversal
        orientation: match start.1 {
            VtxEnd::Right => Orientation::Forward,
            VtxEnd::Left => Orientation::Reverse,
        },
    };

    let mut walks: Vec<Walk> = Vec::new();
    let mut seen: FxHashSet<Walk> = FxHashSet::default();
    // (walk, current vertex, walk is complete)
    let mut stack: Vec<(Walk, usize, bool)> = vec![(vec![first], start_idx, false)];

    while let Some((walk, v_idx, complete)) = stack.pop() {
        if complete {
            if seen.insert(walk.clone()) {
                walks.push(walk);
            }
            continue;
        }
        if walk.len() >= max_steps {
            continue;
        }
        let out_end = match walk.last() {
            Some(s) => s.orientation.outgoing_end(),
            None => continue,
        };
        // reversed push keeps expansion in edge insertion order
        for &e_idx in g.neighbors(v_idx, out_end).iter().rev() {
            let (u_idx, u_end) = g.edge(e_idx).other(v_idx, out_end);
            let step = Step {
                v_id: g.v_idx_to_id(u_idx),
                orientation: Orientation::from_entry(u_end),
            };
            if step.v_id == end.0 && u_end == end.1 {
                let mut done = walk.clone();
                done.push(step);
                stack.push((done, u_idx, true));
                continue;
            }
            if walk.contains(&step) {
                continue; // cycle guard: never repeat a step in one branch
            }
            let mut next = walk.clone();
            next.push(step);
            stack.push((next, u_idx, false));
        }
    }

    if walks.is_empty() {
        return Err(Error::EnumerationBound { max_steps });
    }
    Ok(walks)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bidirected::VgBuilder;
    use crate::types::walk_to_string;
    use crate::types::VtxEnd::{Left, Right};

    #[test]
    fn sub_bubble_walks_in_discovery_order() {
        let mut b = VgBuilder::new();
        for id in 1..=4 {
            b.add_vertex(id, "A").unwrap();
        }
        b.add_edge(1, Right, 2, Left).unwrap();
        b.add_edge(1, Right, 3, Left).unwrap();
        b.add_edge(2, Right, 4, Left).unwrap();
        b.add_edge(3, Right, 4, Left).unwrap();
        let g = b.freeze().unwrap();
        let walks = enumerate_walks(
            &g,
            (VtxId(1), Right),
            (VtxId(4), Left),
            MAX_FLUBBLE_STEPS,
        )
        .unwrap();
        let rendered: Vec<String> = walks.iter().map(|w| walk_to_string(w)).collect();
        assert_eq!(rendered, vec![">1>2>4", ">1>3>4"]);
    }

    #[test]
    fn deletion_bubble_includes_the_shortcut() {
        let mut b = VgBuilder::new();
        for id in 1..=3 {
            b.add_vertex(id, "A").unwrap();
        }
        b.add_edge(1, Right, 2, Left).unwrap();
        b.add_edge(2, Right, 3, Left).unwrap();
        b.add_edge(1, Right, 3, Left).unwrap();
        let g = b.freeze().unwrap();
        let walks =
            enumerate_walks(&g, (VtxId(1), Right), (VtxId(3), Left), MAX_FLUBBLE_STEPS).unwrap();
        let rendered: Vec<String> = walks.iter().map(|w| walk_to_string(w)).collect();
        assert_eq!(rendered, vec![">1>2>3", ">1>3"]);
    }

    #[test]
    fn inversion_walk_flips_orientation() {
        let mut b = VgBuilder::new();
        for id in 1..=4 {
            b.add_vertex(id, "A").unwrap();
        }
        b.add_edge(1, Right, 2, Left).unwrap();
        b.add_edge(2, Right, 3, Left).unwrap();
        b.add_edge(3, Right, 4, Left).unwrap();
        b.add_edge(2, Right, 3, Right).unwrap();
        b.add_edge(3, Left, 4, Left).unwrap();
        let g = b.freeze().unwrap();
        let walks =
            enumerate_walks(&g, (VtxId(2), Right), (VtxId(4), Left), MAX_FLUBBLE_STEPS).unwrap();
        let rendered: Vec<String> = walks.iter().map(|w| walk_to_string(w)).collect();
        assert!(rendered.contains(&">2>3>4".to_string()));
        assert!(rendered.contains(&">2<3>4".to_string()));
    }

    #[test]
    fn walks_are_edge_connected_with_consistent_orientation() {
        let mut b = VgBuilder::new();
        for id in 1..=4 {
            b.add_vertex(id, "A").unwrap();
        }
        b.add_edge(1, Right, 2, Left).unwrap();
        b.add_edge(1, Right, 3, Left).unwrap();
        b.add_edge(2, Right, 4, Left).unwrap();
        b.add_edge(3, Right, 4, Left).unwrap();
        let g = b.freeze().unwrap();
        let walks =
            enumerate_walks(&g, (VtxId(1), Right), (VtxId(4), Left), MAX_FLUBBLE_STEPS).unwrap();
        for w in &walks {
            for pair in w.windows(2) {
                let from = g.v_id_to_idx(pair[0].v_id).unwrap();
                let out = pair[0].orientation.outgoing_end();
                let hit = g.neighbors(from, out).iter().any(|&e| {
                    let (u, u_end) = g.edge(e).other(from, out);
                    g.v_idx_to_id(u) == pair[1].v_id
                        && Orientation::from_entry(u_end) == pair[1].orientation
                });
                assert!(hit, "steps {} -> {} not edge-connected", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn bound_exhaustion_is_an_error() {
        // a plain chain is too long to traverse in 3 steps
        let mut b = VgBuilder::new();
        for id in 1..=6 {
            b.add_vertex(id, "A").unwrap();
        }
        for id in 1..6 {
            b.add_edge(id, Right, id + 1, Left).unwrap();
        }
        let g = b.freeze().unwrap();
        let out = enumerate_walks(&g, (VtxId(1), Right), (VtxId(6), Left), 3);
        assert!(matches!(out, Err(Error::EnumerationBound { max_steps: 3 })));
    }

    #[test]
    fn cycle_guard_terminates_loops() {
        // 1 -> 2 -> 3 -> 2 loop next to the 1 -> 4 exit
        let mut b = VgBuilder::new();
        for id in 1..=4 {
            b.add_vertex(id, "A").unwrap();
        }
        b.add_edge(1, Right, 2, Left).unwrap();
        b.add_edge(2, Right, 3, Left).unwrap();
        b.add_edge(3, Right, 2, Left).unwrap();
        b.add_edge(2, Right, 4, Left).unwrap();
        let g = b.freeze().unwrap();
        let walks =
            enumerate_walks(&g, (VtxId(1), Right), (VtxId(4), Left), MAX_FLUBBLE_STEPS).unwrap();
        // the loop contributes one extra pass at most, then the guard trips
        assert!(walks.iter().all(|w| w.len() <= 5));
        assert!(!walks.is_empty());
    }
}
