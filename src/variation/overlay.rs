// SPDX-License-Identifier: MPL-2.0
//! Overlay: pairs every enumerated walk against every reference visit of
//! the region's start vertex, records allele slices per reference
//! itinerary, flags tangled references, and types the pairwise variants
//! between walks.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::bidirected::VariationGraph;
use crate::refs::Reference;
use crate::types::{reversed_walk, Orientation, Slice, Step};

use super::rov::RoV;

/// The type a pairwise variant is called as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    /// The first walk carries steps the second lacks.
    Del,
    /// The second walk carries steps the first lacks.
    Ins,
    /// A single non-matching interior segment.
    Sub,
    /// One walk traverses the other's interior in reversed orientation.
    Inv,
    /// Endpoints do not match; nothing further can be said.
    Und,
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VarType::Del => "DEL",
            VarType::Ins => "INS",
            VarType::Sub => "SUB",
            VarType::Inv => "INV",
            VarType::Und => "UND",
        };
        write!(f, "{s}")
    }
}

/// The covariant of a type: what the same difference is called when the
/// two walks swap roles. An involution; `Und` maps to itself.
pub fn covariant(vt: VarType) -> VarType {
    match vt {
        VarType::Del => VarType::Ins,
        VarType::Ins => VarType::Del,
        VarType::Sub => VarType::Sub,
        VarType::Inv => VarType::Inv,
        VarType::Und => VarType::Und,
    }
}

/// One typed difference between two walks, as step windows into each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawVariant {
    /// Window into the first walk.
    pub slice_a: Slice,
    /// Window into the second walk.
    pub slice_b: Slice,
    /// The call.
    pub var_type: VarType,
}

/// All variants called between one ordered pair of walks.
#[derive(Debug, Clone)]
pub struct PairwiseVariants {
    /// Index of the first walk.
    pub walk_a: usize,
    /// Index of the second walk.
    pub walk_b: usize,
    /// The calls, shortest segment first.
    pub variants: Vec<RawVariant>,
}

/// One match between a walk and a reference: the walk covers the
/// reference from `start_in_ref`, forward or reversed.
#[derive(Debug, Clone)]
pub struct AlleleSlice {
    /// Which enumerated walk matched.
    pub walk_idx: usize,
    /// Which reference it matched against.
    pub ref_id: usize,
    /// Step index in the reference where the match is anchored.
    pub start_in_ref: usize,
    /// Number of matched steps.
    pub len: usize,
    /// Forward when the reference runs the walk's way, reverse otherwise.
    pub orientation: Orientation,
    /// Default call for the slice before pairwise typing refines it.
    pub var_type: VarType,
}

/// True iff `len` steps of the reference starting at `r_start` agree with
/// the walk from `w_start`, advancing both forward.
pub fn extend_right(
    r: &Reference,
    w: &[Step],
    w_start: usize,
    r_start: usize,
    len: usize,
) -> bool {
    for k in 0..len {
        let ref_step = match r.step(r_start + k) {
            Some(s) => s,
            None => return false,
        };
        let walk_step = match w.get(w_start + k) {
            Some(&s) => s,
            None => return false,
        };
        if ref_step != walk_step {
            return false;
        }
    }
    true
}

/// True iff `len` steps agree with the reference running backwards from
/// `r_start` with flipped orientations while the walk advances forward.
pub fn extend_left(
    r: &Reference,
    w: &[Step],
    w_start: usize,
    r_start: usize,
    len: usize,
) -> bool {
    for k in 0..len {
        let r_idx = match r_start.checked_sub(k) {
            Some(i) => i,
            None => return false,
        };
        let ref_step = match r.step(r_idx) {
            Some(s) => s,
            None => return false,
        };
        let walk_step = match w.get(w_start + k) {
            Some(&s) => s,
            None => return false,
        };
        if ref_step.v_id != walk_step.v_id
            || ref_step.orientation != walk_step.orientation.flip()
        {
            return false;
        }
    }
    true
}

/// Types the difference between two walks sharing both endpoints; `None`
/// when the walks are identical.
pub fn classify_pair(a: &[Step], b: &[Step]) -> Option<RawVariant> {
    if a == b || a.is_empty() || b.is_empty() {
        return None;
    }
    if a.first() != b.first() || a.last() != b.last() {
        return Some(RawVariant {
            slice_a: Slice {
                start: 0,
                len: a.len(),
            },
            slice_b: Slice {
                start: 0,
                len: b.len(),
            },
            var_type: VarType::Und,
        });
    }

    let limit = a.len().min(b.len());
    let mut prefix = 0;
    while prefix < limit && a[prefix] == b[prefix] {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < limit - prefix && a[a.len() - 1 - suffix] == b[b.len() - 1 - suffix] {
        suffix += 1;
    }

    let ia = &a[prefix..a.len() - suffix];
    let ib = &b[prefix..b.len() - suffix];
    let slice_a = Slice {
        start: prefix,
        len: ia.len(),
    };
    let slice_b = Slice {
        start: prefix,
        len: ib.len(),
    };

    let var_type = if ib.is_empty() {
        VarType::Del
    } else if ia.is_empty() {
        VarType::Ins
    } else if reversed_walk(ia) == ib {
        VarType::Inv
    } else {
        VarType::Sub
    };
    Some(RawVariant {
        slice_a,
        slice_b,
        var_type,
    })
}

/// Runs the overlay over one region whose walks are already enumerated:
/// fills the per-reference itineraries, sets the tangled flag, and types
/// the pairwise variants.
pub(crate) fn overlay_rov(g: &VariationGraph, rov: &mut RoV) {
    let mut itineraries: FxHashMap<usize, Vec<AlleleSlice>> = FxHashMap::default();
    let mut loop_count: FxHashMap<usize, usize> = FxHashMap::default();

    for (w_idx, walk) in rov.walks.iter().enumerate() {
        let front = match walk.first() {
            Some(&s) => s,
            None => continue,
        };
        let v_idx = match g.v_id_to_idx(front.v_id) {
            Ok(i) => i,
            Err(_) => continue,
        };
        for ref_id in 0..g.ref_count() {
            let r = g.get_ref(ref_id);
            for &r_start in g.vertex_ref_visits(v_idx, ref_id) {
                let is_right = extend_right(r, walk, 0, r_start, walk.len());
                let is_left = extend_left(r, walk, 0, r_start, walk.len());
                if !is_right && !is_left {
                    continue;
                }
                itineraries.entry(ref_id).or_default().push(AlleleSlice {
                    walk_idx: w_idx,
                    ref_id,
                    start_in_ref: r_start,
                    len: walk.len(),
                    orientation: if is_right {
                        Orientation::Forward
                    } else {
                        Orientation::Reverse
                    },
                    var_type: VarType::Sub,
                });
                *loop_count.entry(ref_id).or_default() += 1;
            }
        }
    }

    rov.tangled = loop_count.values().any(|&c| c > 1);
    for slices in itineraries.values_mut() {
        slices.sort_by_key(|s| s.start_in_ref);
    }
    rov.itineraries = itineraries;

    // pairwise typing, walk order; a pair with no difference is skipped
    let mut irreducibles = Vec::new();
    for i in 0..rov.walks.len() {
        for j in i + 1..rov.walks.len() {
            if let Some(rv) = classify_pair(&rov.walks[i], &rov.walks[j]) {
                irreducibles.push(PairwiseVariants {
                    walk_a: i,
                    walk_b: j,
                    variants: vec![rv],
                });
            }
        }
    }
    rov.irreducibles = irreducibles;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::Orientation::{Forward as F, Reverse as R};
    use crate::types::Step;

    fn w(steps: &[(u32, Orientation)]) -> Vec<Step> {
        steps.iter().map(|&(v, o)| Step::new(v, o)).collect()
    }

    #[test]
    fn covariant_is_an_involution() {
        for vt in [
            VarType::Del,
            VarType::Ins,
            VarType::Sub,
            VarType::Inv,
            VarType::Und,
        ] {
            assert_eq!(covariant(covariant(vt)), vt);
        }
        assert_eq!(covariant(VarType::Del), VarType::Ins);
        assert_eq!(covariant(VarType::Sub), VarType::Sub);
        assert_eq!(covariant(VarType::Und), VarType::Und);
    }

    #[test]
    fn substitution_pair() {
        let a = w(&[(1, F), (2, F), (4, F)]);
        let b = w(&[(1, F), (3, F), (4, F)]);
        let rv = classify_pair(&a, &b).unwrap();
        assert_eq!(rv.var_type, VarType::Sub);
        assert_eq!(rv.slice_a, Slice { start: 1, len: 1 });
        assert_eq!(rv.slice_b, Slice { start: 1, len: 1 });
    }

    #[test]
    fn insertion_and_deletion_pairs() {
        let long = w(&[(1, F), (2, F), (3, F)]);
        let short = w(&[(1, F), (3, F)]);
        let rv = classify_pair(&long, &short).unwrap();
        assert_eq!(rv.var_type, VarType::Del);
        assert_eq!(rv.slice_a, Slice { start: 1, len: 1 });
        assert_eq!(rv.slice_b, Slice { start: 1, len: 0 });

        let rv = classify_pair(&short, &long).unwrap();
        assert_eq!(rv.var_type, VarType::Ins);
    }

    #[test]
    fn narrowed_substitution() {
        let a = w(&[(3, F), (4, F), (5, F), (8, F)]);
        let b = w(&[(3, F), (4, F), (7, F), (8, F)]);
        let rv = classify_pair(&a, &b).unwrap();
        assert_eq!(rv.var_type, VarType::Sub);
        assert_eq!(rv.slice_a, Slice { start: 2, len: 1 });
    }

    #[test]
    fn inversion_pair() {
        let a = w(&[(2, F), (3, F), (4, F)]);
        let b = w(&[(2, F), (3, R), (4, F)]);
        let rv = classify_pair(&a, &b).unwrap();
        assert_eq!(rv.var_type, VarType::Inv);
    }

    #[test]
    fn multi_step_inversion_pair() {
        let a = w(&[(1, F), (2, F), (3, F), (5, F)]);
        let b = w(&[(1, F), (3, R), (2, R), (5, F)]);
        let rv = classify_pair(&a, &b).unwrap();
        assert_eq!(rv.var_type, VarType::Inv);
    }

    #[test]
    fn mismatched_endpoints_are_undetermined() {
        let a = w(&[(1, F), (2, F)]);
        let b = w(&[(3, F), (4, F)]);
        let rv = classify_pair(&a, &b).unwrap();
        assert_eq!(rv.var_type, VarType::Und);
    }

    #[test]
    fn identical_walks_have_no_variant() {
        let a = w(&[(1, F), (2, F)]);
        assert!(classify_pair(&a, &a.clone()).is_none());
    }

    #[test]
    fn extension_against_a_reference() {
        use crate::refs::Reference;
        let steps = w(&[(1, F), (2, F), (3, F), (4, F)]);
        let r = Reference::new("s#1#c", steps, &[1, 1, 1, 1]);

        let walk = w(&[(2, F), (3, F), (4, F)]);
        assert!(extend_right(&r, &walk, 0, 1, 3));
        assert!(!extend_right(&r, &walk, 0, 0, 3));
        // running off the reference end fails
        assert!(!extend_right(&r, &walk, 0, 2, 3));

        // the same window traversed the other way round
        let back = w(&[(4, R), (3, R), (2, R)]);
        assert!(extend_left(&r, &back, 0, 3, 3));
        assert!(!extend_left(&r, &back, 0, 1, 3));
    }
}
