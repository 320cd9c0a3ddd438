// SPDX-License-Identifier: MPL-2.0
//! Primitive types shared by the whole pipeline: vertex identity vs. index,
//! vertex ends, orientations, steps and walks.

use std::fmt;

/// Stable vertex identity, as carried by the input graph (1-based).
///
/// Deliberately a distinct type from [`VtxIdx`]: the identity survives the
/// whole run, while indices are dense positions into the loaded graph, and
/// mixing the two up silently produces wrong-but-plausible results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VtxId(pub u32);

impl fmt::Display for VtxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dense 0-based vertex position inside a loaded graph.
pub type VtxIdx = usize;

/// One of the two ends of a vertex in a bidirected graph; `Left` is the
/// 5' end, `Right` the 3' end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VtxEnd {
    /// The 5' end.
    Left,
    /// The 3' end.
    Right,
}

impl VtxEnd {
    /// The opposite end of the same vertex.
    pub fn complement(self) -> VtxEnd {
        match self {
            VtxEnd::Left => VtxEnd::Right,
            VtxEnd::Right => VtxEnd::Left,
        }
    }
}

impl fmt::Display for VtxEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VtxEnd::Left => write!(f, "L"),
            VtxEnd::Right => write!(f, "R"),
        }
    }
}

/// Direction in which a walk passes through a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Orientation {
    /// Entered at the left end, left at the right end.
    Forward,
    /// Entered at the right end, left at the left end.
    Reverse,
}

impl Orientation {
    /// The opposite orientation. `flip` is an involution.
    pub fn flip(self) -> Orientation {
        match self {
            Orientation::Forward => Orientation::Reverse,
            Orientation::Reverse => Orientation::Forward,
        }
    }

    /// The end through which a vertex traversed in this orientation is left.
    pub fn outgoing_end(self) -> VtxEnd {
        match self {
            Orientation::Forward => VtxEnd::Right,
            Orientation::Reverse => VtxEnd::Left,
        }
    }

    /// The orientation implied by entering a vertex through `end`.
    pub fn from_entry(end: VtxEnd) -> Orientation {
        match end {
            VtxEnd::Left => Orientation::Forward,
            VtxEnd::Right => Orientation::Reverse,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Forward => write!(f, ">"),
            Orientation::Reverse => write!(f, "<"),
        }
    }
}

/// One step of a walk: a vertex taken in an orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Step {
    /// The vertex the step passes through.
    pub v_id: VtxId,
    /// The direction it passes through in.
    pub orientation: Orientation,
}

impl Step {
    /// Convenience constructor.
    pub fn new(v_id: u32, orientation: Orientation) -> Step {
        Step {
            v_id: VtxId(v_id),
            orientation,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.orientation, self.v_id)
    }
}

/// An ordered sequence of steps. Two walks are equal iff they are pairwise
/// equal step for step.
pub type Walk = Vec<Step>;

/// Renders a walk as `>1>2<3` style text.
pub fn walk_to_string(walk: &[Step]) -> String {
    walk.iter().map(|s| s.to_string()).collect()
}

/// The same walk traversed the other way round: step order reversed and
/// every orientation flipped.
pub fn reversed_walk(walk: &[Step]) -> Walk {
    walk.iter()
        .rev()
        .map(|s| Step {
            v_id: s.v_id,
            orientation: s.orientation.flip(),
        })
        .collect()
}

/// A contiguous window of a walk, as a start offset and a length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    /// First step covered.
    pub start: usize,
    /// Number of steps covered.
    pub len: usize,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flip_is_involution() {
        for o in [Orientation::Forward, Orientation::Reverse] {
            assert_eq!(o.flip().flip(), o);
            assert_ne!(o.flip(), o);
        }
    }

    #[test]
    fn complement_is_involution() {
        for e in [VtxEnd::Left, VtxEnd::Right] {
            assert_eq!(e.complement().complement(), e);
            assert_ne!(e.complement(), e);
        }
    }

    #[test]
    fn entry_and_exit_ends_are_consistent() {
        // entering left means leaving right, and vice versa
        for end in [VtxEnd::Left, VtxEnd::Right] {
            let o = Orientation::from_entry(end);
            assert_eq!(o.outgoing_end(), end.complement());
        }
    }

    #[test]
    fn walk_rendering() {
        let w = vec![
            Step::new(1, Orientation::Forward),
            Step::new(3, Orientation::Reverse),
            Step::new(4, Orientation::Forward),
        ];
        assert_eq!(walk_to_string(&w), ">1<3>4");
    }

    #[test]
    fn reversed_walk_round_trips() {
        let w = vec![
            Step::new(1, Orientation::Forward),
            Step::new(2, Orientation::Reverse),
        ];
        let r = reversed_walk(&w);
        assert_eq!(r[0], Step::new(2, Orientation::Forward));
        assert_eq!(r[1], Step::new(1, Orientation::Reverse));
        assert_eq!(reversed_walk(&r), w);
    }
}
