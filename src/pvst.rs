// SPDX-License-Identifier: MPL-2.0
//! The Panagenome Variation Structure Tree: nested regions of variation
//! with family and clan labels, plus its line-oriented text persistence.

use std::fmt;

use crate::bidirected::VariationGraph;
use crate::error::{Error, Result};
use crate::types::{VtxEnd, VtxId};

/// Structural family of a region vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// A generic two-boundary region.
    Flubble,
    /// A single-interior-vertex bubble; always a leaf.
    Tiny,
    /// Three or more single-vertex arms in parallel; always a leaf.
    Parallel,
    /// A region whose class was obscured by a capping edge.
    Concealed,
    /// A region recovered across hairpin-tainted classes.
    Smothered,
    /// A serial-parallel region without cycles.
    Midi,
    /// The synthetic root.
    Dummy,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Family::Flubble => "flubble",
            Family::Tiny => "tiny",
            Family::Parallel => "parallel",
            Family::Concealed => "concealed",
            Family::Smothered => "smothered",
            Family::Midi => "midi",
            Family::Dummy => "dummy",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Family {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Family, ()> {
        Ok(match s {
            "flubble" => Family::Flubble,
            "tiny" => Family::Tiny,
            "parallel" => Family::Parallel,
            "concealed" => Family::Concealed,
            "smothered" => Family::Smothered,
            "midi" => Family::Midi,
            "dummy" => Family::Dummy,
            _ => return Err(()),
        })
    }
}

impl Family {
    /// Whether vertices of this family delimit allelic variation at all.
    pub fn is_region(self) -> bool {
        self != Family::Dummy
    }
}

/// Whether a vertex is a top-level region or nested sub-structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clan {
    /// A region in its own right.
    Flubble,
    /// Sub-structure of an enclosing flubble-family region.
    Subflubble,
}

impl fmt::Display for Clan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clan::Flubble => write!(f, "flubble"),
            Clan::Subflubble => write!(f, "subflubble"),
        }
    }
}

/// The two boundary ends of a region and its hairpin marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteParams {
    /// End the region is entered through, `(vertex id, exit end)`.
    pub start: (VtxId, VtxEnd),
    /// End the region is left through, `(vertex id, entry end)`.
    pub end: (VtxId, VtxEnd),
    /// True when an orientation-flipping edge participates in the region.
    pub hairpin: bool,
}

/// One PVST node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvstVertex {
    /// Structural family.
    pub family: Family,
    /// Clan, derived after the tree is assembled.
    pub clan: Clan,
    /// Boundary description; `None` only for the root.
    pub route: Option<RouteParams>,
    /// Parent index; `None` only for the root.
    pub parent: Option<usize>,
    /// Child indices in insertion order.
    pub children: Vec<usize>,
}

/// The tree itself: an arena of vertices with the root at index 0.
#[derive(Debug, PartialEq, Eq)]
pub struct Pvst {
    vertices: Vec<PvstVertex>,
}

impl Default for Pvst {
    fn default() -> Pvst {
        Pvst::new()
    }
}

impl Pvst {
    /// A tree holding only the dummy root.
    pub fn new() -> Pvst {
        Pvst {
            vertices: vec![PvstVertex {
                family: Family::Dummy,
                clan: Clan::Flubble,
                route: None,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Index of the root.
    pub fn root(&self) -> usize {
        0
    }

    /// Number of vertices, the root included.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the tree holds only the root.
    pub fn is_empty(&self) -> bool {
        self.vertices.len() == 1
    }

    /// One vertex by index.
    pub fn vertex(&self, idx: usize) -> &PvstVertex {
        &self.vertices[idx]
    }

    /// Mutable access to one vertex.
    pub fn vertex_mut(&mut self, idx: usize) -> &mut PvstVertex {
        &mut self.vertices[idx]
    }

    /// Whether a vertex has no children.
    pub fn is_leaf(&self, idx: usize) -> bool {
        self.vertices[idx].children.is_empty()
    }

    /// Adds a vertex under `parent` and returns its index.
    pub fn add_vertex(
        &mut self,
        parent: usize,
        family: Family,
        route: RouteParams,
    ) -> usize {
        let idx = self.vertices.len();
        self.vertices.push(PvstVertex {
            family,
            clan: Clan::Flubble,
            route: Some(route),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.vertices[parent].children.push(idx);
        idx
    }

    /// Vertex indices in pre-order, the root first.
    pub fn pre_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.vertices.len());
        let mut stack = vec![0];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            for &c in self.vertices[idx].children.iter().rev() {
                stack.push(c);
            }
        }
        order
    }

    /// Derives every vertex's clan: a direct child of a flubble-family
    /// vertex that is itself flubble-family (tiny and parallel included,
    /// parallel excepted from nothing here) becomes `Subflubble`.
    pub fn assign_clans(&mut self) {
        for idx in 0..self.vertices.len() {
            let clan = match self.vertices[idx].parent {
                Some(p)
                    if self.vertices[p].family.is_region()
                        && matches!(
                            self.vertices[idx].family,
                            Family::Flubble
                                | Family::Concealed
                                | Family::Smothered
                                | Family::Midi
                                | Family::Tiny
                        ) =>
                {
                    Clan::Subflubble
                }
                _ => Clan::Flubble,
            };
            self.vertices[idx].clan = clan;
        }
    }

    /// Checks the structural invariants against the graph the tree was
    /// built from: the root is routeless, every route endpoint resolves,
    /// and parent links are consistent.
    pub fn validate(&self, g: &VariationGraph) -> Result<()> {
        if self.vertices[0].route.is_some() {
            return Err(Error::InvariantViolation {
                node: 0,
                trace: "pvst root must not carry route params".into(),
            });
        }
        for (idx, v) in self.vertices.iter().enumerate().skip(1) {
            let route = v.route.as_ref().ok_or(Error::InvariantViolation {
                node: idx,
                trace: "non-root pvst vertex without route params".into(),
            })?;
            for (v_id, _) in [route.start, route.end] {
                if g.v_id_to_idx(v_id).is_err() {
                    return Err(Error::InvariantViolation {
                        node: idx,
                        trace: format!("route endpoint {v_id} not in graph"),
                    });
                }
            }
            let p = v.parent.ok_or(Error::InvariantViolation {
                node: idx,
                trace: "non-root pvst vertex without parent".into(),
            })?;
            if !self.vertices[p].children.contains(&idx) {
                return Err(Error::InvariantViolation {
                    node: idx,
                    trace: "parent does not list vertex as child".into(),
                });
            }
        }
        Ok(())
    }

    /// Serialises the tree, one vertex per line:
    /// `vtx_id parent_id family clan route_params hairpin_flag`.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (idx, v) in self.vertices.iter().enumerate() {
            let parent = match v.parent {
                Some(p) => p.to_string(),
                None => "-".to_string(),
            };
            let (route, hairpin) = match &v.route {
                Some(r) => (
                    format!(
                        "{},{}-{},{}",
                        r.start.0, r.start.1, r.end.0, r.end.1
                    ),
                    u8::from(r.hairpin),
                ),
                None => ("-".to_string(), 0),
            };
            out.push_str(&format!(
                "{idx} {parent} {} {} {route} {hairpin}\n",
                v.family, v.clan
            ));
        }
        out
    }

    /// Parses the text form back into a tree.
    pub fn from_text(text: &str) -> Result<Pvst> {
        let mut vertices: Vec<PvstVertex> = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let bad = |what: &str| {
                Error::MalformedInput(format!("pvst line {}: {what}", line_no + 1))
            };
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 6 {
                return Err(bad("expected 6 fields"));
            }
            let idx: usize = fields[0].parse().map_err(|_| bad("bad vertex id"))?;
            if idx != vertices.len() {
                return Err(bad("vertex ids must be dense and in order"));
            }
            let parent = match fields[1] {
                "-" => None,
                p => Some(p.parse::<usize>().map_err(|_| bad("bad parent id"))?),
            };
            let family: Family = fields[2].parse().map_err(|_| bad("bad family"))?;
            let clan = match fields[3] {
                "flubble" => Clan::Flubble,
                "subflubble" => Clan::Subflubble,
                _ => return Err(bad("bad clan")),
            };
            let hairpin = match fields[5] {
                "0" => false,
                "1" => true,
                _ => return Err(bad("bad hairpin flag")),
            };
            let route = match fields[4] {
                "-" => None,
                r => Some(parse_route(r, hairpin).ok_or_else(|| bad("bad route"))?),
            };
            if idx == 0 && (parent.is_some() || route.is_some()) {
                return Err(bad("root must have no parent and no route"));
            }
            if idx > 0 {
                let p = parent.ok_or_else(|| bad("non-root vertex needs a parent"))?;
                if p >= vertices.len() {
                    return Err(bad("parent must precede child"));
                }
                vertices[p].children.push(idx);
            }
            vertices.push(PvstVertex {
                family,
                clan,
                route,
                parent,
                children: Vec::new(),
            });
        }
        if vertices.is_empty() {
            return Err(Error::MalformedInput("empty pvst text".into()));
        }
        Ok(Pvst { vertices })
    }
}

fn parse_route(text: &str, hairpin: bool) -> Option<RouteParams> {
    let (start, end) = text.split_once('-')?;
    let parse_side = |side: &str| -> Option<(VtxId, VtxEnd)> {
        let (id, end) = side.split_once(',')?;
        let id = id.parse::<u32>().ok()?;
        let end = match end {
            "L" => VtxEnd::Left,
            "R" => VtxEnd::Right,
            _ => return None,
        };
        Some((VtxId(id), end))
    };
    Some(RouteParams {
        start: parse_side(start)?,
        end: parse_side(end)?,
        hairpin,
    })
}
