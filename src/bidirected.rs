// SPDX-License-Identifier: MPL-2.0
//! The bidirected sequence graph: vertices carrying DNA labels with two
//! ends, edges joining specific ends, and reference walks indexed by
//! vertex.

use rand::RngCore;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::refs::Reference;
use crate::types::{Orientation, Step, VtxEnd, VtxId, VtxIdx, Walk};

/// A vertex of the graph: its stable id, sequence label, per-end incident
/// edge lists, and (after freeze) the steps at which each reference visits
/// it.
#[derive(Debug)]
pub struct Vertex {
    v_id: VtxId,
    seq: String,
    left: Vec<usize>,
    right: Vec<usize>,
    /// `visits[ref_id]` holds the step indices at which that reference
    /// passes through this vertex, in walk order.
    visits: Vec<Vec<usize>>,
}

impl Vertex {
    /// The stable id.
    pub fn v_id(&self) -> VtxId {
        self.v_id
    }

    /// The sequence label.
    pub fn seq(&self) -> &str {
        &self.seq
    }

    /// Length of the sequence label in bases.
    pub fn seq_len(&self) -> u64 {
        self.seq.len() as u64
    }
}

/// An edge between two specific vertex ends. Deduplication is by the
/// unordered pair of `(vertex, end)` sides, so side order does not matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// First endpoint vertex (dense index).
    pub v1: VtxIdx,
    /// End of the first endpoint the edge attaches to.
    pub end1: VtxEnd,
    /// Second endpoint vertex (dense index).
    pub v2: VtxIdx,
    /// End of the second endpoint the edge attaches to.
    pub end2: VtxEnd,
}

impl Edge {
    /// The endpoint opposite to `(v, end)`. For a same-end self-loop both
    /// sides coincide and the edge leads back to where it came from.
    pub fn other(&self, v: VtxIdx, end: VtxEnd) -> (VtxIdx, VtxEnd) {
        if self.v1 == v && self.end1 == end {
            (self.v2, self.end2)
        } else {
            (self.v1, self.end1)
        }
    }

    /// Whether crossing this edge flips a walk's orientation: true iff the
    /// two attached ends are of the same type (L to L, or R to R).
    pub fn is_inverting(&self) -> bool {
        self.end1 == self.end2
    }

    /// Whether both endpoints are the same vertex.
    pub fn is_self_loop(&self) -> bool {
        self.v1 == self.v2
    }
}

fn edge_key(v1: VtxIdx, e1: VtxEnd, v2: VtxIdx, e2: VtxEnd) -> (VtxIdx, u8, VtxIdx, u8) {
    let a = (v1, e1 as u8);
    let b = (v2, e2 as u8);
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    (lo.0, lo.1, hi.0, hi.1)
}

/// Mutable ingestion stage of the graph. A host feeds it `add_vertex` /
/// `add_edge` / `add_reference` calls and then moves it into an immutable
/// [`VariationGraph`] with [`VgBuilder::freeze`].
#[derive(Debug, Default)]
pub struct VgBuilder {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    id_to_idx: FxHashMap<VtxId, VtxIdx>,
    edge_keys: FxHashSet<(VtxIdx, u8, VtxIdx, u8)>,
    ref_specs: Vec<(String, Walk)>,
}

impl VgBuilder {
    /// An empty builder.
    pub fn new() -> VgBuilder {
        VgBuilder::default()
    }

    /// Inserts a vertex with its sequence label.
    pub fn add_vertex(&mut self, v_id: u32, seq: &str) -> Result<()> {
        let v_id = VtxId(v_id);
        if self.id_to_idx.contains_key(&v_id) {
            return Err(Error::DuplicateVertex(v_id));
        }
        self.id_to_idx.insert(v_id, self.vertices.len());
        self.vertices.push(Vertex {
            v_id,
            seq: seq.to_string(),
            left: Vec::new(),
            right: Vec::new(),
            visits: Vec::new(),
        });
        Ok(())
    }

    /// Inserts an edge between two vertex ends. Multi-edges are
    /// deduplicated; self-loops are allowed.
    pub fn add_edge(&mut self, v1_id: u32, end1: VtxEnd, v2_id: u32, end2: VtxEnd) -> Result<()> {
        let v1 = self.lookup(VtxId(v1_id))?;
        let v2 = self.lookup(VtxId(v2_id))?;
        let key = edge_key(v1, end1, v2, end2);
        if !self.edge_keys.insert(key) {
            return Ok(());
        }
        let e_idx = self.edges.len();
        self.edges.push(Edge { v1, end1, v2, end2 });
        self.attach(v1, end1, e_idx);
        if (v1, end1) != (v2, end2) {
            self.attach(v2, end2, e_idx);
        }
        Ok(())
    }

    /// Registers a reference walk; the steps are validated at freeze time.
    pub fn add_reference(&mut self, name: &str, steps: Walk) {
        self.ref_specs.push((name.to_string(), steps));
    }

    fn attach(&mut self, v: VtxIdx, end: VtxEnd, e_idx: usize) {
        match end {
            VtxEnd::Left => self.vertices[v].left.push(e_idx),
            VtxEnd::Right => self.vertices[v].right.push(e_idx),
        }
    }

    fn lookup(&self, v_id: VtxId) -> Result<VtxIdx> {
        self.id_to_idx
            .get(&v_id)
            .copied()
            .ok_or(Error::UnknownVertex(v_id))
    }

    /// Consumes the builder, validates every reference step, and computes
    /// the per-vertex visit tables, base offsets and per-sample ploidy.
    pub fn freeze(mut self) -> Result<VariationGraph> {
        let ref_count = self.ref_specs.len();
        for v in &mut self.vertices {
            v.visits = vec![Vec::new(); ref_count];
        }

        let mut refs = Vec::with_capacity(ref_count);
        for (ref_id, (tag, steps)) in self.ref_specs.drain(..).enumerate() {
            let mut step_lens = Vec::with_capacity(steps.len());
            for (step_idx, step) in steps.iter().enumerate() {
                let v_idx = match self.id_to_idx.get(&step.v_id) {
                    Some(&i) => i,
                    None => {
                        return Err(Error::MalformedInput(format!(
                            "reference {tag} step {step_idx} visits unknown vertex {}",
                            step.v_id
                        )))
                    }
                };
                self.vertices[v_idx].visits[ref_id].push(step_idx);
                step_lens.push(self.vertices[v_idx].seq_len());
            }
            refs.push(Reference::new(&tag, steps, &step_lens));
        }

        let mut samples: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (ref_id, r) in refs.iter().enumerate() {
            samples
                .entry(r.sample_name().to_string())
                .or_default()
                .push(ref_id);
        }
        let mut ploidy = FxHashMap::default();
        for (sample, ref_ids) in &samples {
            let haps: Option<FxHashSet<u32>> =
                ref_ids.iter().map(|&r| refs[r].hap_id()).collect();
            ploidy.insert(sample.clone(), haps.map(|h| h.len()));
        }

        Ok(VariationGraph {
            vertices: self.vertices,
            edges: self.edges,
            id_to_idx: self.id_to_idx,
            refs,
            samples,
            ploidy,
        })
    }
}

/// The frozen, read-only bidirected graph the decomposition runs over.
#[derive(Debug)]
pub struct VariationGraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    id_to_idx: FxHashMap<VtxId, VtxIdx>,
    refs: Vec<Reference>,
    samples: FxHashMap<String, Vec<usize>>,
    /// `Some(n)` when every ref of the sample carries a hap id, else `None`.
    ploidy: FxHashMap<String, Option<usize>>,
}

impl VariationGraph {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// The vertex at a dense index.
    pub fn vertex(&self, v_idx: VtxIdx) -> &Vertex {
        &self.vertices[v_idx]
    }

    /// The edge at an edge index.
    pub fn edge(&self, e_idx: usize) -> &Edge {
        &self.edges[e_idx]
    }

    /// All edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Edge indices incident to one specific end of a vertex, in insertion
    /// order.
    pub fn neighbors(&self, v_idx: VtxIdx, end: VtxEnd) -> &[usize] {
        match end {
            VtxEnd::Left => &self.vertices[v_idx].left,
            VtxEnd::Right => &self.vertices[v_idx].right,
        }
    }

    /// Dense index of a stable id.
    pub fn v_id_to_idx(&self, v_id: VtxId) -> Result<VtxIdx> {
        self.id_to_idx
            .get(&v_id)
            .copied()
            .ok_or(Error::UnknownVertex(v_id))
    }

    /// Stable id of a dense index.
    pub fn v_idx_to_id(&self, v_idx: VtxIdx) -> VtxId {
        self.vertices[v_idx].v_id
    }

    /// For each reference, the ordered step indices at which it visits the
    /// given vertex.
    pub fn get_vertex_refs(&self, v_id: VtxId) -> Result<&[Vec<usize>]> {
        let v_idx = self.v_id_to_idx(v_id)?;
        Ok(&self.vertices[v_idx].visits)
    }

    /// Step indices at which one reference visits one vertex.
    pub fn vertex_ref_visits(&self, v_idx: VtxIdx, ref_id: usize) -> &[usize] {
        &self.vertices[v_idx].visits[ref_id]
    }

    /// All ingested references.
    pub fn refs(&self) -> &[Reference] {
        &self.refs
    }

    /// Number of references.
    pub fn ref_count(&self) -> usize {
        self.refs.len()
    }

    /// One reference by id.
    pub fn get_ref(&self, ref_id: usize) -> &Reference {
        &self.refs[ref_id]
    }

    /// Looks a reference up by its full tag.
    pub fn ref_id_by_tag(&self, tag: &str) -> Option<usize> {
        self.refs.iter().position(|r| r.tag() == tag)
    }

    /// Reference ids belonging to a sample, in ingestion order.
    pub fn refs_of_sample(&self, sample: &str) -> &[usize] {
        self.samples.get(sample).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ploidy of a sample: the number of distinct hap ids, or `None` when
    /// the sample has a ref without one (unknown ploidy).
    pub fn ploidy(&self, sample: &str) -> Option<usize> {
        self.ploidy.get(sample).copied().flatten()
    }

    /// Creates a reference-only graph: a random linear chain of `n`
    /// vertices joined `R -> L`, visited forward by a single reference.
    /// Used by property tests; decomposing such a graph must yield nothing.
    pub fn random_linear(n: usize, mut rng: impl rand::RngCore) -> VariationGraph {
        assert!(n > 0, "chain must have at least one vertex");
        const BASES: [char; 4] = ['A', 'C', 'G', 'T'];
        let mut b = VgBuilder::new();
        for i in 1..=n as u32 {
            let len = 1 + (rng.next_u32() % 5) as usize;
            let seq: String = (0..len)
                .map(|_| BASES[(rng.next_u32() % 4) as usize])
                .collect();
            b.add_vertex(i, &seq).unwrap();
        }
        for i in 1..n as u32 {
            b.add_edge(i, VtxEnd::Right, i + 1, VtxEnd::Left).unwrap();
        }
        let steps: Walk = (1..=n as u32)
            .map(|i| Step::new(i, Orientation::Forward))
            .collect();
        b.add_reference("sim#1#lin", steps);
        b.freeze().unwrap()
    }
}
