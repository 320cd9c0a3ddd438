// SPDX-License-Identifier: MPL-2.0
//! Reference walks: named paths through the graph that serve as the
//! coordinate system variants are called against.

use crate::types::{Step, Walk};

/// How a reference name is structured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefFormat {
    /// PanSN-style `sample#hap#contig`.
    PanSn,
    /// An opaque name; the whole tag doubles as the sample name.
    Raw,
}

/// A named walk over the graph with per-step strand, plus the base-offset
/// table derived at freeze time.
#[derive(Debug, Clone)]
pub struct Reference {
    tag: String,
    format: RefFormat,
    sample_name: String,
    hap_id: Option<u32>,
    steps: Walk,
    /// Base offset of each step; one entry per step.
    offsets: Vec<u64>,
    /// Total number of bases covered by the walk.
    total_len: u64,
}

impl Reference {
    /// Builds a reference from its tag and steps; `step_lens` gives the
    /// sequence length of each step's vertex, in step order.
    pub(crate) fn new(tag: &str, steps: Walk, step_lens: &[u64]) -> Reference {
        let (format, sample_name, hap_id) = split_tag(tag);
        let mut offsets = Vec::with_capacity(steps.len());
        let mut at = 0u64;
        for len in step_lens {
            offsets.push(at);
            at += len;
        }
        Reference {
            tag: tag.to_string(),
            format,
            sample_name,
            hap_id,
            steps,
            offsets,
            total_len: at,
        }
    }

    /// The full name the reference was ingested under.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The detected name format.
    pub fn format(&self) -> RefFormat {
        self.format
    }

    /// The sample this reference belongs to (the whole tag for raw names).
    pub fn sample_name(&self) -> &str {
        &self.sample_name
    }

    /// The haplotype id, when the name carries one.
    pub fn hap_id(&self) -> Option<u32> {
        self.hap_id
    }

    /// Total length in bases.
    pub fn len(&self) -> u64 {
        self.total_len
    }

    /// Whether the walk has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps in the walk.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// The step at `idx`, if any.
    pub fn step(&self, idx: usize) -> Option<Step> {
        self.steps.get(idx).copied()
    }

    /// The whole walk.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Base offset at which step `idx` starts.
    pub fn step_offset(&self, idx: usize) -> Option<u64> {
        self.offsets.get(idx).copied()
    }
}

fn split_tag(tag: &str) -> (RefFormat, String, Option<u32>) {
    let parts: Vec<&str> = tag.split('#').collect();
    if parts.len() == 3 {
        let hap = parts[1].parse::<u32>().ok();
        (RefFormat::PanSn, parts[0].to_string(), hap)
    } else {
        (RefFormat::Raw, tag.to_string(), None)
    }
}

/// A half-open base interval `[start, end)` on a named reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenomicRegion {
    /// Tag of the reference the interval lives on.
    pub ref_name: String,
    /// First base included.
    pub start: u64,
    /// First base excluded.
    pub end: u64,
}

/// Parses `ref_name:start-end` into a region. Returns `None` on any
/// malformed piece; the caller decides whether absence is an error.
pub fn parse_genomic_region(text: &str) -> Option<GenomicRegion> {
    let (name, range) = text.rsplit_once(':')?;
    let (start, end) = range.split_once('-')?;
    if name.is_empty() {
        return None;
    }
    let start = start.parse::<u64>().ok()?;
    let end = end.parse::<u64>().ok()?;
    if end < start {
        return None;
    }
    Some(GenomicRegion {
        ref_name: name.to_string(),
        start,
        end,
    })
}
