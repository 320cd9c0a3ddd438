// SPDX-License-Identifier: MPL-2.0
#![warn(missing_docs)]
//! flubbles - hierarchical decomposition of pangenome variation graphs.
//!
//! Given a bidirected sequence graph with reference walks, the crate
//! builds a DFS spanning tree over the graph's ends, classifies its tree
//! edges into cycle-equivalence classes with a bracket-list pass, turns
//! the classes into a nested tree of regions of variation (the PVST), and
//! for each called region enumerates the allelic walks through it and
//! pairs them against the references to type the variation.

pub mod bidirected;
pub mod bracket_list;
pub mod cycle_equiv;
pub mod decompose;
pub mod error;
pub mod pvst;
pub mod refs;
pub mod spanning_tree;
pub mod types;
pub mod variation;

pub use bidirected::{VariationGraph, VgBuilder};
pub use decompose::{build_pvst, Decomposition};
pub use error::{Error, Result};
pub use variation::{call_variants, CallOpts};
