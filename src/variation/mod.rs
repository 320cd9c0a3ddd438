// SPDX-License-Identifier: MPL-2.0
//! Turning the PVST into calls: RoV generation, walk enumeration and
//! overlay, plus the driver that runs all three. Regions are independent
//! once the PVST is frozen, so the driver resolves them in parallel.

pub mod overlay;
pub mod rov;
pub mod walks;

use std::env;
use std::str::FromStr;

use rayon::prelude::*;

use crate::bidirected::VariationGraph;
use crate::decompose::build_pvst;
use crate::error::{Error, Result};

pub use overlay::{
    classify_pair, covariant, extend_left, extend_right, AlleleSlice, PairwiseVariants,
    RawVariant, VarType,
};
pub use rov::{call_set, generate_rovs, CallOpts, RoV};
pub use walks::{enumerate_walks, MAX_FLUBBLE_STEPS};

/// Runs the full pipeline over a frozen graph: decomposition, RoV
/// election, walk enumeration and overlay. RoVs come back in PVST
/// pre-order, resolved; a region whose enumeration exhausts the step
/// bound is marked unresolved and skipped, everything else propagates.
pub fn call_variants(g: &VariationGraph, opts: &CallOpts) -> Result<Vec<RoV>> {
    let dec = build_pvst(g)?;
    let mut rovs = generate_rovs(g, &dec, opts)?;

    build_pool(rovs.len());
    rovs.par_iter_mut()
        .map(|rov| resolve_rov(g, rov, opts.max_steps))
        .collect::<Result<()>>()?;
    Ok(rovs)
}

/// Sizes rayon's global pool before the regions are resolved in parallel:
/// one thread per physical CPU, but never more threads than regions,
/// unless the environment variable `RAYON_NUM_THREADS` is set to a
/// positive integer. The pool is built once; later calls are no-ops.
fn build_pool(rov_count: usize) {
    let num_threads = match env::var("RAYON_NUM_THREADS")
        .ok()
        .and_then(|s| usize::from_str(&s).ok())
    {
        Some(x @ 1..) => x,
        _ => num_cpus::get_physical().min(rov_count.max(1)),
    };

    let _ = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global();
}

/// Enumerates and overlays one region in place. The enumeration bound is
/// the only locally recovered error: the region is flagged unresolved and
/// the pipeline moves on. Anything else propagates.
pub fn resolve_rov(g: &VariationGraph, rov: &mut RoV, max_steps: usize) -> Result<()> {
    match enumerate_walks(g, rov.route.start, rov.route.end, max_steps) {
        Ok(walks) => {
            rov.walks = walks;
            overlay::overlay_rov(g, rov);
            Ok(())
        }
        Err(Error::EnumerationBound { max_steps }) => {
            tracing::warn!(
                pvst_idx = rov.pvst_idx,
                max_steps,
                "region unresolved: no walk within the step bound"
            );
            rov.unresolved = true;
            Ok(())
        }
        Err(e) => Err(e),
    }
}
