//! Deltasurge is a shared-memory parallel single-source shortest-paths
//! engine. It runs delta-stepping as a composable lock-free work-list
//! algorithm: an ordered-by-integer-metric scheduler (or its work-stealing
//! FIFO degenerate) feeds chunked batches of relaxation requests to worker
//! threads that improve per-vertex atomic distance cells with
//! compare-and-swap, optionally filtered through duplicate-suppression
//! work-sets. Ordering is approximate by design; correctness rests on the
//! monotone distance invariant and the empty-work filter.

// Enable warnings for all clippy lints. This automatically enables new lints
// shipped with new rust versions.
#![warn(
    clippy::correctness,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::pedantic,
    clippy::cargo,
    clippy::restriction
)]
// Now selectively disable unneeded lints.
#![allow(
    clippy::indexing_slicing,               // Allow `vec[i]` indexing.
    clippy::module_name_repetitions,        // Allow.
    clippy::use_debug,                      // Allow.
    clippy::float_arithmetic,               // Allow.
    clippy::integer_arithmetic,             // Allow.
    clippy::integer_division,               // Allow.
    clippy::implicit_return,                // Allow.
    clippy::too_many_arguments,             // Allow.
    clippy::use_self,                       // Allow.
    clippy::shadow_same,                    // Allow.
    clippy::shadow_reuse,                   // Allow.
    clippy::too_many_lines,                 // Allow.
    clippy::multiple_crate_versions,        // Disabled.
    clippy::missing_docs_in_private_items,  // Disabled.
    clippy::missing_errors_doc,             // Disabled.
    clippy::missing_panics_doc,             // Disabled.
    clippy::missing_inline_in_public_items, // Disabled.
    clippy::cognitive_complexity,           // Disabled.
    clippy::expect_used,                    // Should use `expect` rather than `unwrap`.
    clippy::panic,                          // Allow.
    clippy::unreachable,                    // Allow.
    clippy::must_use_candidate,             // Allow.
    clippy::inline_always,                  // Allow.
    clippy::as_conversions,                 // Allow but only when absolutely necessary.
    clippy::implicit_hasher,                // Default hasher is fine for now.
    clippy::blanket_clippy_restriction_lints,
    clippy::pattern_type_mismatch,
    clippy::unwrap_in_result,
    clippy::exhaustive_structs,
    clippy::exhaustive_enums,
    clippy::default_numeric_fallback,
    clippy::wildcard_enum_match_arm
)]
// Do not allow print statements. Use `log::info!()` or equivalent instead.
#![deny(clippy::print_stdout)]

pub mod config;
pub mod engine;
pub mod error;
pub mod graph;
pub mod stats;
pub mod util;
pub mod worklist;

use crate::config::{GraphFormat, RunConfig};
use crate::engine::SsspResult;
use crate::error::DeltaSurgeError;
use crate::util::io::{create_writer, write_bytes};
use derive_new::new;

#[derive(new)]
pub struct ExecuteOptions {
    pub graph_path: String,
    pub format: GraphFormat,
    pub run: RunConfig,
    pub save_bin: Option<String>,
    pub output: Option<String>,
}

/// Loads the input graph and runs the configured engine variant end to end.
pub fn execute(options: &ExecuteOptions) -> Result<SsspResult, DeltaSurgeError> {
    let graph = graph::loader::load_graph(&options.graph_path, options.format)?;
    if let Some(path) = &options.save_bin {
        graph::serde::save_cache(&graph, path)?;
    }
    let result = engine::run_sssp(&graph, &options.run)?;
    if let Some(path) = &options.output {
        let mut writer = create_writer(path)?;
        for (vertex, dist) in result.distances.iter().enumerate() {
            write_bytes(&mut writer, path, format!("{} {}\n", vertex, dist).as_bytes())?;
        }
    }
    Ok(result)
}
