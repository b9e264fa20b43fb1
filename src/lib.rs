// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]
// GPU / graphics allowances — casts between index widths are intentional
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
// Float comparison: graphics math frequently compares against 0.0, 1.0, etc.
#![allow(clippy::float_cmp)]
// Multiple crate versions: transitive deps — not actionable
#![allow(clippy::multiple_crate_versions)]

//! Resource and draw-list core for a real-time 3D renderer.
//!
//! Keel is the layer between raw GPU objects (buffers, textures, pipelines)
//! and the higher-level scene (models, materials, lights, viewports). It
//! hands out generation-checked handles to GPU-backed resources, maintains
//! shader-visible index arrays whose membership changes every frame, tracks
//! per-material resolved shader inputs, and builds a frustum-culled,
//! shader-bucketed draw list per viewport each frame.
//!
//! # Key entry points
//!
//! - [`renderer::RendererCore`] - the owning context for all resource state
//! - [`gpu::RenderBackend`] - the device contract the core drives
//! - [`arena::Arena`] - the generational handle arena everything builds on
//! - [`options::RenderOptions`] - runtime configuration with TOML presets
//!
//! # Architecture
//!
//! The core is single-threaded and frame-synchronous: all mutation happens
//! on the render thread between frame boundaries. Consumers call mutation
//! APIs as game logic changes state, then once per frame
//! `prepare_draw_data()` (resolves dirty materials and lights, rebuilds
//! draw lists, flushes staging buffers), `render()` (walks the prebuilt
//! per-viewport shader buckets and emits draws through a
//! [`gpu::CommandRecorder`]), and `end_frame()`. Device buffers and
//! textures are never destroyed while in flight; teardown goes through a
//! fence-keyed retire queue.

pub mod arena;
pub mod error;
pub mod gpu;
pub mod options;
pub mod renderer;
pub mod scene;
pub mod view;
