//! Call-graph board layout.
//!
//! DESIGN
//! ======
//! A `digraph` edge list is parsed into a [`graph::Graph`], partitioned into
//! ordered groups by first-match [`classify::GroupRule`]s, and packed onto a
//! fixed grid by [`layout::layout`]. The resulting [`plan::Plan`] is pure data.
//! Publishing it is a separate two-stage step ([`render::publish`]): frames
//! and notes first, then connectors resolved from the placed notes.
//!
//! Everything up to the plan is synchronous and does no I/O. The canvas
//! client, rate limiter and palette sit behind explicit seams so the
//! collaborators can be swapped without touching the layout code.

pub mod canvas;
pub mod classify;
pub mod config;
pub mod connect;
pub mod error;
pub mod graph;
pub mod layout;
pub mod palette;
pub mod plan;
pub mod rate_limit;
pub mod render;
pub mod source;

pub use error::ErrorCode;
pub use plan::{Plan, PlanError, build_plan};
pub use render::{PublishError, PublishReport, publish};
