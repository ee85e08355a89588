//! unfacade core library — facade call matching, rewrite rules, and fixes.
//!
//! The main entry point is [`pipeline::analyze_project`], which runs every
//! enabled [`rules::Rule`] over each file of a [`unfacade_graphs::ProjectModel`]
//! and collects [`report::RewriteFailure`] records.

pub mod config;
pub mod edit;
pub mod error;
pub mod matcher;
pub mod pipeline;
pub mod report;
pub mod rules;

pub use unfacade_graphs;
