// RptWatch - core/mod.rs
//
// Core logic: data model, startup scan, active-file state machine, entry
// splitting and classification, text decoding, and the sink boundary.
// Must NOT depend on: ui, platform, app.

pub mod discovery;
pub mod encoding;
pub mod model;
pub mod sink;
pub mod splitter;
pub mod tracker;
