// RptWatch - ui/mod.rs
//
// Output layer: sinks that render classified entries.
// Dependencies: core (model, sink trait).

pub mod console;
pub mod json;
pub mod theme;
