// RptWatch - app/mod.rs
//
// Application layer: the watch source, the tail reader, and the monitor loop
// that ties them to the tracker and a sink.
// Dependencies: core layer, platform::fs.
// Must NOT depend on: ui.

pub mod monitor;
pub mod tail;
pub mod watch;
