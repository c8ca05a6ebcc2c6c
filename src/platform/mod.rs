// RptWatch - platform/mod.rs
//
// Platform abstraction layer: config directory and config.toml loading,
// shared-access file opening.
// Dependencies: util, directories crate; config validation also uses
// core::encoding and app::tail settings types.
// Must NOT depend on: ui.

pub mod config;
pub mod fs;
