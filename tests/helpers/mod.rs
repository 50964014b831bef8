//! Test helpers module
//!
//! This module provides event fixtures, controllable event sources and a mock
//! HTTP event backend for the integration tests.

#![allow(dead_code)]

pub mod event_server;
pub mod gated_source;
pub mod test_data;

pub use event_server::*;
pub use gated_source::*;
pub use test_data::*;
