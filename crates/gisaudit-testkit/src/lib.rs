//! Shared test utilities for the gisaudit workspace.
//!
//! This crate provides:
//! - **arb**: Proptest strategies for attribute values and axis-aligned squares
//! - **fixtures**: Geometry helpers, sample layers and registries
//! - **schema**: JSON schema validation for reports and config files
//!
//! # Example
//!
//! ```rust,ignore
//! use gisaudit_testkit::{arb, fixtures};
//! use proptest::prelude::*;
//!
//! proptest! {
//!     fn squares_are_indexed(squares in arb::arb_squares(10)) {
//!         let layer = fixtures::polygon_layer("zones", &squares);
//!         // ...
//!     }
//! }
//! ```

pub mod arb;
pub mod fixtures;
pub mod schema;

pub use arb::{arb_attribute_value, arb_square, arb_squares, arb_text_values};
pub use fixtures::{polygon_layer, sample_registry, square, value_layer};
pub use schema::{validate_audit_report, validate_config_file};
