//! Proptest strategies for generating valid test inputs.
//!
//! # Bounds
//!
//! To keep tests fast, the following bounds are enforced:
//! - Coordinates within `[-100, 100]`
//! - Square sizes within `[0.5, 20]`
//! - Text values drawn from a small alphabet so duplicates are common

use proptest::prelude::*;

use gisaudit_types::AttributeValue;

/// Lower bound for generated coordinates.
pub const MIN_COORD: f64 = -100.0;

/// Upper bound for generated coordinates.
pub const MAX_COORD: f64 = 100.0;

/// Strategy for attribute values of every variant, including unset ones.
pub fn arb_attribute_value() -> impl Strategy<Value = AttributeValue> {
    prop_oneof![
        Just(AttributeValue::Null),
        any::<bool>().prop_map(AttributeValue::Bool),
        (-50i64..50).prop_map(AttributeValue::Int),
        (-50.0f64..50.0).prop_map(AttributeValue::Float),
        "[a-c]{0,2}".prop_map(AttributeValue::Text),
    ]
}

/// Up to `max_len` short text values from a three-letter alphabet.
pub fn arb_text_values(max_len: usize) -> impl Strategy<Value = Vec<AttributeValue>> {
    prop::collection::vec("[a-c]{0,2}".prop_map(AttributeValue::Text), 0..=max_len)
}

/// An `(x, y, size)` square inside the coordinate bounds.
pub fn arb_square() -> impl Strategy<Value = (f64, f64, f64)> {
    (MIN_COORD..MAX_COORD, MIN_COORD..MAX_COORD, 0.5f64..20.0)
}

/// Up to `max_len` squares.
pub fn arb_squares(max_len: usize) -> impl Strategy<Value = Vec<(f64, f64, f64)>> {
    prop::collection::vec(arb_square(), 0..=max_len)
}
