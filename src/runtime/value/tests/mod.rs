//! Tests for the payload value type

mod conversions;
