//! Feature slices.

pub mod channels;
