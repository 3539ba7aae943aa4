//! Command handlers grouped by concern.

pub(crate) mod channels;
pub(crate) mod days;
pub(crate) mod session;
pub(crate) mod system;
pub(crate) mod webhook;
