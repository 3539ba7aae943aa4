//! Channel list feature: cached per-channel state, pure helpers, dialogs,
//! cell presentation and the async [`board::ChannelBoard`] that drives them.

pub mod board;
pub mod dialogs;
pub mod logic;
pub mod state;
pub mod view;
