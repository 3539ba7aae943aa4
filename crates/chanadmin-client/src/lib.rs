#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]
//! Client library for the channel admin API.
//!
//! Layout:
//! - `config`: base URL, timeout, token location and locale knobs
//! - `session`: token persistence, session events and the route guard
//! - `http`: bearer-authenticated JSON transport with 401 handling
//! - `services`: typed REST operations behind the `ChannelApi`/`SystemApi` seams
//! - `features::channels`: the channel list view-model, dialogs and cell presentation
//! - `i18n`, `toast`: dictionary lookup and transient notifications

pub mod config;
pub mod error;
pub mod features;
pub mod http;
pub mod i18n;
pub mod services;
pub mod session;
pub mod toast;

pub use config::ClientConfig;
pub use error::{ApiError, ApiResult};
pub use features::channels::board::{BoardError, ChannelBoard};
pub use http::ApiClient;
pub use services::{AdminApi, ChannelApi, SystemApi};
pub use session::SessionContext;
