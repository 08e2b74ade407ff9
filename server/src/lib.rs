//! wxhook Server
//!
//! Webhook backend for a WeChat official account: verifies and answers
//! platform callbacks, and exposes list/create endpoints for todos, articles,
//! and uploaded assets backed by a hosted document store.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod resources;
pub mod store;
pub mod util;
pub mod wechat;
