//! Gitea Actions client
//!
//! - `config` - host and token resolution from the process environment
//! - `client` - reqwest-backed implementation of `ActionsApi`

mod client;
mod config;

pub use client::GiteaClient;
pub use config::{
    GiteaConfig,
    DEFAULT_HOST,
    HOST_ENV,
    TOKEN_ENV,
};
