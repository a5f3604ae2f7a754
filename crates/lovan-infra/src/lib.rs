//! Infrastructure layer for Lovan.
//!
//! Contains implementations of the ports defined in `lovan-core`: the
//! reqwest-backed [`http::HttpBackend`] and the file-backed
//! [`credential::file::FileCredentialStore`], plus configuration loading and
//! data directory resolution.

pub mod config;
pub mod credential;
pub mod filesystem;
pub mod http;
