//! A barebones client for the music catalog's album endpoints.
#![deny(missing_docs)]

mod client;
pub use client::*;

mod album;
pub use album::*;

mod request;
