//! X/Twitter posting and media fetch for the publish pipeline.
//!
//! [`TwitterClient`] implements [`herald_publish::Poster`] against the v2
//! tweets endpoint; [`HttpMediaFetcher`] implements
//! [`herald_publish::MediaFetcher`] for remote and local media.

pub mod client;
pub mod error;
pub mod media;
pub mod types;

pub use {
    client::TwitterClient,
    error::{Error, Result},
    media::{HttpMediaFetcher, MAX_MEDIA_BYTES},
};
