//! Signed transport to the Elasticsearch domain.

pub mod client;
pub mod signing;

pub use client::{SearchClient, SearchError};
pub use signing::{RequestSigner, SigV4Signer};
