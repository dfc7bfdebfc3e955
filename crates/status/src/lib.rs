//! Server status resolution: upstream failover, response normalization,
//! MOTD decoding, caching with request throttling, icon caching and
//! background polling.

mod cache;
mod errors;
mod icon;
mod motd;
mod normalize;
mod poller;
mod router;
mod service;
mod upstream;

pub use cache::ResolveOutcome;
pub use errors::StatusError;
pub use motd::{decode_legacy, decode_tree, DecodedMotd, MotdNode};
pub use poller::StatusPoller;
pub use service::{StatusObserver, StatusService};
pub use upstream::{UpstreamClient, UpstreamFetch, UpstreamResponse};
