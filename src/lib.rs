//! tidyfeed: delete your old posts and favourites through the Mastodon API.
//!
//! One purge run is a single filtering pass over a paginated remote listing
//! followed by conditional delete calls. Retention rules (age, popularity,
//! self-interaction) decide what survives; a dry-run mode previews the
//! outcome without touching the server.
//!
//! The pieces:
//! - [`models`]: read-only views over the remote items
//! - [`filter`]: the retention predicates, evaluated per item in fixed order
//! - [`source`]: the paginated listing and delete operations, with the
//!   rate-limit wait and retry policy
//! - [`executor`]: the single pass that ties them together and reports counts
//! - [`credentials`]: environment-or-file credential loading

pub mod credentials;
pub mod executor;
pub mod filter;
pub mod models;
pub mod source;

#[cfg(test)]
mod tests;
