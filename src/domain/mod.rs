//! Domain layer: rate limiting concepts independent of HTTP and storage.
//!
//! # Modules
//!
//! - [`client_identity`] - Trusted-proxy-aware client identification
//! - [`policy`] - Per-scope rate limit policies
//! - [`key`] - Rate limit keys and bucket keys
//! - [`decision`] - Pure admission decision
//! - [`store`] - Counter store contract implemented by the infrastructure layer
//! - [`clock`] - Time source
//!
//! # Request Flow
//!
//! 1. [`client_identity::ClientIdentifier`] resolves who is calling
//! 2. [`policy::PolicyTable`] resolves the `(limit, window)` for the route scope
//! 3. The sliding window counter (see [`crate::application::services`]) increments
//!    the bucket in the shared [`store::CounterStore`]
//! 4. [`decision::decide`] turns the estimate into allow/deny

pub mod client_identity;
pub mod clock;
pub mod decision;
pub mod key;
pub mod policy;
pub mod store;
