//! Response compression.

use tower_http::compression::predicate::{And, SizeAbove};
use tower_http::compression::{CompressionLayer, DefaultPredicate, Predicate};

/// Responses smaller than this are sent uncompressed.
pub const MIN_COMPRESS_SIZE: u16 = 500;

/// Gzip compression for responses of at least [`MIN_COMPRESS_SIZE`] bytes,
/// applied only when the client sends a matching `Accept-Encoding`.
pub fn layer() -> CompressionLayer<And<DefaultPredicate, SizeAbove>> {
    CompressionLayer::new()
        .gzip(true)
        .compress_when(DefaultPredicate::new().and(SizeAbove::new(MIN_COMPRESS_SIZE)))
}
