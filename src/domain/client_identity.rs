//! Trusted-proxy-aware client identification.
//!
//! Forwarded identity headers are honored only when the direct peer belongs to
//! a configured trusted network (the CDN/WAF in front of the service). Any other
//! peer could forge them to evade its own quota or to burn someone else's.

use axum::http::{HeaderMap, HeaderName};
use ipnetwork::IpNetwork;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use tracing::debug;

/// Identity used when no peer address is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Default single-hop header set by the CDN.
pub const DEFAULT_CDN_HEADER: &str = "cf-connecting-ip";

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Errors raised while parsing the trusted proxy list at startup.
#[derive(Debug, thiserror::Error)]
pub enum ProxyConfigError {
    #[error("invalid trusted proxy network '{value}': {reason}")]
    InvalidNetwork { value: String, reason: String },

    #[error("invalid client IP header name '{0}'")]
    InvalidHeaderName(String),
}

/// Allow-list of upstream proxy networks whose forwarded headers are trusted.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies {
    networks: Vec<IpNetwork>,
}

impl TrustedProxies {
    pub fn new(networks: Vec<IpNetwork>) -> Self {
        Self { networks }
    }

    /// Parses a comma-separated list of CIDR ranges or bare addresses.
    ///
    /// Bare addresses are treated as single-host networks. Empty entries are
    /// skipped, so an empty string yields an empty allow-list.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyConfigError::InvalidNetwork`] for the first entry that
    /// does not parse.
    pub fn parse_list(raw: &str) -> Result<Self, ProxyConfigError> {
        let networks = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                IpNetwork::from_str(s).map_err(|e| ProxyConfigError::InvalidNetwork {
                    value: s.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { networks })
    }

    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        self.networks.iter().any(|net| net.contains(ip))
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }
}

/// Where a resolved identity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    CdnHeader,
    ForwardedFor,
    Peer,
    Unknown,
}

impl IdentitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CdnHeader => "cdn_header",
            Self::ForwardedFor => "forwarded_for",
            Self::Peer => "peer",
            Self::Unknown => "unknown",
        }
    }
}

/// Resolved originating client of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub ip: Option<IpAddr>,
    /// `true` only when the identity came from a header relayed by a trusted proxy.
    pub trusted: bool,
    pub source: IdentitySource,
}

impl ClientIdentity {
    fn from_header(ip: IpAddr, source: IdentitySource) -> Self {
        Self {
            ip: Some(ip.to_canonical()),
            trusted: true,
            source,
        }
    }

    fn from_peer(peer: Option<IpAddr>) -> Self {
        match peer {
            Some(ip) => Self {
                ip: Some(ip),
                trusted: false,
                source: IdentitySource::Peer,
            },
            None => Self {
                ip: None,
                trusted: false,
                source: IdentitySource::Unknown,
            },
        }
    }

    /// Stable text used as the client part of a rate-limit key.
    pub fn as_key_part(&self) -> String {
        self.ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_key_part())
    }
}

/// Resolves [`ClientIdentity`] from the peer address and request headers.
#[derive(Debug, Clone)]
pub struct ClientIdentifier {
    proxies: TrustedProxies,
    cdn_header: HeaderName,
}

impl ClientIdentifier {
    pub fn new(proxies: TrustedProxies) -> Self {
        Self {
            proxies,
            cdn_header: HeaderName::from_static(DEFAULT_CDN_HEADER),
        }
    }

    /// Overrides the single-hop CDN header (e.g. `true-client-ip`).
    ///
    /// # Errors
    ///
    /// Returns [`ProxyConfigError::InvalidHeaderName`] if `name` is not a valid header name.
    pub fn with_cdn_header(mut self, name: &str) -> Result<Self, ProxyConfigError> {
        self.cdn_header = HeaderName::from_str(&name.to_ascii_lowercase())
            .map_err(|_| ProxyConfigError::InvalidHeaderName(name.to_string()))?;
        Ok(self)
    }

    pub fn proxies(&self) -> &TrustedProxies {
        &self.proxies
    }

    /// Resolves the client identity.
    ///
    /// # Precedence
    ///
    /// 1. CDN header, if the peer is a trusted proxy and the value is a valid IP
    /// 2. Left-most `X-Forwarded-For` entry, if the peer is trusted and it is a valid IP
    /// 3. The peer address itself (untrusted)
    ///
    /// Malformed values fall through to the next level; this never fails.
    pub fn resolve(&self, peer: Option<IpAddr>, headers: &HeaderMap) -> ClientIdentity {
        let peer = peer.map(|ip| ip.to_canonical());

        let Some(peer_ip) = peer.filter(|ip| self.proxies.contains(*ip)) else {
            return ClientIdentity::from_peer(peer);
        };

        if let Some(ip) = header_ip(headers, &self.cdn_header) {
            return ClientIdentity::from_header(ip, IdentitySource::CdnHeader);
        }

        if let Some(ip) = forwarded_for_ip(headers) {
            return ClientIdentity::from_header(ip, IdentitySource::ForwardedFor);
        }

        debug!(peer = %peer_ip, "Trusted proxy sent no usable client IP header");
        ClientIdentity::from_peer(peer)
    }
}

fn header_ip(headers: &HeaderMap, name: &HeaderName) -> Option<IpAddr> {
    let raw = headers.get(name)?.to_str().ok()?.trim();
    match raw.parse() {
        Ok(ip) => Some(ip),
        Err(_) => {
            debug!(header = %name, value = raw, "Ignoring unparseable client IP header");
            None
        }
    }
}

fn forwarded_for_ip(headers: &HeaderMap) -> Option<IpAddr> {
    let chain = headers.get(FORWARDED_FOR)?.to_str().ok()?;
    let first = chain.split(',').next()?.trim();
    match first.parse() {
        Ok(ip) => Some(ip),
        Err(_) => {
            debug!(value = first, "Ignoring unparseable X-Forwarded-For entry");
            None
        }
    }
}
