//! ASN lookup functionality using Team Cymru's whois service
//!
//! Team Cymru publishes its IP-to-ASN whois data over DNS. Two TXT queries
//! are made per address: the origin query returns the ASN, announced prefix,
//! country and registry, and a second query on the AS number returns the
//! registered organization name.

use crate::asn::record::asn_number;
use crate::asn::AsnRecord;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use ipnet::IpNet;
use std::fmt::Write as _;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use std::time::Duration;

/// Error type for ASN lookup operations
#[derive(Debug, thiserror::Error)]
pub enum AsnLookupError {
    /// DNS resolution failed
    #[error("DNS resolution failed: {0}")]
    DnsError(String),

    /// Invalid response format
    #[error("Invalid ASN response format")]
    InvalidFormat,

    /// No ASN data found
    #[error("No ASN data found")]
    NotFound,

    /// The address is never announced publicly (private, loopback, ...)
    #[error("{0} address has no public ASN")]
    SpecialUse(&'static str),
}

/// Origin data parsed from a `*.origin.asn.cymru.com` TXT record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginRecord {
    /// AS number, digits only
    pub asn: String,
    /// Announced prefix containing the queried address
    pub prefix: IpNet,
    /// Country code of the allocation
    pub country_code: String,
    /// Registry that made the allocation
    pub registry: String,
}

/// Build the origin TXT query name for an address.
///
/// IPv4 octets and IPv6 nibbles are written in reverse order, the same way
/// reverse DNS names are formed.
pub fn form_origin_query(ip: &IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            format!(
                "{}.{}.{}.{}.origin.asn.cymru.com",
                octets[3], octets[2], octets[1], octets[0]
            )
        }
        IpAddr::V6(v6) => {
            let mut query = String::with_capacity(72 + 22);
            for byte in v6.octets().iter().rev() {
                let _ = write!(query, "{:x}.{:x}.", byte & 0x0f, byte >> 4);
            }
            query.push_str("origin6.asn.cymru.com");
            query
        }
    }
}

/// Build the AS name TXT query for an AS number (with or without prefix)
pub fn form_name_query(asn: &str) -> Option<String> {
    asn_number(asn).map(|digits| format!("AS{digits}.asn.cymru.com"))
}

/// Parse an origin response such as
/// `15169 | 8.8.8.0/24 | US | arin | 2023-12-28`.
///
/// Multi-origin prefixes list several AS numbers in the first field; the
/// first one is used.
pub fn parse_origin_response(txt: &str) -> Result<OriginRecord, AsnLookupError> {
    let parts: Vec<&str> = txt.split('|').map(str::trim).collect();
    if parts.len() < 3 {
        return Err(AsnLookupError::InvalidFormat);
    }

    let asn = parts[0]
        .split_whitespace()
        .next()
        .and_then(asn_number)
        .ok_or(AsnLookupError::InvalidFormat)?
        .to_string();

    let prefix = parts[1]
        .parse::<IpNet>()
        .map_err(|_| AsnLookupError::InvalidFormat)?;

    let registry = parts.get(3).map(|s| s.to_string()).unwrap_or_default();

    Ok(OriginRecord {
        asn,
        prefix,
        country_code: parts[2].to_string(),
        registry,
    })
}

/// Parse an AS name response such as
/// `15169 | US | arin | 2000-03-30 | GOOGLE, US`.
pub fn parse_name_response(txt: &str) -> Option<String> {
    let parts: Vec<&str> = txt.split('|').map(str::trim).collect();
    parts
        .get(4)
        .filter(|name| !name.is_empty())
        .map(|name| name.to_string())
}

/// Describe addresses that are never announced on the public internet.
///
/// Returns `None` for globally routable addresses.
pub fn special_use_description(ip: &IpAddr) -> Option<&'static str> {
    match ip {
        IpAddr::V4(v4) => special_use_v4(v4),
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return special_use_v4(&mapped);
            }
            special_use_v6(v6)
        }
    }
}

fn special_use_v4(ip: &Ipv4Addr) -> Option<&'static str> {
    if ip.is_loopback() {
        Some("Loopback")
    } else if ip.is_private() {
        Some("Private Network")
    } else if is_cgnat(ip) {
        Some("Carrier Grade NAT")
    } else if ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_unspecified()
        || ip.is_multicast()
    {
        Some("Special Use")
    } else {
        None
    }
}

fn special_use_v6(ip: &Ipv6Addr) -> Option<&'static str> {
    let first = ip.segments()[0];
    if ip.is_loopback() {
        Some("Loopback")
    } else if (first & 0xfe00) == 0xfc00 {
        // fc00::/7 unique local
        Some("Private Network")
    } else if ip.is_unspecified()
        || ip.is_multicast()
        || (first & 0xffc0) == 0xfe80
        || (first == 0x2001 && ip.segments()[1] == 0x0db8)
    {
        // link-local fe80::/10, documentation 2001:db8::/32
        Some("Special Use")
    } else {
        None
    }
}

/// Checks if an IP is in the CGNAT range (100.64.0.0/10).
pub fn is_cgnat(ip: &Ipv4Addr) -> bool {
    let octets = ip.octets();
    octets[0] == 100 && (64..=127).contains(&octets[1])
}

/// Performs ASN lookup using Team Cymru's whois service.
///
/// Returns the announced prefix alongside the record so callers can cache
/// it for every address in the block. Special-use addresses fail with
/// [`AsnLookupError::SpecialUse`] without any DNS query.
pub async fn lookup_asn(
    ip: IpAddr,
    resolver: &TokioResolver,
) -> Result<(IpNet, AsnRecord), AsnLookupError> {
    if let Some(description) = special_use_description(&ip) {
        return Err(AsnLookupError::SpecialUse(description));
    }

    let origin_txt = txt_lookup(resolver, form_origin_query(&ip)).await?;
    let origin = parse_origin_response(&origin_txt)?;

    // The name query is best effort; an origin without a name is still useful.
    let name = match form_name_query(&origin.asn) {
        Some(query) => match txt_lookup(resolver, query).await {
            Ok(txt) => parse_name_response(&txt).unwrap_or_default(),
            Err(e) => {
                log::debug!("AS name lookup for AS{} failed: {}", origin.asn, e);
                String::new()
            }
        },
        None => String::new(),
    };

    let record = AsnRecord::new(
        &origin.asn,
        &name,
        &origin.country_code,
        &origin.prefix.to_string(),
        &origin.registry,
    );

    Ok((origin.prefix, record))
}

async fn txt_lookup(resolver: &TokioResolver, query: String) -> Result<String, AsnLookupError> {
    let lookup = resolver
        .txt_lookup(query)
        .await
        .map_err(|e| AsnLookupError::DnsError(e.to_string()))?;

    let record = lookup.iter().next().ok_or(AsnLookupError::NotFound)?;

    Ok(record
        .iter()
        .map(|data| String::from_utf8_lossy(data))
        .collect::<Vec<_>>()
        .join(""))
}

/// Create a default DNS resolver for ASN lookups
///
/// `timeout` overrides the resolver's per-query timeout when given.
pub fn create_default_resolver(timeout: Option<Duration>) -> Arc<TokioResolver> {
    let mut opts = ResolverOpts::default();
    if let Some(timeout) = timeout {
        opts.timeout = timeout;
    }
    Arc::new(
        TokioResolver::builder_with_config(
            ResolverConfig::cloudflare(),
            TokioConnectionProvider::default(),
        )
        .with_options(opts)
        .build(),
    )
}

#[cfg(test)]
#[path = "lookup_tests.rs"]
mod lookup_tests;
