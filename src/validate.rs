//! Syntactic validation of IP address strings

use std::net::IpAddr;

/// Parse a candidate address, ignoring surrounding whitespace.
///
/// Only literal IPv4 and IPv6 addresses are accepted; hostnames, CIDR
/// blocks and empty strings yield `None`.
pub fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}

/// Check whether a string is a valid IPv4 or IPv6 literal
pub fn is_valid_ip(raw: &str) -> bool {
    parse_ip(raw).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ip_literals() {
        assert!(is_valid_ip("8.8.8.8"));
        assert!(is_valid_ip("  1.1.1.1\t"));
        assert!(is_valid_ip("2001:4860:4860::8888"));
        assert!(is_valid_ip("::1"));
        assert!(is_valid_ip("::ffff:192.0.2.1"));
    }

    #[test]
    fn test_rejects_everything_else() {
        for raw in [
            "",
            "   ",
            "not-an-ip",
            "example.com",
            "10.0.0.0/8",
            "256.1.1.1",
            "1.2.3",
            "1.2.3.4.5",
            "2001:db8::/32",
            "gggg::1",
        ] {
            assert!(!is_valid_ip(raw), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_ip_trims() {
        let ip = parse_ip(" 9.9.9.9 ").unwrap();
        assert_eq!(ip.to_string(), "9.9.9.9");
    }
}
