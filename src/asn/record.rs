//! ASN record returned by a successful lookup

use serde::{Deserialize, Serialize};

/// Placeholder used for every field that the registry did not provide
pub const NOT_AVAILABLE: &str = "N/A";

/// Canonicalize an AS number into `AS<digits>` form.
///
/// A bare number gains the `AS` prefix, an already prefixed value (`as999`,
/// `As1`) is upper-cased, and an empty or absent value becomes `N/A`.
/// Applying the function twice gives the same result as applying it once.
pub fn canonicalize_asn(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(NOT_AVAILABLE) {
        return NOT_AVAILABLE.to_string();
    }
    if has_as_prefix(trimmed) {
        trimmed.to_ascii_uppercase()
    } else {
        format!("AS{trimmed}")
    }
}

/// Strip an `AS` prefix (any case) and return the numeric part, if it is one
pub fn asn_number(asn: &str) -> Option<&str> {
    let trimmed = asn.trim();
    let digits = if has_as_prefix(trimmed) {
        &trimmed[2..]
    } else {
        trimmed
    };
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

fn has_as_prefix(value: &str) -> bool {
    value
        .get(..2)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("AS"))
}

fn or_not_available(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Registration data for the block that owns an IP address.
///
/// Fields are fixed at construction; empty inputs are stored as `N/A` and
/// the ASN is kept in canonical `AS<digits>` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsnRecord {
    asn: String,
    as_name: String,
    country_code: String,
    ip_block: String,
    registry: String,
}

impl AsnRecord {
    /// Build a record, canonicalizing the ASN and filling blanks with `N/A`
    pub fn new(
        asn: &str,
        as_name: &str,
        country_code: &str,
        ip_block: &str,
        registry: &str,
    ) -> Self {
        Self {
            asn: canonicalize_asn(asn),
            as_name: or_not_available(as_name),
            country_code: or_not_available(country_code),
            ip_block: or_not_available(ip_block),
            registry: or_not_available(registry),
        }
    }

    /// Canonical ASN (`AS<digits>` or `N/A`)
    pub fn asn(&self) -> &str {
        &self.asn
    }

    /// Organization name registered for the AS
    pub fn as_name(&self) -> &str {
        &self.as_name
    }

    /// Two-letter country code of the AS registration
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Announced prefix containing the address, in CIDR notation
    pub fn ip_block(&self) -> &str {
        &self.ip_block
    }

    /// Regional Internet Registry holding the registration
    pub fn registry(&self) -> &str {
        &self.registry
    }
}
