//! Cloudflare firewall rule export
//!
//! Produces a single rule object in the shape accepted by the Cloudflare
//! firewall rules API:
//!
//! ```json
//! {
//!   "action": "block",
//!   "expression": "(ip.geoip.asnum in {13335 15169})",
//!   "description": "ASN-based firewall rule"
//! }
//! ```

use crate::asn::asn_number;
use crate::export::ExportError;
use crate::results::ResultRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Description attached to generated rules
pub const RULE_DESCRIPTION: &str = "ASN-based firewall rule";

/// What the rule does with matching traffic
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CloudflareAction {
    /// Block matching requests
    #[default]
    Block,
    /// Allow matching requests
    Allow,
}

impl CloudflareAction {
    /// Action name as used by the API
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudflareAction::Block => "block",
            CloudflareAction::Allow => "allow",
        }
    }
}

impl fmt::Display for CloudflareAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A firewall rule matching a set of AS numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudflareRule {
    /// Rule action
    pub action: CloudflareAction,
    /// Filter expression
    pub expression: String,
    /// Free-form description
    pub description: String,
    #[serde(skip)]
    asns: Vec<u32>,
}

impl CloudflareRule {
    /// Build a rule over `asns`; they are emitted in the given order
    pub fn new(action: CloudflareAction, asns: Vec<u32>) -> Self {
        let list = asns
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            action,
            expression: format!("(ip.geoip.asnum in {{{list}}})"),
            description: RULE_DESCRIPTION.to_string(),
            asns,
        }
    }

    /// AS numbers covered by the rule
    pub fn asns(&self) -> &[u32] {
        &self.asns
    }

    /// Number of AS numbers covered by the rule
    pub fn asn_count(&self) -> usize {
        self.asns.len()
    }
}

/// Distinct numeric AS numbers across `rows`, ascending.
///
/// `N/A` and anything that is not a number are skipped.
pub fn collect_asns(rows: &[ResultRow]) -> Vec<u32> {
    rows.iter()
        .filter_map(|row| asn_number(&row.asn))
        .filter_map(|digits| digits.parse::<u32>().ok())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Build the rule for `rows`; fails if no row carries a numeric ASN
pub fn build_rule(
    rows: &[ResultRow],
    action: CloudflareAction,
) -> Result<CloudflareRule, ExportError> {
    let asns = collect_asns(rows);
    if asns.is_empty() {
        return Err(ExportError::NoValidAsns);
    }
    Ok(CloudflareRule::new(action, asns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asn::AsnRecord;
    use crate::results::{build_rows, CompletedLookup, LookupOutcome};

    fn rows_for(asns: &[&str]) -> Vec<ResultRow> {
        let completed: Vec<CompletedLookup> = asns
            .iter()
            .enumerate()
            .map(|(i, asn)| CompletedLookup {
                ip: format!("192.0.2.{i}"),
                outcome: LookupOutcome::Valid {
                    record: AsnRecord::new(asn, "", "", "", ""),
                    traffic: None,
                },
            })
            .collect();
        build_rows(&completed, false, false)
    }

    #[test]
    fn test_collect_asns_sorted_numerically() {
        let rows = rows_for(&["AS9009", "13335", "as100", "AS13335", "N/A", "ASX1"]);
        assert_eq!(collect_asns(&rows), vec![100, 9009, 13335]);
    }

    #[test]
    fn test_build_rule() {
        let rows = rows_for(&["15169", "13335"]);
        let rule = build_rule(&rows, CloudflareAction::Allow).unwrap();

        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "action": "allow",
                "expression": "(ip.geoip.asnum in {13335 15169})",
                "description": "ASN-based firewall rule"
            })
        );
        assert_eq!(rule.asn_count(), 2);
    }

    #[test]
    fn test_no_valid_asns() {
        let mut rows = rows_for(&[]);
        rows.extend(build_rows(
            &[CompletedLookup {
                ip: "bad".to_string(),
                outcome: LookupOutcome::invalid(),
            }],
            false,
            false,
        ));
        assert!(matches!(
            build_rule(&rows, CloudflareAction::Block),
            Err(ExportError::NoValidAsns)
        ));
    }
}
