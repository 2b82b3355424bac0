//! VPN provider classification by AS number
//!
//! The VPN data file is newline-delimited. Each line that is neither blank
//! nor a `#` comment starts with an AS number, optionally `AS`-prefixed;
//! anything after the first whitespace is ignored:
//!
//! ```text
//! # provider list
//! AS9009   M247 Europe SRL
//! 212238   Datacamp Limited
//! ```

use crate::asn::asn_number;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Errors raised while reading the VPN data file
#[derive(Debug, thiserror::Error)]
pub enum VpnDataError {
    /// The data file does not exist
    #[error("VPN data file '{}' not found", path.display())]
    NotFound {
        /// Path that was tried
        path: PathBuf,
    },

    /// The data file exists but could not be read
    #[error("Error loading VPN data file '{}': {source}", path.display())]
    Io {
        /// Path that was tried
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },
}

/// Classification attached to a result row when VPN detection is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrafficType {
    /// The owning AS is a known VPN or proxy provider
    Vpn,
    /// The lookup succeeded and the AS is not a known VPN provider
    Normal,
    /// No classification possible because the lookup did not succeed
    NotAvailable,
}

impl TrafficType {
    /// Label used in exports and progress output
    pub fn as_str(&self) -> &'static str {
        match self {
            TrafficType::Vpn => "VPN",
            TrafficType::Normal => "Normal",
            TrafficType::NotAvailable => "N/A",
        }
    }
}

impl fmt::Display for TrafficType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of AS numbers (digits only) known to belong to VPN providers.
///
/// Loaded once before a run and only read afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VpnAsnSet {
    asns: HashSet<String>,
}

impl VpnAsnSet {
    /// Parse the contents of a VPN data file; malformed entries are skipped
    pub fn parse(contents: &str) -> Self {
        let asns = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_whitespace().next())
            .filter_map(asn_number)
            .map(str::to_string)
            .collect();
        Self { asns }
    }

    /// Load the set from a file
    pub fn load(path: &Path) -> Result<Self, VpnDataError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(Self::parse(&contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(VpnDataError::NotFound {
                path: path.to_path_buf(),
            }),
            Err(source) => Err(VpnDataError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Load the set from a file, degrading to an empty set on failure.
    ///
    /// An empty set turns VPN detection off for the run.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(set) => set,
            Err(e) => {
                log::warn!("{}", e);
                Self::default()
            }
        }
    }

    /// Number of distinct AS numbers in the set
    pub fn len(&self) -> usize {
        self.asns.len()
    }

    /// Whether the set holds no AS numbers
    pub fn is_empty(&self) -> bool {
        self.asns.is_empty()
    }

    /// Check membership for an ASN in any accepted form (`AS123`, `as123`, `123`)
    pub fn contains(&self, asn: &str) -> bool {
        asn_number(asn).is_some_and(|digits| self.asns.contains(digits))
    }

    /// Classify the ASN of a successful lookup.
    ///
    /// An ASN missing from the set (including `N/A`) is `Normal`; rows whose
    /// lookup failed are marked [`TrafficType::NotAvailable`] by the caller.
    pub fn classify(&self, asn: &str) -> TrafficType {
        if self.contains(asn) {
            TrafficType::Vpn
        } else {
            TrafficType::Normal
        }
    }
}

impl<S: Into<String>> FromIterator<S> for VpnAsnSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let asns = iter
            .into_iter()
            .filter_map(|asn| {
                let asn: String = asn.into();
                asn_number(&asn).map(str::to_string)
            })
            .collect();
        Self { asns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_skips_comments_and_malformed() {
        let set = VpnAsnSet::parse(
            "# VPN providers\n\
             AS9009 M247\n\
             \n\
             212238\tDatacamp\n\
             as60068 CDN77\n\
             ASfoo broken\n\
             not-a-number\n\
             # 1234 commented out\n",
        );
        assert_eq!(set.len(), 3);
        assert!(set.contains("AS9009"));
        assert!(set.contains("212238"));
        assert!(set.contains("AS60068"));
        assert!(!set.contains("1234"));
    }

    #[test]
    fn test_classify() {
        let set: VpnAsnSet = ["13335"].into_iter().collect();
        assert_eq!(set.classify("AS13335"), TrafficType::Vpn);
        assert_eq!(set.classify("as13335"), TrafficType::Vpn);
        assert_eq!(set.classify("13335"), TrafficType::Vpn);
        assert_eq!(set.classify("AS15169"), TrafficType::Normal);
        assert_eq!(set.classify("N/A"), TrafficType::Normal);
        assert_eq!(set.classify(""), TrafficType::Normal);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let set: VpnAsnSet = ["9009", "AS212238"].into_iter().collect();
        for _ in 0..3 {
            assert_eq!(set.classify("AS212238"), TrafficType::Vpn);
            assert_eq!(set.classify("AS3356"), TrafficType::Normal);
        }
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "AS9009 M247").unwrap();
        writeln!(file, "# comment").unwrap();
        writeln!(file, "16276 OVH").unwrap();

        let set = VpnAsnSet::load(file.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("AS16276"));
    }

    #[test]
    fn test_missing_file() {
        let path = Path::new("/nonexistent/vpn_hosts.txt");
        assert!(matches!(
            VpnAsnSet::load(path),
            Err(VpnDataError::NotFound { .. })
        ));
        assert!(VpnAsnSet::load_or_empty(path).is_empty());
    }

    #[test]
    fn test_traffic_type_labels() {
        assert_eq!(TrafficType::Vpn.to_string(), "VPN");
        assert_eq!(TrafficType::Normal.to_string(), "Normal");
        assert_eq!(TrafficType::NotAvailable.to_string(), "N/A");
    }
}
