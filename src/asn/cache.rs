//! ASN lookup caching functionality

use crate::asn::AsnRecord;
use ipnet::IpNet;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

/// Thread-safe cache for ASN lookups by CIDR prefix
#[derive(Debug, Clone)]
pub struct AsnCache {
    cache: Arc<Mutex<HashMap<IpNet, AsnRecord>>>,
}

impl AsnCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self {
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Look up an IP address in the cache.
    ///
    /// When several cached prefixes contain the address the most specific
    /// one wins.
    pub fn get(&self, ip: &IpAddr) -> Option<AsnRecord> {
        let cache = self.cache.lock().expect("mutex poisoned");
        cache
            .iter()
            .filter(|(prefix, _)| prefix.contains(ip))
            .max_by_key(|(prefix, _)| prefix.prefix_len())
            .map(|(_, record)| record.clone())
    }

    /// Insert a record for the prefix that owns it
    pub fn insert(&self, prefix: IpNet, record: AsnRecord) {
        let mut cache = self.cache.lock().expect("mutex poisoned");
        cache.insert(prefix, record);
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        let cache = self.cache.lock().expect("mutex poisoned");
        cache.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        let cache = self.cache.lock().expect("mutex poisoned");
        cache.is_empty()
    }

    /// Clear all entries from the cache
    pub fn clear(&self) {
        let mut cache = self.cache.lock().expect("mutex poisoned");
        cache.clear();
    }
}

impl Default for AsnCache {
    fn default() -> Self {
        Self::new()
    }
}
