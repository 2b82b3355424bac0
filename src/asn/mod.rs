//! ASN (Autonomous System Number) lookup functionality

pub mod cache;
pub mod lookup;
pub mod record;
pub mod service;

pub use cache::AsnCache;
pub use lookup::AsnLookupError;
pub use record::{asn_number, canonicalize_asn, AsnRecord, NOT_AVAILABLE};
pub use service::{AsnLookup, LookupClient};
