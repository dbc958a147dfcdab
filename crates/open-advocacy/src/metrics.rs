//! Counters for data-integrity faults and lookup failures.
//!
//! Recorded through the `metrics` facade; the API service installs the Prometheus recorder
//! and exposes the values at `/metrics`.

use metrics::{counter, describe_counter};

/// Stored boundaries skipped at query time because they failed structural checks.
pub const INVALID_GEOMETRY: &str = "district_invalid_geometry_total";

/// Points that matched more than one district of the same jurisdiction.
pub const AMBIGUOUS_OVERLAP: &str = "district_ambiguous_overlap_total";

/// Address lookups that ended in a geocoding failure, labelled by reason.
pub const GEOCODE_FAILURES: &str = "geocode_failures_total";

/// Registers metric descriptions. Call once after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        INVALID_GEOMETRY,
        "District boundaries excluded from resolution due to invalid stored geometry"
    );
    describe_counter!(
        AMBIGUOUS_OVERLAP,
        "Resolutions where overlapping districts of one jurisdiction matched the same point"
    );
    describe_counter!(GEOCODE_FAILURES, "Address lookups that failed to geocode");
}

pub fn record_invalid_geometry(district: &str) {
    counter!(INVALID_GEOMETRY, "district" => district.to_string()).increment(1);
}

pub fn record_ambiguous_overlap(jurisdiction: &str) {
    counter!(AMBIGUOUS_OVERLAP, "jurisdiction" => jurisdiction.to_string()).increment(1);
}

pub fn record_geocode_failure(reason: &'static str) {
    counter!(GEOCODE_FAILURES, "reason" => reason).increment(1);
}
