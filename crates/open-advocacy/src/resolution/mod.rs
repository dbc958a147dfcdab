//! Point → districts → officials.

pub mod districts;
pub mod representatives;

pub use districts::{DistrictResolver, ResolvedDistricts};
pub use representatives::{Representative, RepresentativeResolver};
