//! Status distribution over an explicit entity scope.

pub mod aggregator;
pub mod distribution;
pub mod scope;

pub use aggregator::{AggregationError, EntityPosition, StatusAggregator};
pub use distribution::StatusDistribution;
pub use scope::{EntityScope, ScopeError, ScopeSelector};
