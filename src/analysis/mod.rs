pub mod confidence;
pub mod cross_location;
pub mod cycle;
pub mod pattern;
pub mod seasonality;
pub mod trend;

pub use cross_location::CrossLocationService;
pub use pattern::PatternEngine;
