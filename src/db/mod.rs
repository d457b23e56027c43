pub mod orders;
pub mod patterns;
pub mod prices;
pub mod spend;

pub use orders::OrderHistoryRepo;
pub use patterns::PatternRepo;
pub use prices::PriceSnapshotRepo;
pub use spend::SpendAggregateRepo;
