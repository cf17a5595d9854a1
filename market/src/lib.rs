pub mod random;
pub mod source;
pub mod types;

pub use source::{MarketDataSource, SimulatedMarket};
pub use types::MarketSnapshot;
