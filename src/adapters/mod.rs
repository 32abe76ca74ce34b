pub mod bus;
pub mod postgres;
pub mod reference;
pub mod sofascore;

pub use bus::{LocalBus, MatchPublisher};
pub use postgres::PostgresStore;
pub use reference::ReferenceSource;
pub use sofascore::SofascoreClient;
