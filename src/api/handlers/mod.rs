pub mod matches;
pub mod system;

pub use matches::*;
pub use system::*;
