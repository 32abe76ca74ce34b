pub mod entities;
pub mod score;

pub use entities::*;
pub use score::*;
