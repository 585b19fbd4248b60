pub use builder::*;
pub use cavity::*;

pub mod builder;
pub mod cavity;
