pub use hopping::*;
pub use simulation::*;
pub use tracking::*;

pub mod decoherence;
pub mod forces;
pub mod hopping;
pub mod propagation;
pub mod rescaling;
pub mod simulation;
pub mod tracking;
mod utils;
