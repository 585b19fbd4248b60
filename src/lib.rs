pub mod constants;
pub mod coordination;
pub mod defaults;
pub mod dynamics;
pub mod error;
pub mod hamiltonian;
pub mod initialization;
pub mod interface;
pub mod output;
pub mod representation;

pub use crate::dynamics::{HopOutcome, StepReport};
pub use crate::error::DynamicsError;
pub use crate::initialization::{DynamicConfiguration, ReplicaData, Simulation};
pub use crate::interface::{ElectronicStructure, ProviderOutput};
