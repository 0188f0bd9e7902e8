pub mod coordinator;
pub mod sender;
pub mod state;

pub use coordinator::{SosAction, SosCoordinator, StartError};
pub use sender::{SimulatedSender, SosSender};
pub use state::CoordinatorState;
