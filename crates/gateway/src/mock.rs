pub mod gateway;
pub mod in_memory;

pub use gateway::MockGateway;
pub use in_memory::{GatewayHold, GatewayOp, InMemoryGateway};
