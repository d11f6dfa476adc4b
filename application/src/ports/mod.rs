//! Ports (interfaces) for the application layer

pub mod solver_gateway;

pub use solver_gateway::{GatewayError, SolverGateway};
