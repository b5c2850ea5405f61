/// Tracing setup and simulator constructors.
pub mod harness;

/// Mock implementations of the simulator's extension traits.
pub mod mocks;
