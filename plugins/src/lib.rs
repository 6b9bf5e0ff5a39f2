pub mod agents;
pub mod factory;
pub mod renderer;
pub mod runner;
