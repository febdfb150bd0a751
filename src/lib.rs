pub mod config;
pub mod error;
pub mod forces;
pub mod render;
pub mod simulation;
pub mod world;

pub use config::SimulationParameters;
pub use error::{ConfigError, SimError};
pub use render::{FrameSink, PngSink};
pub use simulation::{SimState, Simulation, step};
pub use world::{Frame, InteractionMatrix, Particle, ParticleWorld};
