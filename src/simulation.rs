use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, info};
use nalgebra::Vector2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::SimulationParameters;
use crate::error::SimError;
use crate::forces::accumulate_forces;
use crate::render::FrameSink;
use crate::world::{Frame, ParticleWorld};

/// Advance `world` by one tick.
///
/// Forces for every particle are computed from the positions as they were
/// before this call; only then are velocities and positions written.
pub fn step(world: &mut ParticleWorld, params: &SimulationParameters) {
    // Gather every force first, then apply
    let forces = accumulate_forces(world, params);
    integrate(world, &forces, params);
    world.advance_tick();
}

/// Applies friction and the force impulse to each velocity, then moves and
/// wraps each position.
pub fn integrate(world: &mut ParticleWorld, forces: &[Vector2<f64>], params: &SimulationParameters) {
    let (width, height) = (world.width(), world.height());
    let dt = params.dt;
    for (particle, force) in world.particles.iter_mut().zip(forces) {
        particle.velocity *= params.friction_factor;
        particle.velocity += force * dt;

        let next = particle.position + particle.velocity * dt;
        particle.position = Vector2::new(wrap(next.x, width), wrap(next.y, height));
    }
}

/// Folds `value` into `[0, extent)`.
pub fn wrap(value: f64, extent: f64) -> f64 {
    let wrapped = value.rem_euclid(extent);
    // rem_euclid can round up to exactly `extent` for tiny negative inputs,
    // and a velocity that has overflowed to infinity leaves NaN here
    if !wrapped.is_finite() || wrapped >= extent {
        0.0
    } else {
        wrapped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Idle,
    Running,
    Stopped,
}

impl SimState {
    fn name(self) -> &'static str {
        match self {
            SimState::Idle => "idle",
            SimState::Running => "running",
            SimState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Drives a run: owns the parameters and, while running, the world.
pub struct Simulation {
    params: SimulationParameters,
    seed: u64,
    starts: u64,
    state: SimState,
    world: Option<ParticleWorld>,
}

impl Simulation {
    /// Validates `params` up front so an invalid run never reaches the tick
    /// loop. Without an explicit seed one is drawn from the OS.
    pub fn new(params: SimulationParameters) -> Result<Self, SimError> {
        params.validate()?;
        let seed = params.seed.unwrap_or_else(rand::random);
        Ok(Simulation {
            params,
            seed,
            starts: 0,
            state: SimState::Idle,
            world: None,
        })
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn world(&self) -> Option<&ParticleWorld> {
        self.world.as_ref()
    }

    /// Builds a fresh random world and enters `Running`. Each start gets its
    /// own randomness derived from the base seed.
    pub fn start(&mut self) -> Result<(), SimError> {
        if self.state == SimState::Running {
            return Err(self.invalid("start"));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(self.starts));
        self.starts += 1;
        self.world = Some(ParticleWorld::random(&self.params, &mut rng));
        self.state = SimState::Running;
        info!(
            "started run {} with {} particles of {} types (seed {})",
            self.starts, self.params.num_particles, self.params.num_types, self.seed
        );
        Ok(())
    }

    /// Executes one tick and returns the resulting frame.
    pub fn tick(&mut self) -> Result<Frame<'_>, SimError> {
        let state = self.state;
        match (state, self.world.as_mut()) {
            (SimState::Running, Some(world)) => {
                step(world, &self.params);
                Ok(world.frame())
            }
            _ => Err(SimError::InvalidState {
                action: "tick",
                state: state.name(),
            }),
        }
    }

    /// Ends the run and discards the world.
    pub fn stop(&mut self) {
        if let Some(world) = self.world.take() {
            debug!("stopped after {} ticks", world.tick());
        }
        self.state = SimState::Stopped;
    }

    /// Starts a run and ticks until `stop_flag` is set, presenting each frame
    /// to `sink`. The flag is checked once per tick, after the frame has been
    /// presented. Returns the number of ticks executed.
    ///
    /// A sink failure ends the run; the world it saw was a completed tick.
    pub fn run<S: FrameSink + ?Sized>(
        &mut self,
        stop_flag: &AtomicBool,
        sink: &mut S,
    ) -> Result<u64, SimError> {
        self.start()?;
        let mut ticks = 0;
        let outcome = loop {
            let frame = match self.tick() {
                Ok(frame) => frame,
                Err(err) => break Err(err),
            };
            ticks += 1;
            if let Err(err) = sink.present(&frame) {
                break Err(err);
            }
            if stop_flag.load(Ordering::Relaxed) {
                break Ok(ticks);
            }
        };
        sink.close();
        self.stop();
        outcome
    }

    fn invalid(&self, action: &'static str) -> SimError {
        SimError::InvalidState {
            action,
            state: self.state.name(),
        }
    }
}
