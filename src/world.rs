use nalgebra::Vector2;
use rand::prelude::*;

use crate::config::SimulationParameters;

/// Keep freshly spawned particles this far away from the edges when the world
/// is large enough to allow it.
const SPAWN_MARGIN: f64 = 5.0;
const MAX_INITIAL_SPEED: f64 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    type_id: usize,
    pub position: Vector2<f64>,
    pub velocity: Vector2<f64>,
}

impl Particle {
    pub fn new(type_id: usize, position: Vector2<f64>, velocity: Vector2<f64>) -> Self {
        Particle {
            type_id,
            position,
            velocity,
        }
    }

    pub fn type_id(&self) -> usize {
        self.type_id
    }
}

/// Directed force coefficients between particle types.
///
/// `get(a, b)` is how strongly a particle of type `a` reacts to one of type
/// `b`. The matrix is generally not symmetric.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionMatrix {
    num_types: usize,
    coefficients: Vec<f64>,
}

impl InteractionMatrix {
    /// Every entry drawn uniformly from [-1, 1).
    pub fn random<R: Rng>(num_types: usize, rng: &mut R) -> Self {
        Self::from_fn(num_types, |_, _| rng.random_range(-1.0..1.0))
    }

    pub fn from_fn(num_types: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut coefficients = Vec::with_capacity(num_types * num_types);
        for a in 0..num_types {
            for b in 0..num_types {
                coefficients.push(f(a, b));
            }
        }
        InteractionMatrix {
            num_types,
            coefficients,
        }
    }

    /// Builds a matrix from square rows. Returns `None` if the rows are ragged.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let num_types = rows.len();
        if rows.iter().any(|row| row.len() != num_types) {
            return None;
        }
        Some(InteractionMatrix {
            num_types,
            coefficients: rows.concat(),
        })
    }

    pub fn num_types(&self) -> usize {
        self.num_types
    }

    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.coefficients[from * self.num_types + to]
    }
}

/// All mutable state of a run: the particles plus the fixed matrix and bounds.
#[derive(Debug, Clone)]
pub struct ParticleWorld {
    pub(crate) particles: Vec<Particle>,
    matrix: InteractionMatrix,
    width: f64,
    height: f64,
    tick: u64,
}

impl ParticleWorld {
    /// Spawns `params.num_particles` particles with random types, positions
    /// and velocities, and a fresh random interaction matrix.
    pub fn random<R: Rng>(params: &SimulationParameters, rng: &mut R) -> Self {
        let matrix = InteractionMatrix::random(params.num_types, rng);
        let particles: Vec<Particle> = (0..params.num_particles)
            .map(|_| {
                let type_id = rng.random_range(0..params.num_types);
                let position = Vector2::new(
                    spawn_coordinate(params.width, rng),
                    spawn_coordinate(params.height, rng),
                );
                let velocity = Vector2::new(
                    rng.random_range(0.0..MAX_INITIAL_SPEED),
                    rng.random_range(0.0..MAX_INITIAL_SPEED),
                );
                Particle::new(type_id, position, velocity)
            })
            .collect();
        ParticleWorld::from_parts(particles, matrix, params.width, params.height)
    }

    /// Assembles a world from explicit state. Particle types must index into
    /// `matrix` and positions must already be inside the bounds.
    pub fn from_parts(
        particles: Vec<Particle>,
        matrix: InteractionMatrix,
        width: f64,
        height: f64,
    ) -> Self {
        debug_assert!(particles.iter().all(|p| p.type_id < matrix.num_types()));
        ParticleWorld {
            particles,
            matrix,
            width,
            height,
            tick: 0,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn matrix(&self) -> &InteractionMatrix {
        &self.matrix
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Number of ticks applied since the world was created.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick += 1;
    }

    pub fn frame(&self) -> Frame<'_> {
        Frame {
            width: self.width,
            height: self.height,
            tick: self.tick,
            num_types: self.matrix.num_types(),
            particles: &self.particles,
        }
    }
}

fn spawn_coordinate<R: Rng>(extent: f64, rng: &mut R) -> f64 {
    if extent > 2.0 * SPAWN_MARGIN {
        rng.random_range(SPAWN_MARGIN..extent - SPAWN_MARGIN)
    } else {
        rng.random_range(0.0..extent)
    }
}

/// Read-only view of the world handed to renderers after each tick.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub width: f64,
    pub height: f64,
    pub tick: u64,
    pub num_types: usize,
    particles: &'a [Particle],
}

impl<'a> Frame<'a> {
    /// `(x, y, type_id)` for every particle, in a stable order.
    pub fn points(self) -> impl Iterator<Item = (f64, f64, usize)> + 'a {
        self.particles
            .iter()
            .map(|p| (p.position.x, p.position.y, p.type_id))
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn random_world_respects_parameters() {
        let params = SimulationParameters {
            num_particles: 300,
            num_types: 4,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let world = ParticleWorld::random(&params, &mut rng);

        assert_eq!(world.particles().len(), 300);
        assert_eq!(world.matrix().num_types(), 4);
        for p in world.particles() {
            assert!(p.type_id() < 4);
            assert!(p.position.x >= SPAWN_MARGIN && p.position.x < params.width - SPAWN_MARGIN);
            assert!(p.position.y >= SPAWN_MARGIN && p.position.y < params.height - SPAWN_MARGIN);
            assert!(p.velocity.x >= 0.0 && p.velocity.x < MAX_INITIAL_SPEED);
            assert!(p.velocity.y >= 0.0 && p.velocity.y < MAX_INITIAL_SPEED);
        }
        for a in 0..4 {
            for b in 0..4 {
                let c = world.matrix().get(a, b);
                assert!((-1.0..1.0).contains(&c));
            }
        }
    }

    #[test]
    fn tiny_world_still_spawns_in_bounds() {
        let params = SimulationParameters {
            num_particles: 50,
            width: 4.0,
            height: 3.0,
            ..Default::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let world = ParticleWorld::random(&params, &mut rng);
        for p in world.particles() {
            assert!(p.position.x >= 0.0 && p.position.x < 4.0);
            assert!(p.position.y >= 0.0 && p.position.y < 3.0);
        }
    }

    #[test]
    fn same_seed_same_world() {
        let params = SimulationParameters::default();
        let a = ParticleWorld::random(&params, &mut ChaCha8Rng::seed_from_u64(9));
        let b = ParticleWorld::random(&params, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a.particles(), b.particles());
        assert_eq!(a.matrix(), b.matrix());
    }

    #[test]
    fn matrix_is_directional() {
        let m = InteractionMatrix::from_rows(&[vec![0.1, 0.2], vec![-0.3, 0.4]]).unwrap();
        assert_eq!(m.get(0, 1), 0.2);
        assert_eq!(m.get(1, 0), -0.3);
        assert!(InteractionMatrix::from_rows(&[vec![0.1, 0.2], vec![0.3]]).is_none());
    }

    #[test]
    fn frame_lists_every_particle() {
        let matrix = InteractionMatrix::from_fn(2, |_, _| 0.0);
        let world = ParticleWorld::from_parts(
            vec![
                Particle::new(0, Vector2::new(1.0, 2.0), Vector2::zeros()),
                Particle::new(1, Vector2::new(3.0, 4.0), Vector2::zeros()),
            ],
            matrix,
            10.0,
            10.0,
        );
        let frame = world.frame();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.num_types, 2);
        let points: Vec<_> = frame.points().collect();
        assert_eq!(points, vec![(1.0, 2.0, 0), (3.0, 4.0, 1)]);
    }
}
