use nalgebra::Vector2;
use rayon::prelude::*;

use crate::config::SimulationParameters;
use crate::world::ParticleWorld;

/// Empirical gain applied to the summed force, multiplied by the radius.
pub const FORCE_GAIN: f64 = 100.0;

/// Force magnitude at normalized distance `d = dist / r`.
///
/// Below `beta` the result falls linearly from -1 at contact to 0 at `beta`,
/// independent of `coef`. Between `beta` and 1 it is a tent of height `coef`
/// peaking at `(1 + beta) / 2`. At or beyond 1 there is no force.
///
/// `beta` must lie strictly inside (0, 1); this is checked when the
/// parameters are validated, not here.
pub fn calc_forces(d: f64, coef: f64, beta: f64) -> f64 {
    if d < beta {
        d / beta - 1.0
    } else if d < 1.0 {
        coef * (1.0 - (2.0 * d - 1.0 - beta).abs() / (1.0 - beta))
    } else {
        0.0
    }
}

/// Shortest signed offset from `from` to `to` along an axis that wraps at `extent`.
pub fn wrapped_offset(from: f64, to: f64, extent: f64) -> f64 {
    let diff = to - from;
    if diff.abs() > extent / 2.0 {
        (diff.abs() - extent) * diff.signum()
    } else {
        diff
    }
}

/// Shortest displacement from `from` to `to` on a `width` x `height` torus.
pub fn toroidal_offset(
    from: &Vector2<f64>,
    to: &Vector2<f64>,
    width: f64,
    height: f64,
) -> Vector2<f64> {
    Vector2::new(
        wrapped_offset(from.x, to.x, width),
        wrapped_offset(from.y, to.y, height),
    )
}

/// Straight-line distance between two points on the torus.
pub fn toroidal_distance(from: &Vector2<f64>, to: &Vector2<f64>, width: f64, height: f64) -> f64 {
    toroidal_offset(from, to, width, height).norm()
}

/// Total force on every particle for the current positions, already scaled
/// by `r * FORCE_GAIN`. The world is only read.
///
/// A positive magnitude from `calc_forces` pushes particle `i` along the
/// offset towards `j`. Coincident particles contribute nothing.
pub fn accumulate_forces(world: &ParticleWorld, params: &SimulationParameters) -> Vec<Vector2<f64>> {
    let particles = world.particles();
    let matrix = world.matrix();
    let (width, height) = (world.width(), world.height());
    let r = params.r;
    let gain = r * FORCE_GAIN;

    particles
        .par_iter()
        .enumerate()
        .map(|(i, particle)| {
            let mut total = Vector2::zeros();
            for (j, other) in particles.iter().enumerate() {
                if i == j {
                    continue;
                }
                let offset = toroidal_offset(&particle.position, &other.position, width, height);
                let dist = offset.norm();
                if dist > 0.0 && dist < r {
                    let coef = matrix.get(particle.type_id(), other.type_id());
                    let magnitude = calc_forces(dist / r, coef, params.beta);
                    total += offset / dist * magnitude;
                }
            }
            total * gain
        })
        .collect()
}
