//! Swarm layout: iterative relaxation of points toward a categorical x
//! target and a value y target, with pairwise collision.
//!
//! Every step decays `alpha`, accumulates attraction and collision impulses
//! into point velocities, then integrates positions. Collision impulses for
//! one step are computed for all points first and applied as one batch, so
//! the result does not depend on point order or on whether the pass runs in
//! parallel.

use std::f64::consts::PI;

use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{RaceError, RaceResult};

/// One simulated point. `position` is owned by the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationPoint {
    pub key: String,
    pub position: (f64, f64),
    pub velocity: (f64, f64),
    pub target_x: f64,
    pub target_y: f64,
    pub radius: f64,
}

impl SimulationPoint {
    /// Creates an unplaced point; it is seeded near its target on first use.
    ///
    /// # Panics
    ///
    /// Panics when `radius` is negative or not finite.
    #[must_use]
    pub fn new(key: impl Into<String>, radius: f64) -> Self {
        assert_radius(radius);
        Self {
            key: key.into(),
            position: (f64::NAN, f64::NAN),
            velocity: (0.0, 0.0),
            target_x: 0.0,
            target_y: 0.0,
            radius,
        }
    }

    #[must_use]
    pub fn with_target(mut self, target_x: f64, target_y: f64) -> Self {
        self.target_x = target_x;
        self.target_y = target_y;
        self
    }

    #[must_use]
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = (x, y);
        self
    }

    #[must_use]
    pub fn is_placed(&self) -> bool {
        self.position.0.is_finite() && self.position.1.is_finite()
    }
}

fn assert_radius(radius: f64) {
    assert!(
        radius.is_finite() && radius >= 0.0,
        "simulation point radius must be finite and >= 0, got {radius}"
    );
}

fn assert_radii(points: &[SimulationPoint]) {
    for point in points {
        assert_radius(point.radius);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceConfig {
    /// Pull toward `target_x`; 1.0 snaps fully net of other forces.
    #[serde(default = "default_strength")]
    pub strength_x: f64,
    #[serde(default = "default_strength")]
    pub strength_y: f64,
    /// Extra gap kept between point edges.
    #[serde(default)]
    pub min_separation: f64,
    /// Share of the overlap resolved per step.
    #[serde(default = "default_strength")]
    pub collision_strength: f64,
    /// Fraction of velocity lost per step.
    #[serde(default = "default_velocity_decay")]
    pub velocity_decay: f64,
    #[serde(default = "default_alpha_min")]
    pub alpha_min: f64,
    #[serde(default = "default_alpha_decay")]
    pub alpha_decay: f64,
    #[serde(default)]
    pub alpha_target: f64,
    /// Energy restored by a reheat; never above 1.
    #[serde(default = "default_reheat_alpha")]
    pub reheat_alpha: f64,
    /// Spacing of the spiral used to seed unplaced points.
    #[serde(default = "default_seed_spacing")]
    pub seed_spacing: f64,
    /// Maximum random offset added when seeding points; 0 disables it.
    #[serde(default)]
    pub seed_jitter: f64,
    #[serde(default)]
    pub seed: u64,
}

fn default_strength() -> f64 {
    1.0
}

fn default_velocity_decay() -> f64 {
    0.4
}

fn default_alpha_min() -> f64 {
    0.001
}

fn default_alpha_decay() -> f64 {
    1.0 - default_alpha_min().powf(1.0 / 300.0)
}

fn default_reheat_alpha() -> f64 {
    1.0
}

fn default_seed_spacing() -> f64 {
    10.0
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            strength_x: default_strength(),
            strength_y: default_strength(),
            min_separation: 0.0,
            collision_strength: default_strength(),
            velocity_decay: default_velocity_decay(),
            alpha_min: default_alpha_min(),
            alpha_decay: default_alpha_decay(),
            alpha_target: 0.0,
            reheat_alpha: default_reheat_alpha(),
            seed_spacing: default_seed_spacing(),
            seed_jitter: 0.0,
            seed: 0,
        }
    }
}

impl ForceConfig {
    pub fn validate(self) -> RaceResult<Self> {
        for (value, name, min, max) in [
            (self.strength_x, "strength_x", 0.0, 1.0),
            (self.strength_y, "strength_y", 0.0, 1.0),
            (self.collision_strength, "collision_strength", 0.0, 1.0),
            (self.velocity_decay, "velocity_decay", 0.0, 1.0),
            (self.alpha_decay, "alpha_decay", 0.0, 1.0),
            (self.alpha_target, "alpha_target", 0.0, 1.0),
            (self.reheat_alpha, "reheat_alpha", 0.0, 1.0),
        ] {
            if !value.is_finite() || value < min || value > max {
                return Err(RaceError::InvalidConfig(format!(
                    "force config `{name}` must be finite and in [{min}, {max}]"
                )));
            }
        }
        for (value, name) in [
            (self.min_separation, "min_separation"),
            (self.alpha_min, "alpha_min"),
            (self.seed_spacing, "seed_spacing"),
            (self.seed_jitter, "seed_jitter"),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RaceError::InvalidConfig(format!(
                    "force config `{name}` must be finite and >= 0"
                )));
            }
        }
        Ok(self)
    }
}

/// Relaxes `points` in place for a fixed number of steps.
///
/// Targets come from `category_fn` (x) and `value_fn` (y). Unplaced points
/// are seeded deterministically around their targets first. The run starts
/// at full energy and cools with the default schedule.
///
/// # Panics
///
/// Panics when a point radius is negative or not finite.
pub fn relax<C, V>(
    points: &mut [SimulationPoint],
    category_fn: C,
    value_fn: V,
    min_separation: f64,
    iterations: usize,
) -> RaceResult<()>
where
    C: Fn(&SimulationPoint) -> f64,
    V: Fn(&SimulationPoint) -> f64,
{
    let config = ForceConfig {
        min_separation,
        ..ForceConfig::default()
    }
    .validate()?;
    assert_radii(points);

    assign_targets(points, &category_fn, &value_fn);
    seed_positions(points, &config);
    let mut alpha = 1.0;
    for _ in 0..iterations {
        alpha = step(points, alpha, &config);
    }
    Ok(())
}

/// Owned arena of points with a key index and cooling state.
#[derive(Debug, Clone)]
pub struct ForceSimulation {
    points: Vec<SimulationPoint>,
    index: IndexMap<String, usize>,
    alpha: f64,
    ticks: u64,
    config: ForceConfig,
}

impl ForceSimulation {
    pub fn new(config: ForceConfig) -> RaceResult<Self> {
        Ok(Self {
            points: Vec::new(),
            index: IndexMap::new(),
            alpha: 1.0,
            ticks: 0,
            config: config.validate()?,
        })
    }

    #[must_use]
    pub fn config(&self) -> ForceConfig {
        self.config
    }

    #[must_use]
    pub fn points(&self) -> &[SimulationPoint] {
        &self.points
    }

    #[must_use]
    pub fn point(&self, key: &str) -> Option<&SimulationPoint> {
        self.index.get(key).map(|&i| &self.points[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.alpha < self.config.alpha_min
    }

    /// Replaces the arena with exactly `points`.
    ///
    /// Keys that were already simulated keep their position and velocity so
    /// they move on from where they are; every other point is seeded near its
    /// target. Points absent from `points` stop taking part in collisions.
    ///
    /// # Panics
    ///
    /// Panics when a point radius is negative or not finite.
    pub fn reseed(&mut self, points: Vec<SimulationPoint>) {
        assert_radii(&points);
        let mut next = points;
        for point in &mut next {
            if let Some(previous) = self.point(&point.key) {
                point.position = previous.position;
                point.velocity = previous.velocity;
            }
        }
        seed_positions(&mut next, &self.config);

        self.index = next
            .iter()
            .enumerate()
            .map(|(i, point)| (point.key.clone(), i))
            .collect();
        debug_assert_eq!(self.index.len(), next.len(), "duplicate simulation key");
        debug!(
            previous = self.points.len(),
            next = next.len(),
            "reseeded force simulation"
        );
        self.points = next;
    }

    /// Moves every target without touching positions.
    pub fn retarget<C, V>(&mut self, category_fn: C, value_fn: V)
    where
        C: Fn(&SimulationPoint) -> f64,
        V: Fn(&SimulationPoint) -> f64,
    {
        assign_targets(&mut self.points, &category_fn, &value_fn);
    }

    /// Restores energy so points animate toward new targets.
    pub fn reheat(&mut self) {
        self.alpha = self.config.reheat_alpha;
        trace!(alpha = self.alpha, "reheat force simulation");
    }

    /// Runs one relaxation step.
    pub fn tick(&mut self) {
        self.alpha = step(&mut self.points, self.alpha, &self.config);
        self.ticks += 1;
    }

    /// Runs `iterations` steps without yielding.
    pub fn run(&mut self, iterations: usize) {
        for _ in 0..iterations {
            self.tick();
        }
        trace!(iterations, alpha = self.alpha, "ran force simulation");
    }
}

fn assign_targets<C, V>(points: &mut [SimulationPoint], category_fn: &C, value_fn: &V)
where
    C: Fn(&SimulationPoint) -> f64,
    V: Fn(&SimulationPoint) -> f64,
{
    for point in points.iter_mut() {
        point.target_x = category_fn(point);
        point.target_y = value_fn(point);
    }
}

/// Places unplaced points on a phyllotaxis spiral around their targets.
fn seed_positions(points: &mut [SimulationPoint], config: &ForceConfig) {
    let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
    let mut rng = StdRng::seed_from_u64(config.seed);
    for (i, point) in points.iter_mut().enumerate() {
        if point.is_placed() {
            continue;
        }
        let radius = config.seed_spacing * (0.5 + i as f64).sqrt();
        let angle = i as f64 * golden_angle;
        let (mut jx, mut jy) = (0.0, 0.0);
        if config.seed_jitter > 0.0 {
            jx = (rng.random::<f64>() * 2.0 - 1.0) * config.seed_jitter;
            jy = (rng.random::<f64>() * 2.0 - 1.0) * config.seed_jitter;
        }
        point.position = (
            point.target_x + radius * angle.cos() + jx,
            point.target_y + radius * angle.sin() + jy,
        );
        point.velocity = (0.0, 0.0);
    }
}

/// One relaxation step. Returns the cooled alpha.
fn step(points: &mut [SimulationPoint], alpha: f64, config: &ForceConfig) -> f64 {
    let alpha = alpha + (config.alpha_target - alpha) * config.alpha_decay;

    for point in points.iter_mut() {
        point.velocity.0 += (point.target_x - point.position.0) * config.strength_x * alpha;
        point.velocity.1 += (point.target_y - point.position.1) * config.strength_y * alpha;
    }

    let impulses = collision_impulses(points, config.min_separation, config.collision_strength);
    for (point, (dx, dy)) in points.iter_mut().zip(impulses) {
        point.velocity.0 += dx;
        point.velocity.1 += dy;
    }

    let keep = 1.0 - config.velocity_decay;
    for point in points.iter_mut() {
        point.velocity.0 *= keep;
        point.velocity.1 *= keep;
        point.position.0 += point.velocity.0;
        point.position.1 += point.velocity.1;
    }

    alpha
}

fn collision_impulses(
    points: &[SimulationPoint],
    min_separation: f64,
    strength: f64,
) -> Vec<(f64, f64)> {
    if strength == 0.0 || points.len() < 2 {
        return vec![(0.0, 0.0); points.len()];
    }

    #[cfg(feature = "parallel-collision")]
    {
        use rayon::prelude::*;
        (0..points.len())
            .into_par_iter()
            .map(|i| impulse_for(points, i, min_separation, strength))
            .collect()
    }

    #[cfg(not(feature = "parallel-collision"))]
    {
        (0..points.len())
            .map(|i| impulse_for(points, i, min_separation, strength))
            .collect()
    }
}

/// Sum of the collision pushes on point `i`, using predicted positions.
///
/// Each pair contributes exactly opposite pushes to its two points, so the
/// batch is symmetric.
fn impulse_for(
    points: &[SimulationPoint],
    i: usize,
    min_separation: f64,
    strength: f64,
) -> (f64, f64) {
    let a = &points[i];
    let ax = a.position.0 + a.velocity.0;
    let ay = a.position.1 + a.velocity.1;
    let mut total = (0.0, 0.0);

    for (j, b) in points.iter().enumerate() {
        if i == j {
            continue;
        }
        let reach = a.radius + b.radius + min_separation;
        let mut dx = ax - (b.position.0 + b.velocity.0);
        let mut dy = ay - (b.position.1 + b.velocity.1);
        let mut dist_sq = dx * dx + dy * dy;
        if dist_sq >= reach * reach {
            continue;
        }
        if dist_sq == 0.0 {
            (dx, dy) = coincident_direction(i, j);
            dist_sq = dx * dx + dy * dy;
        }
        let dist = dist_sq.sqrt();
        let push = (reach - dist) / dist * strength * 0.5;
        total.0 += dx * push;
        total.1 += dy * push;
    }
    total
}

/// Tiny separation vector for two points at the same spot, derived from the
/// pair indices and antisymmetric in them.
fn coincident_direction(i: usize, j: usize) -> (f64, f64) {
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    let angle = ((lo as f64) * 0.618_034 + (hi as f64) * 0.414_214) * 2.0 * PI;
    let sign = if i == lo { 1.0 } else { -1.0 };
    (sign * angle.cos() * 1e-6, sign * angle.sin() * 1e-6)
}
