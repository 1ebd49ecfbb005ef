//! Spatial Engine Demo
//!
//! Simulates a field of boxes drifting through space and keeps two indices
//! in sync with them every frame:
//! - a `SpatialCollection` (octree) re-classifying objects as they move
//! - a `DynamicTree3` absorbing small moves with fattened leaves
//!
//! Each frame runs box, sphere, frustum and ray queries against both and
//! logs what they found. Pass a `.toml` or `.ron` file to override the
//! default `SpatialConfig`.

use std::cell::Cell;
use std::f32::consts::FRAC_PI_3;
use std::rc::Rc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spatial_engine::prelude::*;

// Simulation settings
const NUM_BODIES: usize = 500;
const NUM_FRAMES: usize = 120;
const FRAME_TIME: f32 = 1.0 / 60.0;
const SPAWN_RADIUS: f32 = 80.0;
const MAX_SPEED: f32 = 12.0;
const BODY_SIZE: f32 = 1.5;
const RNG_SEED: u64 = 0x5eed;

/// A moving box shared between the simulation and the collection
#[derive(Debug)]
struct Body {
    bounds: Cell<AABB>,
    velocity: Vec3,
    spatial_data: Cell<Option<SpatialData>>,
}

impl Body {
    fn advance(&self, dt: f32) {
        self.bounds.set(self.bounds.get().translated(&(self.velocity * dt)));
    }
}

impl SpatialObject for Body {
    fn bounding_box(&self) -> AABB {
        self.bounds.get()
    }

    fn spatial_data(&self) -> Option<SpatialData> {
        self.spatial_data.get()
    }

    fn set_spatial_data(&self, data: Option<SpatialData>) {
        self.spatial_data.set(data);
    }
}

struct Simulation {
    bodies: Vec<(Rc<Body>, ProxyId)>,
    collection: SpatialCollection<Rc<Body>>,
    tree: DynamicTree3<usize>,
}

impl Simulation {
    fn new(config: &SpatialConfig) -> Result<Self, SpatialError> {
        let mut rng = StdRng::seed_from_u64(RNG_SEED);
        let mut collection = SpatialCollection::with_config(config.collection)?;
        let mut tree = DynamicTree3::with_config(config.dynamic_tree)?;

        let mut bodies = Vec::with_capacity(NUM_BODIES);
        for index in 0..NUM_BODIES {
            let center = Vec3::new(
                rng.gen_range(-SPAWN_RADIUS..SPAWN_RADIUS),
                rng.gen_range(-SPAWN_RADIUS..SPAWN_RADIUS),
                rng.gen_range(-SPAWN_RADIUS..SPAWN_RADIUS),
            );
            let velocity = Vec3::new(
                rng.gen_range(-MAX_SPEED..MAX_SPEED),
                rng.gen_range(-MAX_SPEED..MAX_SPEED),
                rng.gen_range(-MAX_SPEED..MAX_SPEED),
            );
            let size = rng.gen_range(0.5..BODY_SIZE);

            let body = Rc::new(Body {
                bounds: Cell::new(AABB::from_center_extents(center, Vec3::repeat(size))),
                velocity,
                spatial_data: Cell::new(None),
            });

            collection.add(Rc::clone(&body))?;
            let proxy = tree.insert(body.bounding_box(), index);
            bodies.push((body, proxy));
        }

        log::info!(
            "Spawned {} bodies; octree root {:?}, dynamic tree height {}",
            bodies.len(),
            collection.bounds(),
            tree.height()
        );

        Ok(Self { bodies, collection, tree })
    }

    fn step(&mut self, dt: f32) -> Result<FrameStats, SpatialError> {
        let mut stats = FrameStats::default();

        for (body, proxy) in &self.bodies {
            body.advance(dt);
            if self.collection.notify_moved(body)? {
                stats.reclassified += 1;
            }
            if self.tree.move_proxy(*proxy, body.bounding_box())? {
                stats.reinserted += 1;
            }
        }

        let region = AABB::new(Vec3::repeat(-20.0), Vec3::repeat(20.0));
        stats.in_box = self.collection.query_box(&region).len();
        stats.tree_candidates = self.tree.find_all(&region).len();

        let sphere = BoundingSphere::new(Vec3::zeros(), 30.0);
        stats.in_sphere = self.collection.query_sphere(&sphere).len();

        let eye = Vec3::new(0.0, 20.0, 150.0);
        let view = Mat4::look_at(eye, Vec3::zeros(), Vec3::y());
        let frustum = Frustum::new(Mat4::perspective(FRAC_PI_3, 16.0 / 9.0, 0.1, 400.0) * view);
        stats.visible = self.collection.query_frustum(&frustum).len();

        let ray = Ray::new(eye, -eye);
        stats.nearest_hit = self.collection.query_ray(&ray).first().map(|(_, distance)| *distance);

        Ok(stats)
    }
}

#[derive(Debug, Default)]
struct FrameStats {
    reclassified: usize,
    reinserted: usize,
    in_box: usize,
    tree_candidates: usize,
    in_sphere: usize,
    visible: usize,
    nearest_hit: Option<f32>,
}

fn load_config() -> Result<SpatialConfig, SpatialError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {path}");
            SpatialConfig::load(path)
        }
        None => Ok(SpatialConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = load_config()?;
    let mut simulation = Simulation::new(&config)?;

    let start = Instant::now();
    for frame in 0..NUM_FRAMES {
        let stats = simulation.step(FRAME_TIME)?;
        if frame % 30 == 0 {
            log::info!("Frame {frame}: {stats:?}");
        }
    }

    let elapsed = start.elapsed();
    simulation.tree.validate()?;
    log::info!(
        "Simulated {NUM_FRAMES} frames in {:.2} ms; octree nodes {}, dynamic tree nodes {} (height {}, area ratio {:.2})",
        elapsed.as_secs_f64() * 1000.0,
        simulation.collection.tree().node_count(),
        simulation.tree.node_count(),
        simulation.tree.height(),
        simulation.tree.area_ratio()
    );

    Ok(())
}
