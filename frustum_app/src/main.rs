//! Frustum Culling Demo
//!
//! Headless version of the basic frustum clipping example:
//! - A camera orbits the origin while a sphere sits at (5, 3, -10)
//! - The sphere is drawn only on frames where it is inside the frustum
//! - A second pass scatters LOD-switching nodes and reports how many are drawn
//!
//! Usage: `frustum_demo [config.toml|config.ron] [save.scene]`

use rand::prelude::*;
use rust_scenegraph::foundation::logging;
use rust_scenegraph::foundation::math::utils::deg_to_rad;
use rust_scenegraph::prelude::*;

const ORBIT_FRAMES: usize = 120;
const ORBIT_DEGREES_PER_FRAME: f32 = 3.0;
const ASPECT: f32 = 800.0 / 450.0;

const SCATTERED_NODES: usize = 200;
const SCATTER_RANGE: f32 = 80.0;
const LOD_DISTANCES: [f32; 2] = [30.0, 70.0];

/// Draw sink that only counts and traces what it receives
#[derive(Default)]
struct CountingSink {
    meshes: usize,
}

impl DrawSink for CountingSink {
    fn draw_mesh(&mut self, mesh: &Mesh, material: &Material, transform: &Mat4) {
        self.meshes += 1;
        log::trace!(
            "draw {} color {:?} at ({:.2}, {:.2}, {:.2})",
            mesh.name,
            material.diffuse,
            transform[(0, 3)],
            transform[(1, 3)],
            transform[(2, 3)]
        );
    }
}

fn orbit_camera(config: &SceneConfig, frame: usize) -> Camera {
    let start = Vec3::new(10.0, 10.0, 10.0);
    let radius = start.xz().norm();
    let angle = deg_to_rad(45.0 + ORBIT_DEGREES_PER_FRAME * frame as f32);

    Camera::perspective(
        Vec3::new(radius * angle.cos(), start.y, radius * angle.sin()),
        Vec3::zeros(),
        45.0,
    )
    .with_clip_planes(config.camera_defaults.near, config.camera_defaults.far)
}

/// Orbit around the sample sphere and report when it enters or leaves view
fn run_orbit(config: &SceneConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut scene = Scene::with_config("orbit", config.clone())?;
    let model = scene
        .add_model(Model::from_meshes(vec![Mesh::cube("sphere", 2.0 / 3.0_f32.sqrt())]), "sphere")
        .ok_or("no model slot for the sphere")?;
    let sphere = scene.add_model_node("sphere", model).ok_or("no node slot for the sphere")?;
    if let Some(node) = scene.tree_mut().node_mut(sphere) {
        node.set_position(Vec3::new(5.0, 3.0, -10.0));
        node.tint = Color::new(255, 64, 64, 255);
    }
    scene.update();

    let mut sink = CountingSink::default();
    let mut was_visible = None;
    let mut visible_frames = 0;

    for frame in 0..ORBIT_FRAMES {
        let camera = orbit_camera(config, frame);
        let Some(frustum) = Frustum::from_camera(&camera, ASPECT) else {
            continue;
        };

        let visible = scene.draw(&frustum, &mut sink) > 0;
        if visible {
            visible_frames += 1;
        }
        if was_visible != Some(visible) {
            log::info!(
                "frame {frame}: sphere {}",
                if visible { "inside frustum" } else { "outside frustum" }
            );
            was_visible = Some(visible);
        }
    }

    log::info!("Sphere drawn on {visible_frames}/{ORBIT_FRAMES} frames ({} meshes)", sink.meshes);
    Ok(())
}

/// Scatter nodes with a three-level LOD chain and draw them from the orbit
fn run_lod_field(config: &SceneConfig, save_path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let mut scene = Scene::with_config("lod_field", config.clone())?;
    let levels = ["high", "medium", "low"]
        .into_iter()
        .map(|name| {
            scene
                .add_model(Model::from_meshes(vec![Mesh::cube(name, 1.0)]), &format!("{name}.obj"))
                .ok_or("no model slot for a LOD level")
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut rng = thread_rng();
    for i in 0..SCATTERED_NODES {
        let node = scene
            .add_model_node(&format!("crate{i}"), levels[0])
            .ok_or("no node slot for a crate")?;

        for (lod_level, &distance) in LOD_DISTANCES.iter().enumerate() {
            let lod = scene
                .add_model_node(&format!("crate{i}_lod{}", lod_level + 1), levels[lod_level + 1])
                .ok_or("no node slot for a LOD")?;
            scene.insert_lod(node, lod, distance);
        }

        if let Some(node) = scene.tree_mut().node_mut(node) {
            node.set_position(Vec3::new(
                rng.gen_range(-SCATTER_RANGE..SCATTER_RANGE),
                rng.gen_range(-5.0..5.0),
                rng.gen_range(-SCATTER_RANGE..SCATTER_RANGE),
            ));
            node.rotate_y(rng.gen_range(0.0..std::f32::consts::TAU));
            node.tint = Color::new(rng.gen(), rng.gen(), rng.gen(), 255);
        }
    }
    scene.update();

    let mut sink = CountingSink::default();
    for frame in (0..ORBIT_FRAMES).step_by(20) {
        let Some(frustum) = Frustum::from_camera(&orbit_camera(config, frame), ASPECT) else {
            continue;
        };
        let drawn = scene.draw(&frustum, &mut sink);

        let mut per_level = [0usize; 3];
        for &id in scene.nodes() {
            let Some(node) = scene.tree().node(id) else {
                continue;
            };
            if !node.visibility().inside_frustum {
                continue;
            }
            let level = scene.tree().lod_chain(id).position(|lod| Some(lod) == node.active_lod());
            if let Some(level) = level {
                per_level[level] += 1;
            }
        }
        log::info!(
            "frame {frame}: {drawn}/{SCATTERED_NODES} crates drawn (high {}, medium {}, low {})",
            per_level[0],
            per_level[1],
            per_level[2]
        );
    }

    if let Some(path) = save_path {
        scene.save_file(path)?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);

    let config = match args.next() {
        Some(path) => SceneConfig::load_from_file(&path)?,
        None => SceneConfig::default(),
    };
    config.validate()?;
    logging::init_with_level(&config.log_level);

    log::info!("=== Frustum Culling Demo ===");
    run_orbit(&config)?;
    run_lod_field(&config, args.next().as_deref())?;
    Ok(())
}
