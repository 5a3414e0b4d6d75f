//! Headless world run: terrain, chunk rebuilds and culled draws without a window.
//!
//! Draws go to a [`RecordingBackend`], so the same frame loop a windowed
//! host would run can be exercised in CI and on machines without a GPU.

use std::sync::Arc;
use std::time::{Duration, Instant};

use nebula_config::Config;
use nebula_materials::ModelError;
use nebula_mesh::RenderLayer;
use nebula_render::{Camera, RecordingBackend, RendererSettings, WorldRenderer};
use nebula_terrain::{TerrainParams, generate_world};
use nebula_voxel::blocks::default_catalog;

use crate::assets::{self, AssetError};
use crate::game_loop::FixedTimestep;

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Yaw change per simulation tick, in radians.
const ORBIT_SPEED: f32 = 0.02;

/// Totals over a whole run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DemoSummary {
    pub frames: u32,
    pub ticks: u64,
    pub chunks: usize,
    pub chunks_rebuilt: usize,
    pub draw_calls: usize,
    pub dirty_remaining: usize,
    pub average_rebuild: Duration,
}

/// Seed from the config, or from the clock when none is set.
pub fn resolve_seed(config: &Config) -> u64 {
    config.world.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default()
    })
}

/// Builds the world described by `config` and runs `frames` frames.
///
/// `frame_interval` is slept between frames so the fixed-rate timer sees
/// real time pass.
pub fn run_headless(
    config: &Config,
    frames: u32,
    frame_interval: Duration,
) -> Result<DemoSummary, DemoError> {
    let mut catalog = default_catalog();
    if let Some(models) = assets::load_models(&config.atlas.model_file)? {
        let applied = assets::apply_models(&mut catalog, &models)?;
        tracing::info!("Applied {applied} block models");
    }
    let source = assets::texture_source(&config.atlas.texture_dir);
    let atlas = assets::build_block_atlas(&catalog, source.as_ref(), config.atlas.build_mips);

    let seed = resolve_seed(config);
    let params = TerrainParams {
        octaves: config.terrain.octaves,
        persistence: config.terrain.persistence,
        frequency_scale: config.terrain.frequency_scale,
    };
    let started = Instant::now();
    let mut grid = generate_world(seed, config.world.dims(), &params, Arc::new(catalog));
    tracing::info!(
        "Generated {:?} world with seed {seed} in {:?}",
        grid.dims(),
        started.elapsed()
    );

    let settings = RendererSettings {
        chunk_size: config.render.chunk_size,
        rebuilds_per_frame: config.render.rebuilds_per_frame,
        staleness_bucket: Duration::from_millis(config.render.staleness_bucket_ms),
    };
    let mut renderer = WorldRenderer::<RecordingBackend>::new(&mut grid, &atlas, &settings);
    let mut backend = RecordingBackend::new();

    let [w, h, d] = grid.dims();
    let mut camera = Camera {
        position: glam::Vec3::new(w as f32 * 0.5, h as f32 + 8.0, d as f32 * 0.5),
        fov_y: config.render.fov.to_radians(),
        near: config.render.near,
        far: config.render.far,
        ..Camera::default()
    };
    let mut yaw = 0.0_f32;
    camera.set_yaw_pitch(yaw, -0.6);

    let mut timer = FixedTimestep::new(config.simulation.ticks_per_second)
        .with_max_ticks_per_frame(config.simulation.max_ticks_per_frame);
    let random_ticks =
        renderer.chunks().len() * config.simulation.random_ticks_per_chunk as usize;

    let mut summary = DemoSummary {
        chunks: renderer.chunks().len(),
        ..Default::default()
    };

    for frame in 0..frames {
        let ticks = timer.advance();
        for _ in 0..ticks {
            grid.random_tick_scattered(random_ticks);
            yaw += ORBIT_SPEED;
        }
        camera.set_yaw_pitch(yaw + ORBIT_SPEED * timer.alpha() as f32, -0.6);

        let frustum = camera.frustum();
        let report =
            renderer.update_dirty_chunks(&grid, camera.position, &frustum, Instant::now());
        summary.chunks_rebuilt += report.rebuilt;

        for layer in RenderLayer::ALL {
            let stats = renderer.render(layer, &frustum, &mut backend);
            summary.draw_calls += stats.draw_calls;
        }

        if frame % 60 == 0 {
            tracing::debug!(
                "Frame {frame}: {:.0} fps, {} dirty, {} deferred",
                timer.fps(),
                renderer.dirty_count(),
                report.deferred
            );
        }
        summary.frames += 1;

        if !frame_interval.is_zero() {
            std::thread::sleep(frame_interval);
        }
    }

    summary.ticks = timer.tick_count();
    summary.dirty_remaining = renderer.dirty_count();
    summary.average_rebuild = renderer.stats().average_rebuild_time();
    renderer.free(&mut backend);

    tracing::info!(
        "Ran {} frames ({} ticks): {} chunk rebuilds, {} draw calls, avg rebuild {:?}",
        summary.frames,
        summary.ticks,
        summary.chunks_rebuilt,
        summary.draw_calls,
        summary.average_rebuild
    );
    Ok(summary)
}
