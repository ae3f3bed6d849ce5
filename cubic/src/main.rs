//! # Cubic
//!
//! Generates a flat demo world and runs the cube lighting pipeline over it
//! until every cube that can be lit is live.
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    clippy::unwrap_used
)]
#![allow(clippy::single_call_fn, clippy::missing_errors_doc)]

use std::{env, path::PathBuf, time::Duration};

use anyhow::Context;
use cubic_core::{GeneratorPipeline, GeneratorStage};
use tokio::{select, signal, time};
use tokio_util::sync::CancellationToken;
use tracing::subscriber::set_global_default;
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

use crate::{config::CubicConfig, demo::DemoWorld};

mod config;
mod demo;

const DEFAULT_CONFIG_PATH: &str = "config/cubic_config.json5";

fn init_logging() -> anyhow::Result<()> {
    LogTracer::init()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    set_global_default(subscriber)?;
    Ok(())
}

/// Counts ticks in a row that finished nothing.
///
/// Cubes that are not ready cycle through their queue, so once every queued
/// cube has been tried without any progress the world can't change anymore.
#[derive(Default)]
struct StallDetector {
    idle_ticks: usize,
}

impl StallDetector {
    fn observe(&mut self, completed: usize, pending: usize, batch_size: usize) -> bool {
        if completed > 0 {
            self.idle_ticks = 0;
            return false;
        }
        self.idle_ticks += 1;
        self.idle_ticks * batch_size >= pending
    }
}

fn log_summary(demo: &DemoWorld, pipeline: &GeneratorPipeline, ticks: u64) {
    for stage in GeneratorStage::ALL {
        if let Some(stats) = pipeline.stats(stage) {
            log::info!(
                "{stage:?}: {} completed, {} retried, {} dropped, {} pending",
                stats.completed,
                stats.requeued,
                stats.dropped,
                pipeline.pending(stage)
            );
        }
    }
    log::info!(
        "After {ticks} ticks {} of {} cubes are live, {} changed, {} light checks queued",
        demo.count_at(GeneratorStage::Live),
        demo.cache.cube_count(),
        demo.save_changed(),
        demo.world.pending_light_checks()
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    let path = env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = CubicConfig::load_or_create(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    let demo = DemoWorld::generate(&config);
    let mut pipeline = demo.pipeline();
    for &pos in &demo.generated {
        pipeline.generate(pos);
    }

    let cancel_token = CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let batch_size = config.lighting.batch_size;
    let mut interval = time::interval(Duration::from_millis(config.tick_interval_ms));
    let mut stall = StallDetector::default();
    let mut ticks = 0;
    loop {
        select! {
            () = cancel_token.cancelled() => {
                log::info!("Interrupted");
                break;
            }
            _ = interval.tick() => {}
        }

        let report = pipeline.tick(batch_size);
        ticks += 1;
        log::debug!(
            "Tick {ticks}: {} completed, {} live, {} pending",
            report.total_completed(),
            report.went_live,
            pipeline.total_pending()
        );

        if pipeline.is_idle() {
            log::info!("Every cube is live");
            break;
        }
        if stall.observe(report.total_completed(), pipeline.total_pending(), batch_size) {
            log::warn!(
                "{} cubes are waiting on neighbors that will never load",
                pipeline.total_pending()
            );
            break;
        }
        if ticks >= config.max_ticks {
            log::warn!("Stopping after {ticks} ticks");
            break;
        }
    }

    log_summary(&demo, &pipeline, ticks);
    Ok(())
}
