use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{error, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::config::EngineConfig;
use crate::world::{Engine, EngineError};

use super::input::{is_escape, KeyTranslator};
use super::metrics::MetricsAccumulator;
use super::{MetricsHandle, PixelsSurface};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub engine: EngineConfig,
    pub metrics_log_interval: Duration,
    pub exit_on_escape: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Pixel Game".to_string(),
            engine: EngineConfig::default(),
            metrics_log_interval: Duration::from_secs(1),
            exit_on_escape: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize render surface: {0}")]
    CreateSurface(#[source] PixelsError),
    #[error("engine stopped: {0}")]
    Engine(#[from] EngineError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens a window sized to the engine surface, hands the engine to `setup`
/// for wiring, then drives it until the window closes.
pub fn run_app<F>(config: LoopConfig, setup: F) -> Result<(), AppError>
where
    F: FnOnce(&mut Engine<PixelsSurface>),
{
    run_app_with_metrics(config, setup, MetricsHandle::default())
}

pub fn run_app_with_metrics<F>(
    config: LoopConfig,
    setup: F,
    metrics_handle: MetricsHandle,
) -> Result<(), AppError>
where
    F: FnOnce(&mut Engine<PixelsSurface>),
{
    let surface_size = config.engine.surface_size;
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                surface_size.width as f64,
                surface_size.height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let window_for_loop = Arc::clone(&window);
    let surface = PixelsSurface::new(window, surface_size).map_err(AppError::CreateSurface)?;

    let mut engine = Engine::new(config.engine.clone(), surface);
    setup(&mut engine);

    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let exit_on_escape = config.exit_on_escape;
    info!(
        window_title = %config.window_title,
        surface_width = surface_size.width,
        surface_height = surface_size.height,
        refresh_rate_ms = engine.refresh_rate().as_millis() as u64,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        exit_on_escape,
        "loop_config"
    );

    let mut translator = KeyTranslator::default();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval, Instant::now());
    let mut fatal_error: Option<EngineError> = None;
    let fatal = &mut fatal_error;

    event_loop.set_control_flow(control_flow_for(engine.next_deadline()));
    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Err(error) = engine
                            .surface_mut()
                            .resize_window(new_size.width, new_size.height)
                        {
                            warn!(error = %error, "surface_resize_failed");
                            window_target.exit();
                        }
                        window_for_loop.request_redraw();
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        if let Err(error) =
                            engine.surface_mut().resize_window(size.width, size.height)
                        {
                            warn!(error = %error, "surface_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::ModifiersChanged(modifiers) => {
                        translator.set_modifiers(modifiers.state());
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if exit_on_escape && is_escape(&event) {
                            info!(reason = "escape_key", "shutdown_requested");
                            window_target.exit();
                            return;
                        }
                        if let Some((raw, phases)) = translator.translate(&event) {
                            for phase in phases {
                                engine.key_input(*phase, &raw);
                            }
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if let Err(error) = engine.surface_mut().present() {
                            warn!(error = %error, "surface_present_failed");
                            window_target.exit();
                            return;
                        }
                        metrics_accumulator.record_present();
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                let started = Instant::now();
                match engine.poll(started) {
                    Ok(outcome) => {
                        if outcome.drew_frame() {
                            metrics_accumulator.record_update(started.elapsed());
                            window_for_loop.request_redraw();
                        }
                    }
                    Err(error) => {
                        error!(error = %error, "engine_poll_failed");
                        *fatal = Some(error);
                        window_target.exit();
                        return;
                    }
                }

                if let Some(snapshot) = metrics_accumulator.maybe_snapshot(Instant::now()) {
                    metrics_handle.publish(snapshot);
                    info!(
                        ups = snapshot.ups,
                        fps = snapshot.fps,
                        update_time_ms = snapshot.update_time_ms,
                        entity_count = engine.entities().len(),
                        paused = engine.is_paused(),
                        "loop_metrics"
                    );
                }
                window_target.set_control_flow(control_flow_for(engine.next_deadline()));
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)?;

    match fatal_error {
        Some(error) => Err(AppError::Engine(error)),
        None => Ok(()),
    }
}

fn control_flow_for(deadline: Option<Instant>) -> ControlFlow {
    match deadline {
        Some(deadline) => ControlFlow::WaitUntil(deadline),
        None => ControlFlow::Wait,
    }
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}
