use crate::domain::benchmark::{
    BenchmarkConfig, BenchmarkSession, FinishReason, FpsWindow, FrameClock, FrameSample,
    HostScheduler, PerformanceSampler, Phase, PhaseTimer, RenderBackend, ResultSink, RunId,
    to_csv_with,
};
use crate::domain::errors::{BenchError, BenchResult};
use crate::domain::events::{BenchmarkEvent, EventDispatcher, InMemoryEventDispatcher};
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::scene::Scene;

const COMPONENT: LogComponent = LogComponent::Application("Controller");

/// Everything that only lives while a run is active.
struct ActiveRun {
    session: BenchmarkSession,
    scene: Option<Box<dyn Scene>>,
    backend: Option<Box<dyn RenderBackend>>,
    clock: Option<FrameClock>,
    attached_at: Option<f64>,
    fps: FpsWindow,
    sampler: PerformanceSampler,
}

impl ActiveRun {
    fn new(session: BenchmarkSession) -> Self {
        Self {
            session,
            scene: None,
            backend: None,
            clock: None,
            attached_at: None,
            fps: FpsWindow::new(),
            sampler: PerformanceSampler::new(),
        }
    }

    fn is_attached(&self) -> bool {
        self.backend.is_some()
    }

    /// Time left in the current phase, measured from attach.
    fn remaining_ms(&self, now_ms: f64) -> f64 {
        let Some(attached_at) = self.attached_at else {
            return 0.0;
        };
        let config = self.session.config();
        let ends_at = match self.session.phase() {
            Phase::WarmingUp => attached_at + config.warmup_ms,
            Phase::Capturing => attached_at + config.total_ms(),
            Phase::Idle | Phase::Finished => return 0.0,
        };
        (ends_at - now_ms).max(0.0)
    }
}

/// Drives one benchmark run at a time through
/// `Idle -> WarmingUp -> Capturing -> Finished`.
///
/// All entry points are synchronous; the host calls `on_frame`/`on_timer`
/// with the `RunId` it was handed so callbacks that outlive their run are
/// recognised and ignored.
pub struct BenchmarkController {
    scheduler: Box<dyn HostScheduler>,
    sink: Box<dyn ResultSink>,
    events: InMemoryEventDispatcher,
    on_complete: Option<Box<dyn FnMut(&BenchmarkSession)>>,
    active: Option<ActiveRun>,
    last_session: Option<BenchmarkSession>,
    next_run: u64,
}

impl BenchmarkController {
    pub fn new(scheduler: Box<dyn HostScheduler>, sink: Box<dyn ResultSink>) -> Self {
        Self {
            scheduler,
            sink,
            events: InMemoryEventDispatcher::new(),
            on_complete: None,
            active: None,
            last_session: None,
            next_run: 0,
        }
    }

    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&BenchmarkEvent) + 'static,
    {
        self.events.subscribe(handler);
    }

    /// Invoked exactly once for every run that reaches `Finished`.
    pub fn set_completion_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&BenchmarkSession) + 'static,
    {
        self.on_complete = Some(Box::new(callback));
    }

    /// Phase of the active run; `Finished` once a run has ended and until
    /// the next one starts.
    pub fn phase(&self) -> Phase {
        match (&self.active, &self.last_session) {
            (Some(active), _) => active.session.phase(),
            (None, Some(last)) => last.phase(),
            (None, None) => Phase::Idle,
        }
    }

    pub fn current_run(&self) -> Option<RunId> {
        self.active.as_ref().map(|active| active.session.run())
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Samples of the active run, or of the last finished one.
    pub fn samples(&self) -> &[FrameSample] {
        match (&self.active, &self.last_session) {
            (Some(active), _) => active.session.samples(),
            (None, Some(last)) => last.samples(),
            (None, None) => &[],
        }
    }

    pub fn last_session(&self) -> Option<&BenchmarkSession> {
        self.last_session.as_ref()
    }

    /// `Idle -> WarmingUp`. The backend is attached later by `attach`.
    pub fn begin(&mut self, config: BenchmarkConfig) -> BenchResult<RunId> {
        if let Some(active) = &self.active {
            get_logger().warn(
                COMPONENT,
                &format!("start ignored: {} is still {}", active.session.run(), active.session.phase()),
            );
            return Err(BenchError::AlreadyRunning);
        }
        config.validate()?;

        self.next_run += 1;
        let run = RunId(self.next_run);
        let mut session = BenchmarkSession::new(run, config);
        session.begin_warm_up()?;

        get_logger().info(
            COMPONENT,
            &format!(
                "{} starting: scene={} backend={} objects={} warmup={}ms capture={}ms",
                run,
                session.config().scene,
                session.config().backend,
                session.config().object_count,
                session.config().warmup_ms,
                session.config().capture_ms
            ),
        );

        self.active = Some(ActiveRun::new(session));
        self.events.publish(BenchmarkEvent::PhaseChanged {
            run,
            from: Phase::Idle,
            to: Phase::WarmingUp,
        });
        Ok(run)
    }

    /// Install the initialized backend and start rendering. Results that
    /// arrive for a run that was stopped meanwhile are disposed.
    pub fn attach(
        &mut self,
        run: RunId,
        scene: Box<dyn Scene>,
        mut backend: Box<dyn RenderBackend>,
        now_ms: f64,
    ) -> BenchResult<()> {
        let active = match self.active.as_mut() {
            Some(active)
                if active.session.run() == run
                    && active.session.phase() == Phase::WarmingUp
                    && !active.is_attached() =>
            {
                active
            }
            _ => {
                backend.dispose();
                crate::log_info!(COMPONENT, "{} initialized after it ended, discarding backend", run);
                return Err(BenchError::StaleAsyncResult);
            }
        };

        active.session.set_backend_used(backend.kind());
        let warmup_ms = active.session.config().warmup_ms;
        let total_ms = active.session.config().total_ms();

        get_logger().info(
            COMPONENT,
            &format!(
                "{} rendering on {} (gpu timing: {})",
                run,
                backend.kind(),
                backend.supports_gpu_timing()
            ),
        );

        active.scene = Some(scene);
        active.backend = Some(backend);
        active.clock = Some(FrameClock::new(now_ms));
        active.attached_at = Some(now_ms);

        self.scheduler.start_frame_loop(run);
        self.scheduler.schedule_timer(run, PhaseTimer::WarmUpElapsed, warmup_ms);
        self.scheduler.schedule_timer(run, PhaseTimer::CaptureElapsed, total_ms);
        Ok(())
    }

    /// Initialization failed: back to `Idle` without a session.
    pub fn abort(&mut self, run: RunId, error: &BenchError) {
        let matches = self
            .active
            .as_ref()
            .is_some_and(|active| active.session.run() == run && !active.is_attached());
        if !matches {
            return;
        }
        let Some(mut active) = self.active.take() else {
            return;
        };

        crate::log_error!(COMPONENT, "{} failed to initialize: {}", run, error);

        let from = active.session.phase();
        if let Err(err) = active.session.roll_back() {
            get_logger().warn(COMPONENT, &err.to_string());
        }
        self.events.publish(BenchmarkEvent::PhaseChanged { run, from, to: Phase::Idle });
        self.events.publish(BenchmarkEvent::RunFailed { run, reason: error.to_string() });
    }

    /// Host frame callback, tagged with the run that subscribed it.
    pub fn on_frame(&mut self, run: RunId, now_ms: f64) {
        if self.current_run() == Some(run) {
            self.tick(now_ms);
        }
    }

    /// Render one frame of the active run; record it while capturing.
    pub fn tick(&mut self, now_ms: f64) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let phase = active.session.phase();
        if !phase.is_running() {
            return;
        }
        let (Some(clock), Some(backend), Some(scene)) =
            (active.clock.as_mut(), active.backend.as_mut(), active.scene.as_mut())
        else {
            return;
        };

        let delta_seconds = clock.tick(now_ms);
        let fps = active.fps.push(delta_seconds * 1000.0);
        let timing = backend.render_frame(scene.as_mut(), delta_seconds);
        let run = active.session.run();

        self.events.publish(BenchmarkEvent::FrameRendered {
            run,
            phase,
            fps,
            cpu_ms: timing.cpu_ms,
            gpu_ms: timing.gpu.map(|reading| reading.millis),
            remaining_ms: active.remaining_ms(now_ms),
        });

        if phase != Phase::Capturing {
            return;
        }
        let start = active.session.start_of_capture().unwrap_or(now_ms);
        let Some(sample) = active.sampler.observe(now_ms - start, fps, timing.cpu_ms, timing.gpu)
        else {
            return;
        };
        if active.session.record(sample) {
            self.events.publish(BenchmarkEvent::SampleRecorded {
                run,
                count: active.session.samples().len(),
            });
        }
    }

    pub fn on_timer(&mut self, run: RunId, timer: PhaseTimer, now_ms: f64) {
        let Some(active) = self.active.as_mut() else {
            crate::log_debug!(COMPONENT, "{} timer for {} fired after teardown", timer, run);
            return;
        };
        if active.session.run() != run {
            crate::log_debug!(COMPONENT, "{} timer for stale {} ignored", timer, run);
            return;
        }

        match timer {
            PhaseTimer::WarmUpElapsed => {
                if active.session.phase() != Phase::WarmingUp {
                    return;
                }
                match active.session.begin_capture(now_ms) {
                    Ok(()) => {
                        crate::log_info!(COMPONENT, "{} capturing", run);
                        self.events.publish(BenchmarkEvent::PhaseChanged {
                            run,
                            from: Phase::WarmingUp,
                            to: Phase::Capturing,
                        });
                    }
                    Err(err) => get_logger().warn(COMPONENT, &err.to_string()),
                }
            }
            PhaseTimer::CaptureElapsed => {
                self.finish(FinishReason::Timer);
            }
        }
    }

    /// Manual stop. Repeated calls and calls without an active run are
    /// no-ops; returns whether a run was stopped.
    pub fn stop(&mut self) -> bool {
        let running = self
            .active
            .as_ref()
            .is_some_and(|active| active.session.phase().is_running());
        if !running {
            crate::log_debug!(COMPONENT, "stop ignored, nothing running");
            return false;
        }
        self.finish(FinishReason::Manual)
    }

    /// Shared teardown for the finish timer and manual stop.
    fn finish(&mut self, reason: FinishReason) -> bool {
        let Some(mut active) = self.active.take() else {
            return false;
        };

        self.scheduler.stop_frame_loop();
        self.scheduler.cancel_timers();
        if let Some(mut backend) = active.backend.take() {
            backend.dispose();
        }
        active.scene = None;

        let run = active.session.run();
        let from = active.session.phase();
        if let Err(err) = active.session.finish(reason) {
            get_logger().error(COMPONENT, &err.to_string());
            return false;
        }
        let session = active.session;

        let exported = reason == FinishReason::Timer || session.config().export_on_manual_stop;
        if exported {
            let file_name = session.export_file_name();
            get_logger().info(
                COMPONENT,
                &format!("{} exporting {} samples to {}", run, session.samples().len(), file_name),
            );
            self.sink.deliver(&file_name, to_csv_with(session.samples(), session.config().missing_gpu));
        } else {
            get_logger().info(COMPONENT, &format!("{} stopped by hand, export skipped", run));
        }

        self.events.publish(BenchmarkEvent::PhaseChanged { run, from, to: Phase::Finished });
        self.events.publish(BenchmarkEvent::RunFinished {
            run,
            samples: session.samples().len(),
            stopped_manually: session.stopped_manually(),
            exported,
        });

        let session = self.last_session.insert(session);
        if let Some(callback) = self.on_complete.as_mut() {
            callback(session);
        }
        true
    }
}
