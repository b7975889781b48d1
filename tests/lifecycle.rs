use scene_bench_wasm::application::BenchmarkController;
use scene_bench_wasm::domain::benchmark::{
    BackendKind, BenchmarkConfig, FrameTiming, GpuReading, HostScheduler, MissingGpuCell, Phase,
    PhaseTimer, RenderBackend, ResultSink, RunId,
};
use scene_bench_wasm::domain::errors::BenchError;
use scene_bench_wasm::domain::events::BenchmarkEvent;
use scene_bench_wasm::domain::scene::{Scene, SceneId, build_scene};
use std::cell::RefCell;
use std::rc::Rc;

const FRAME_MS: f64 = 1000.0 / 60.0;

/// Virtual browser: a frame loop flag, pending timers with absolute due
/// times and whatever was downloaded.
#[derive(Default)]
struct VirtualHost {
    now: f64,
    loop_run: Option<RunId>,
    timers: Vec<(RunId, PhaseTimer, f64)>,
    downloads: Vec<(String, String)>,
    disposed: usize,
}

struct Scheduler(Rc<RefCell<VirtualHost>>);

impl HostScheduler for Scheduler {
    fn start_frame_loop(&mut self, run: RunId) {
        self.0.borrow_mut().loop_run = Some(run);
    }
    fn stop_frame_loop(&mut self) {
        self.0.borrow_mut().loop_run = None;
    }
    fn schedule_timer(&mut self, run: RunId, timer: PhaseTimer, delay_ms: f64) {
        let mut host = self.0.borrow_mut();
        let due = host.now + delay_ms;
        host.timers.push((run, timer, due));
    }
    fn cancel_timers(&mut self) {
        self.0.borrow_mut().timers.clear();
    }
}

struct Downloads(Rc<RefCell<VirtualHost>>);

impl ResultSink for Downloads {
    fn deliver(&mut self, file_name: &str, bytes: Vec<u8>) {
        let text = String::from_utf8(bytes).unwrap();
        self.0.borrow_mut().downloads.push((file_name.to_string(), text));
    }
}

/// Reports a GPU reading that only advances every `repeat` frames.
struct FakeBackend {
    host: Rc<RefCell<VirtualHost>>,
    frames: u64,
    gpu_repeat: Option<u64>,
}

impl RenderBackend for FakeBackend {
    fn kind(&self) -> BackendKind {
        if self.gpu_repeat.is_some() { BackendKind::NextGenGpu } else { BackendKind::Raster }
    }
    fn supports_gpu_timing(&self) -> bool {
        self.gpu_repeat.is_some()
    }
    fn render_frame(&mut self, scene: &mut dyn Scene, delta_seconds: f64) -> FrameTiming {
        scene.update(delta_seconds);
        self.frames += 1;
        let gpu = self.gpu_repeat.map(|repeat| {
            let sequence = self.frames / repeat;
            GpuReading { sequence, millis: sequence as f64 }
        });
        FrameTiming { cpu_ms: 1.5, gpu }
    }
    fn dispose(&mut self) {
        self.host.borrow_mut().disposed += 1;
    }
}

fn harness() -> (BenchmarkController, Rc<RefCell<VirtualHost>>) {
    let host = Rc::new(RefCell::new(VirtualHost::default()));
    let controller = BenchmarkController::new(
        Box::new(Scheduler(host.clone())),
        Box::new(Downloads(host.clone())),
    );
    (controller, host)
}

fn small_config() -> BenchmarkConfig {
    BenchmarkConfig::for_scene(SceneId::TorusBatched).with_object_count(Some(6))
}

fn start(
    controller: &mut BenchmarkController,
    host: &Rc<RefCell<VirtualHost>>,
    config: BenchmarkConfig,
    gpu_repeat: Option<u64>,
) -> RunId {
    let run = controller.begin(config.clone()).unwrap();
    let backend = FakeBackend { host: host.clone(), frames: 0, gpu_repeat };
    let now = host.borrow().now;
    controller.attach(run, build_scene(&config), Box::new(backend), now).unwrap();
    run
}

/// Advance virtual time at 60 Hz, firing timers before the frame that
/// follows them.
fn advance(controller: &mut BenchmarkController, host: &Rc<RefCell<VirtualHost>>, until_ms: f64) {
    let mut frame = (host.borrow().now / FRAME_MS).floor() as u64 + 1;
    loop {
        let t = frame as f64 * FRAME_MS;
        if t > until_ms {
            break;
        }
        host.borrow_mut().now = t;
        loop {
            let due = {
                let mut host = host.borrow_mut();
                let next = host
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, (_, _, at))| *at <= t)
                    .min_by(|a, b| a.1.2.total_cmp(&b.1.2))
                    .map(|(index, _)| index);
                next.map(|index| host.timers.remove(index))
            };
            match due {
                Some((run, timer, at)) => controller.on_timer(run, timer, at),
                None => break,
            }
        }
        let running = host.borrow().loop_run;
        if let Some(run) = running {
            controller.on_frame(run, t);
        }
        frame += 1;
    }
}

#[test]
fn full_run_at_60hz_captures_about_900_samples() {
    let (mut controller, host) = harness();
    start(&mut controller, &host, small_config(), None);

    advance(&mut controller, &host, 21_000.0);

    assert_eq!(controller.phase(), Phase::Finished);
    let samples = controller.samples();
    assert!((890..=910).contains(&samples.len()), "got {} samples", samples.len());
    assert!(samples[0].time_offset_ms < FRAME_MS + 1e-6);
    let last = samples[samples.len() - 1].time_offset_ms;
    assert!(last > 15_000.0 - 2.0 * FRAME_MS && last <= 15_000.0, "last offset {}", last);
    assert!(samples.windows(2).all(|w| w[0].time_offset_ms <= w[1].time_offset_ms));
    // FPS window has closed at least once before capture started.
    assert!(samples.iter().all(|s| (s.fps - 60.0).abs() < 1.0));

    let host = host.borrow();
    assert_eq!(host.downloads.len(), 1);
    let (name, csv) = &host.downloads[0];
    assert_eq!(name, "torus-batched-raster-6.csv");
    assert_eq!(csv.lines().count(), samples.len() + 1);
    assert_eq!(host.disposed, 1);
    assert!(host.loop_run.is_none());
}

#[test]
fn no_samples_during_warm_up() {
    let (mut controller, host) = harness();
    start(&mut controller, &host, small_config(), None);

    advance(&mut controller, &host, 4_990.0);

    assert_eq!(controller.phase(), Phase::WarmingUp);
    assert!(controller.samples().is_empty());
}

#[test]
fn manual_stop_is_idempotent_and_skips_export() {
    let (mut controller, host) = harness();
    let completions = Rc::new(RefCell::new(Vec::new()));
    let seen = completions.clone();
    controller.set_completion_callback(move |session| {
        seen.borrow_mut().push((session.samples().len(), session.stopped_manually()));
    });

    start(&mut controller, &host, small_config(), None);
    advance(&mut controller, &host, 6_000.0);

    assert!(controller.stop());
    assert!(!controller.stop());
    assert_eq!(controller.phase(), Phase::Finished);

    let recorded = controller.samples().len();
    assert!(recorded > 0);
    assert_eq!(*completions.borrow(), vec![(recorded, true)]);

    // The loop and timers are gone; nothing else happens.
    advance(&mut controller, &host, 25_000.0);
    assert_eq!(controller.samples().len(), recorded);
    assert_eq!(completions.borrow().len(), 1);
    assert!(host.borrow().downloads.is_empty());
}

#[test]
fn manual_stop_exports_when_enabled() {
    let (mut controller, host) = harness();
    let mut config = small_config();
    config.export_on_manual_stop = true;
    start(&mut controller, &host, config, None);
    advance(&mut controller, &host, 5_500.0);

    controller.stop();

    let host = host.borrow();
    assert_eq!(host.downloads.len(), 1);
    assert!(host.downloads[0].1.starts_with("Time (ms),FPS,CPU (ms),GPU (ms)"));
}

#[test]
fn export_zero_fills_gpu_when_configured() {
    let (mut controller, host) = harness();
    let mut config = small_config().with_timing(50.0, 200.0);
    config.missing_gpu = MissingGpuCell::Zero;
    start(&mut controller, &host, config, None);

    advance(&mut controller, &host, 400.0);

    let host = host.borrow();
    let (_, csv) = &host.downloads[0];
    assert!(csv.lines().count() > 1);
    assert!(csv.lines().skip(1).all(|row| row.ends_with(",0.00")), "{}", csv);
}

#[test]
fn second_start_is_rejected_until_finished() {
    let (mut controller, host) = harness();
    let first = start(&mut controller, &host, small_config(), None);

    assert_eq!(controller.begin(small_config()), Err(BenchError::AlreadyRunning));
    assert_eq!(controller.current_run(), Some(first));

    advance(&mut controller, &host, 21_000.0);
    let second = controller.begin(small_config()).unwrap();
    assert_eq!(second, RunId(first.0 + 1));
    assert_eq!(controller.phase(), Phase::WarmingUp);
    assert!(controller.samples().is_empty());
}

#[test]
fn timers_from_a_stopped_run_do_not_touch_the_next_one() {
    let (mut controller, host) = harness();
    let first = start(&mut controller, &host, small_config(), None);
    controller.stop();
    let second = start(&mut controller, &host, small_config(), None);

    controller.on_timer(first, PhaseTimer::WarmUpElapsed, 10.0);
    controller.on_timer(first, PhaseTimer::CaptureElapsed, 20.0);
    controller.on_frame(first, 30.0);

    assert_eq!(controller.current_run(), Some(second));
    assert_eq!(controller.phase(), Phase::WarmingUp);
}

#[test]
fn repeated_gpu_readings_are_recorded_once() {
    let (mut controller, host) = harness();
    let config = small_config().with_timing(100.0, 500.0);
    start(&mut controller, &host, config, Some(3));

    advance(&mut controller, &host, 700.0);

    let samples = controller.samples();
    assert!(!samples.is_empty());
    let gpu: Vec<f64> = samples.iter().map(|s| s.gpu_ms.unwrap()).collect();
    assert!(gpu.windows(2).all(|w| w[0] < w[1]), "duplicates in {:?}", gpu);
    // Roughly one sample per three frames of a 500 ms capture.
    assert!((8..=12).contains(&samples.len()), "got {} samples", samples.len());
}

#[test]
fn events_trace_the_lifecycle() {
    let (mut controller, host) = harness();
    let phases = Rc::new(RefCell::new(Vec::new()));
    let sink = phases.clone();
    controller.subscribe(move |event| {
        if let BenchmarkEvent::PhaseChanged { to, .. } = event {
            sink.borrow_mut().push(*to);
        }
    });

    start(&mut controller, &host, small_config().with_timing(50.0, 100.0), None);
    advance(&mut controller, &host, 400.0);

    assert_eq!(*phases.borrow(), vec![Phase::WarmingUp, Phase::Capturing, Phase::Finished]);
}
