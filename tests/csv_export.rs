use scene_bench_wasm::domain::benchmark::{BenchmarkConfig, BenchmarkSession, FrameSample, RunId, to_csv};
use scene_bench_wasm::domain::benchmark::{BackendKind, FinishReason};
use scene_bench_wasm::domain::scene::SceneId;

fn samples() -> Vec<FrameSample> {
    vec![
        FrameSample::new(0.0, 60.0, 1.25, Some(0.5)),
        FrameSample::new(50.0 / 3.0, 60.0, 1.3, None),
        FrameSample::new(100.0 / 3.0, 59.876, 2.0, Some(0.75)),
    ]
}

#[test]
fn csv_table_layout() {
    let csv = String::from_utf8(to_csv(&samples())).unwrap();
    insta::assert_snapshot!(csv, @r"
    Time (ms),FPS,CPU (ms),GPU (ms)
    0.00,60.00,1.25,0.50
    16.67,60.00,1.30,
    33.33,59.88,2.00,0.75
    ");
}

#[test]
fn csv_has_no_trailing_newline() {
    let csv = to_csv(&samples());
    assert_ne!(csv.last(), Some(&b'\n'));
}

#[test]
fn samples_serialize_with_camel_case_fields() {
    let json = serde_json::to_string(&samples()[1..2]).unwrap();
    assert!(json.starts_with(r#"[{"timeOffsetMs":16.666"#));
    assert!(json.ends_with(r#""fps":60.0,"cpuMs":1.3,"gpuMs":null}]"#));
}

#[test]
fn export_file_name_uses_backend_that_ran() {
    let config = BenchmarkConfig::for_scene(SceneId::OrbitSpheres).with_backend(BackendKind::NextGenGpu);
    let mut session = BenchmarkSession::new(RunId(4), config);
    session.begin_warm_up().unwrap();
    session.set_backend_used(BackendKind::Raster);
    session.begin_capture(0.0).unwrap();
    session.finish(FinishReason::Timer).unwrap();

    assert_eq!(session.export_file_name(), "orbit-spheres-raster-100.csv");
}
