use std::path::PathBuf;

use tr_alarms::{AlarmLevel, ResetMode};
use tr_controls::{ControlLaw, ControllerState};
use tr_core::{ChannelId, FaultCode, SensorId};
use tr_io::{EnableInput, NullDriver, SensorPort};
use tr_project::{
    ChannelDef, LawDef, ProjectError, SensorDef, StationDef, ValidationError, load, load_json,
    load_yaml, save_yaml, validate_station,
};

fn bench_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../configs/bench.yaml")
}

fn station() -> StationDef {
    StationDef {
        version: 1,
        name: "test".to_string(),
        tick_period_ms: 500,
        autotune: Default::default(),
        channels: vec![ChannelDef {
            index: 1,
            law: LawDef::Manual,
            manual_output: 10.0,
            sensor: Some(5),
            enabled: true,
            external_enable: true,
            ..ChannelDef::default()
        }],
        sensors: vec![SensorDef {
            index: 5,
            simulated: true,
            simulated_value: 30.0,
            ..SensorDef::default()
        }],
    }
}

#[test]
fn bundled_bench_config_loads() {
    let station = load_yaml(&bench_path()).expect("bench config should load");
    assert_eq!(station.channels.len(), 3);

    let engine = station.build_engine(NullDriver).unwrap();
    let ch0 = &engine.slot(ChannelId::new(0).unwrap()).channel;
    assert_eq!(ch0.state(), ControllerState::Running);
    assert_eq!(ch0.config().gains.kp, 8.0);
    let ch1 = engine.slot(ChannelId::new(1).unwrap());
    assert_eq!(ch1.channel.config().law, ControlLaw::Hysteresis);
    assert_eq!(ch1.alarm.config().reset_mode, ResetMode::ManualAck);
    assert_eq!(ch1.alarm.config().warning_low, -999.0);
    assert!(!engine.enables().is_enabled(ChannelId::new(2).unwrap()));
    assert_eq!(engine.sample_config().period_ms, 1000);
    assert_eq!(engine.autotune_defaults().session_ms, 600_000);
    assert_eq!(
        engine.sensors().read(SensorId::new(3).unwrap()).value,
        Some(21.5)
    );
}

#[test]
fn built_engine_runs() {
    let mut engine = station().build_engine(NullDriver).unwrap();
    let report = engine.tick(0, &mut tr_io::NullSink);
    assert_eq!(report.outputs[1], 10.0);
    assert!(report.gates[1]);
    // Unlisted channels keep fail-safe defaults.
    assert_eq!(report.outputs[0], 0.0);
    assert_eq!(
        engine.slot(ChannelId::new(0).unwrap()).alarm.level(),
        AlarmLevel::None
    );
}

#[test]
fn disabled_sensor_reports_configuration_fault() {
    let mut def = station();
    def.sensors[0].enabled = false;
    let mut engine = def.build_engine(NullDriver).unwrap();
    engine.tick(0, &mut tr_io::NullSink);
    let alarm = engine.slot(ChannelId::new(1).unwrap()).alarm.state();
    assert_eq!(alarm.level, AlarmLevel::Technical);
    assert_eq!(alarm.fault, FaultCode::Configuration);
}

#[test]
fn roundtrip_yaml() {
    let def = station();
    let path = std::env::temp_dir().join("tr_project_roundtrip.yaml");
    save_yaml(&path, &def).unwrap();
    let loaded = load(&path).unwrap();
    assert_eq!(def, loaded);
}

#[test]
fn json_with_defaults() {
    let path = std::env::temp_dir().join("tr_project_minimal.json");
    std::fs::write(&path, r#"{"version":1,"name":"minimal"}"#).unwrap();
    let loaded = load_json(&path).unwrap();
    assert_eq!(loaded.tick_period_ms, 1000);
    assert!(loaded.channels.is_empty());
    assert_eq!(loaded.autotune.step, 255.0);
}

#[test]
fn rejects_duplicate_and_out_of_range_indices() {
    let mut def = station();
    def.channels.push(def.channels[0].clone());
    assert!(matches!(
        validate_station(&def),
        Err(ValidationError::DuplicateIndex { index: 1, .. })
    ));

    let mut def = station();
    def.channels[0].index = 3;
    assert!(matches!(
        validate_station(&def),
        Err(ValidationError::IndexOutOfRange { index: 3, .. })
    ));

    let mut def = station();
    def.channels[0].sensor = Some(6);
    assert!(validate_station(&def).is_err());
}

#[test]
fn rejects_values_outside_admissible_ranges() {
    let cases: Vec<fn(&mut StationDef)> = vec![
        |s| s.channels[0].kp = 1500.0,
        |s| s.channels[0].setpoint = 250.0,
        |s| s.channels[0].manual_output = 300.0,
        |s| s.channels[0].output_min = 255.0,
        |s| s.channels[0].hysteresis = -1.0,
        |s| s.channels[0].alarm.alarm_high = Some(500.0),
        |s| {
            s.channels[0].alarm.warning_low = Some(50.0);
            s.channels[0].alarm.warning_high = Some(40.0);
        },
        |s| s.sensors[0].scale = 0.0,
        |s| s.tick_period_ms = 0,
        |s| s.autotune.step = 0.0,
        |s| s.version = 99,
    ];
    for (i, mutate) in cases.into_iter().enumerate() {
        let mut def = station();
        mutate(&mut def);
        assert!(validate_station(&def).is_err(), "case {i} should be rejected");
    }
}

#[test]
fn build_refuses_invalid_station() {
    let mut def = station();
    def.channels[0].ki = -1.0;
    assert!(matches!(
        def.build_engine(NullDriver),
        Err(ProjectError::Validation(_))
    ));
}
