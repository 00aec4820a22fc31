//! End-to-end regulation scenarios driven through the engine tick.

use tr_alarms::{AlarmLevel, ResetMode};
use tr_controls::{ControlLaw, ControllerState, TuneOutcome};
use tr_core::{ChannelId, FaultCode, NUM_CHANNELS, NUM_SENSORS, SensorId};
use tr_engine::{AlarmPatch, ControllerPatch, EngineConfig, RegulationEngine};
use tr_io::{
    Acquisition, EnableLatch, RecordingSink, SensorBank, SensorDriver, SensorPort,
};

/// Hardware stand-in whose sensors can be unplugged.
#[derive(Default)]
struct Bench {
    values: [f64; NUM_SENSORS],
    unplugged: [bool; NUM_SENSORS],
}

impl SensorDriver for Bench {
    fn acquire(&mut self, sensor: SensorId) -> Acquisition {
        if self.unplugged[sensor.index()] {
            Acquisition::Disconnected
        } else {
            Acquisition::Value(self.values[sensor.index()])
        }
    }
}

type Engine = RegulationEngine<SensorBank<Bench>, EnableLatch>;

fn ch(i: i64) -> ChannelId {
    ChannelId::new(i).unwrap()
}

fn sensor(i: i64) -> SensorId {
    SensorId::new(i).unwrap()
}

fn engine_with(config: EngineConfig) -> Engine {
    RegulationEngine::new(
        config,
        SensorBank::new(Bench::default()),
        EnableLatch::new([true; NUM_CHANNELS]),
    )
    .expect("default configuration is valid")
}

fn engine() -> Engine {
    engine_with(EngineConfig::default())
}

#[test]
fn pid_heats_toward_setpoint() {
    let mut engine = engine();
    engine.set_simulation(sensor(0), Some(true), Some(40.0));
    let patch = ControllerPatch {
        law: Some(ControlLaw::Pid.code() as i64),
        setpoint: Some(50.0),
        sensor: Some(0),
        enabled: Some(true),
        ..ControllerPatch::default()
    };
    assert!(engine.patch_controller(ch(0), &patch).unwrap().is_clean());

    let mut sink = RecordingSink::default();
    let report = engine.tick(1000, &mut sink);

    assert!(report.outputs[0] > 0.0);
    let status = engine.slot(ch(0)).channel.status();
    assert!(status.output_active);
    assert_eq!(status.state, ControllerState::Running);
    assert!(sink.command(ch(0)).duty > 0);
}

#[test]
fn alarm_low_boundary_forces_output_off() {
    let mut engine = engine();
    let alarm = AlarmPatch {
        warning_low: Some(10.0),
        warning_high: Some(90.0),
        alarm_low: Some(0.0),
        alarm_high: Some(100.0),
        ..AlarmPatch::default()
    };
    assert!(engine.patch_alarm(ch(1), &alarm).unwrap().is_clean());
    let controller = ControllerPatch {
        law: Some(ControlLaw::Manual.code() as i64),
        manual_output: Some(200.0),
        sensor: Some(1),
        enabled: Some(true),
        ..ControllerPatch::default()
    };
    engine.patch_controller(ch(1), &controller).unwrap();
    engine.set_simulation(sensor(1), Some(true), Some(0.0));

    let mut sink = RecordingSink::default();
    let report = engine.tick(0, &mut sink);

    assert_eq!(engine.slot(ch(1)).alarm.level(), AlarmLevel::Alarm);
    assert_eq!(report.outputs[1], 0.0);
    assert!(sink.indicators(ch(1)).alarm);
    assert!(!sink.indicators(ch(1)).warning);
}

#[test]
fn sensor_failure_degrades_only_its_channel() {
    let mut engine = engine();
    for (c, s) in [(0, 0), (2, 2)] {
        let patch = ControllerPatch {
            law: Some(ControlLaw::Manual.code() as i64),
            manual_output: Some(50.0),
            sensor: Some(s),
            enabled: Some(true),
            ..ControllerPatch::default()
        };
        engine.patch_controller(ch(c), &patch).unwrap();
    }
    engine.sensors_mut().driver_mut().values = [25.0; NUM_SENSORS];

    let mut sink = RecordingSink::default();
    let report = engine.tick(0, &mut sink);
    assert_eq!(report.outputs[0], 50.0);
    assert_eq!(report.outputs[2], 50.0);

    engine.sensors_mut().driver_mut().unplugged[2] = true;
    let report = engine.tick(1000, &mut sink);
    let alarm = engine.slot(ch(2)).alarm.state();
    assert_eq!(alarm.level, AlarmLevel::Technical);
    assert_eq!(alarm.fault, FaultCode::SensorDisconnected);
    assert_eq!(report.outputs[2], 0.0);
    assert_eq!(report.outputs[0], 50.0);
    assert!(sink.indicators(ch(2)).alarm);

    engine.sensors_mut().driver_mut().unplugged[2] = false;
    let report = engine.tick(2000, &mut sink);
    assert_eq!(engine.slot(ch(2)).alarm.level(), AlarmLevel::None);
    assert_eq!(report.outputs[2], 50.0);

    // Process evaluation resumed.
    let alarm = AlarmPatch {
        warning_high: Some(20.0),
        ..AlarmPatch::default()
    };
    engine.patch_alarm(ch(2), &alarm).unwrap();
    engine.tick(3000, &mut sink);
    assert_eq!(engine.slot(ch(2)).alarm.level(), AlarmLevel::Warning);
}

#[test]
fn stale_sensor_times_out() {
    struct Silent;
    impl SensorDriver for Silent {
        fn acquire(&mut self, _: SensorId) -> Acquisition {
            Acquisition::Pending
        }
    }

    let mut engine = RegulationEngine::new(
        EngineConfig::default(),
        SensorBank::new(Silent),
        EnableLatch::new([true; NUM_CHANNELS]),
    )
    .unwrap();
    let patch = ControllerPatch {
        sensor: Some(3),
        enabled: Some(true),
        ..ControllerPatch::default()
    };
    engine.patch_controller(ch(0), &patch).unwrap();
    engine.tick(0, &mut RecordingSink::default());
    assert_eq!(
        engine.slot(ch(0)).alarm.state().fault,
        FaultCode::SensorTimeout
    );
    assert_eq!(engine.sensors().read(sensor(3)).value, None);
}

#[test]
fn manual_ack_holds_until_acknowledged() {
    let mut engine = engine();
    let alarm = AlarmPatch {
        warning_low: Some(10.0),
        warning_high: Some(90.0),
        alarm_low: Some(0.0),
        alarm_high: Some(100.0),
        reset_mode: Some(ResetMode::ManualAck.code() as i64),
        ..AlarmPatch::default()
    };
    engine.patch_alarm(ch(0), &alarm).unwrap();
    engine
        .patch_controller(
            ch(0),
            &ControllerPatch {
                sensor: Some(0),
                ..ControllerPatch::default()
            },
        )
        .unwrap();

    let mut sink = RecordingSink::default();
    engine.set_simulation(sensor(0), Some(true), Some(120.0));
    engine.tick(0, &mut sink);
    assert_eq!(engine.slot(ch(0)).alarm.level(), AlarmLevel::Alarm);

    // Acknowledge while the condition is present only silences.
    engine.acknowledge(ch(0));
    engine.tick(1000, &mut sink);
    assert_eq!(engine.slot(ch(0)).alarm.level(), AlarmLevel::Alarm);
    assert!(!sink.indicators(ch(0)).alarm);

    engine.set_simulation(sensor(0), None, Some(50.0));
    engine.tick(2000, &mut sink);
    assert_eq!(engine.slot(ch(0)).alarm.level(), AlarmLevel::Alarm);

    engine.acknowledge(ch(0));
    assert_eq!(engine.slot(ch(0)).alarm.level(), AlarmLevel::None);
}

#[test]
fn autotune_commits_gains_after_session() {
    let mut config = EngineConfig::default();
    config.autotune.session_ms = 10_000;
    config.channels[0].controller.setpoint = 50.0;
    let mut engine = engine_with(config);
    engine
        .patch_controller(
            ch(0),
            &ControllerPatch {
                sensor: Some(0),
                enabled: Some(true),
                ..ControllerPatch::default()
            },
        )
        .unwrap();
    engine.set_simulation(sensor(0), Some(true), Some(45.0));
    engine.start_autotune(ch(0), Some(100.0), 0).unwrap();

    let mut sink = RecordingSink::default();
    let mut t = 0;
    while t < 10_000 {
        let value = if (t / 1000) % 2 == 0 { 45.0 } else { 55.0 };
        engine.set_simulation(sensor(0), None, Some(value));
        let report = engine.tick(t, &mut sink);
        let expected = if value > 50.0 { 0.0 } else { 100.0 };
        assert_eq!(report.outputs[0], expected);
        assert_eq!(engine.slot(ch(0)).channel.state(), ControllerState::Tuning);
        t += 1000;
    }

    engine.tick(t, &mut sink);
    let channel = &engine.slot(ch(0)).channel;
    assert_eq!(channel.state(), ControllerState::Running);
    let Some(TuneOutcome::Completed(report)) = channel.runtime().last_tune else {
        panic!("expected a completed tune, got {:?}", channel.runtime().last_tune);
    };
    assert!((report.amplitude - 5.0).abs() < 1e-9);
    assert_eq!(channel.config().gains, report.gains);
    assert!(report.gains.kp > 0.0 && report.gains.ki > 0.0 && report.gains.kd > 0.0);
}

#[test]
fn tune_ending_with_enable_off_emits_nothing() {
    let mut config = EngineConfig::default();
    config.autotune.session_ms = 5_000;
    config.channels[0].controller.setpoint = 50.0;
    let mut engine = engine_with(config);
    engine
        .patch_controller(
            ch(0),
            &ControllerPatch {
                sensor: Some(0),
                enabled: Some(true),
                ..ControllerPatch::default()
            },
        )
        .unwrap();
    engine.set_simulation(sensor(0), Some(true), Some(45.0));
    engine.start_autotune(ch(0), Some(100.0), 0).unwrap();
    assert!(!engine.toggle_enable(ch(0), Some(false)));

    let mut sink = RecordingSink::default();
    for t in (0..5_000).step_by(1000) {
        let value = if (t / 1000) % 2 == 0 { 45.0 } else { 55.0 };
        engine.set_simulation(sensor(0), None, Some(value));
        engine.tick(t, &mut sink);
    }
    assert_eq!(engine.slot(ch(0)).channel.state(), ControllerState::Tuning);

    engine.set_simulation(sensor(0), None, Some(40.0));
    let report = engine.tick(5_000, &mut sink);
    assert_eq!(engine.slot(ch(0)).channel.state(), ControllerState::Running);
    assert!(!report.gates[0]);
    assert_eq!(report.outputs[0], 0.0);
    assert_eq!(sink.command(ch(0)).duty, 0);
}

#[test]
fn flat_response_fails_tune_and_keeps_gains() {
    let mut config = EngineConfig::default();
    config.autotune.session_ms = 5_000;
    let mut engine = engine_with(config);
    engine
        .patch_controller(
            ch(1),
            &ControllerPatch {
                sensor: Some(1),
                enabled: Some(true),
                ..ControllerPatch::default()
            },
        )
        .unwrap();
    engine.set_simulation(sensor(1), Some(true), Some(15.0));
    let before = engine.slot(ch(1)).channel.config().gains;
    engine.start_autotune(ch(1), None, 0).unwrap();

    let mut sink = RecordingSink::default();
    for t in (0..=5_000).step_by(1000) {
        engine.tick(t, &mut sink);
    }

    let channel = &engine.slot(ch(1)).channel;
    assert_eq!(channel.state(), ControllerState::Idle);
    assert!(matches!(
        channel.runtime().last_tune,
        Some(TuneOutcome::Failed(_))
    ));
    assert_eq!(channel.config().gains, before);
}

#[test]
fn cancel_discards_session() {
    let mut engine = engine();
    engine
        .patch_controller(
            ch(2),
            &ControllerPatch {
                sensor: Some(2),
                enabled: Some(true),
                ..ControllerPatch::default()
            },
        )
        .unwrap();
    engine.set_simulation(sensor(2), Some(true), Some(10.0));
    let before = engine.slot(ch(2)).channel.config().gains;
    engine.start_autotune(ch(2), None, 0).unwrap();
    engine.tick(0, &mut RecordingSink::default());

    assert!(engine.cancel_autotune(ch(2)));
    assert!(!engine.cancel_autotune(ch(2)));
    let report = engine.tick(1000, &mut RecordingSink::default());
    let channel = &engine.slot(ch(2)).channel;
    assert_eq!(channel.state(), ControllerState::Idle);
    assert_eq!(channel.runtime().last_tune, Some(TuneOutcome::Cancelled));
    assert_eq!(channel.config().gains, before);
    assert_eq!(report.outputs[2], 0.0);
}
