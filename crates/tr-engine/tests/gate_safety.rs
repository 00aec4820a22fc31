//! Output gating holds for every law, state and enable combination.

use proptest::prelude::*;
use tr_alarms::AlarmLevel;
use tr_controls::ControllerState;
use tr_core::{ChannelId, NUM_CHANNELS, SensorId};
use tr_engine::{AlarmPatch, ControllerPatch, EngineConfig, RegulationEngine};
use tr_io::{EnableLatch, NullDriver, RecordingSink, SensorBank};

#[derive(Debug, Clone)]
enum Action {
    Value(f64),
    Unplug,
    Law(i64),
    Enable(bool),
    Toggle,
    Tune,
    Force(i64),
    Ack,
}

fn action() -> impl Strategy<Value = Action> {
    prop_oneof![
        4 => (-20.0..130.0_f64).prop_map(Action::Value),
        1 => Just(Action::Unplug),
        1 => (0_i64..3).prop_map(Action::Law),
        1 => any::<bool>().prop_map(Action::Enable),
        1 => Just(Action::Toggle),
        1 => Just(Action::Tune),
        1 => prop_oneof![Just(0_i64), Just(1), Just(3), Just(4)].prop_map(Action::Force),
        1 => Just(Action::Ack),
    ]
}

proptest! {
    #[test]
    fn closed_gate_means_zero_output(actions in prop::collection::vec(action(), 1..60)) {
        let mut config = EngineConfig::default();
        config.autotune.session_ms = 5_000;
        let mut engine = RegulationEngine::new(
            config,
            SensorBank::new(NullDriver),
            EnableLatch::new([true; NUM_CHANNELS]),
        )
        .unwrap();
        let ch = ChannelId::new(0).unwrap();
        let sensor = SensorId::new(0).unwrap();

        engine.patch_alarm(ch, &AlarmPatch {
            warning_low: Some(10.0),
            warning_high: Some(90.0),
            alarm_low: Some(0.0),
            alarm_high: Some(100.0),
            ..AlarmPatch::default()
        }).unwrap();
        engine.patch_controller(ch, &ControllerPatch {
            sensor: Some(0),
            manual_output: Some(120.0),
            setpoint: Some(50.0),
            ..ControllerPatch::default()
        }).unwrap();
        engine.set_simulation(sensor, Some(true), Some(50.0));

        let mut sink = RecordingSink::default();
        for (i, action) in actions.into_iter().enumerate() {
            let now = i as u64 * 1000;
            match action {
                Action::Value(v) => engine.set_simulation(sensor, Some(true), Some(v)),
                Action::Unplug => engine.set_simulation(sensor, Some(false), None),
                Action::Law(code) => {
                    engine.patch_controller(ch, &ControllerPatch { law: Some(code), ..ControllerPatch::default() }).unwrap();
                }
                Action::Enable(on) => {
                    engine.patch_controller(ch, &ControllerPatch { enabled: Some(on), ..ControllerPatch::default() }).unwrap();
                }
                Action::Toggle => {
                    engine.toggle_enable(ch, None);
                }
                Action::Tune => {
                    let _ = engine.start_autotune(ch, None, now);
                }
                Action::Force(code) => {
                    if let Some(state) = ControllerState::from_code(code) {
                        engine.set_state(ch, state).unwrap();
                    }
                }
                Action::Ack => engine.acknowledge(ch),
            }

            let report = engine.tick(now, &mut sink);
            let slot = engine.slot(ch);
            if slot.alarm.level() >= AlarmLevel::Alarm {
                prop_assert_eq!(report.outputs[0], 0.0);
                prop_assert_eq!(sink.command(ch).duty, 0);
                prop_assert_ne!(slot.channel.state(), ControllerState::Tuning);
            }
            if !report.gates[0] && slot.channel.state() != ControllerState::Tuning {
                prop_assert_eq!(report.outputs[0], 0.0);
                prop_assert_eq!(sink.command(ch).duty, 0);
            }
            let runtime = slot.channel.runtime();
            prop_assert_eq!(runtime.session.is_some(), runtime.state == ControllerState::Tuning);
            let cfg = slot.channel.config();
            prop_assert!(report.outputs[0] == 0.0
                || (report.outputs[0] >= cfg.output_min && report.outputs[0] <= cfg.output_max));
        }
    }
}
