//! Protocol round trips against a live engine.

use serde_json::Value;
use tr_core::{NUM_CHANNELS, NUM_SENSORS};
use tr_engine::{EngineConfig, RegulationEngine};
use tr_io::{EnableLatch, NullDriver, RecordingSink, SensorBank};
use tr_protocol::{CommandSession, MAX_COMMAND_LEN};

type Engine = RegulationEngine<SensorBank<NullDriver>, EnableLatch>;

fn engine() -> Engine {
    RegulationEngine::new(
        EngineConfig::default(),
        SensorBank::new(NullDriver),
        EnableLatch::new([true; NUM_CHANNELS]),
    )
    .unwrap()
}

fn send(engine: &mut Engine, line: &str) -> Value {
    let resp = CommandSession::handle_line(line, engine, 1000);
    serde_json::from_str(&resp.to_json()).unwrap()
}

#[test]
fn get_status_returns_full_snapshot() {
    let mut engine = engine();
    let v = send(&mut engine, r#"{"command":"getStatus"}"#);
    assert_eq!(v["command"], "getStatus");
    assert_eq!(v["timestamp"], 1000);
    assert_eq!(v["status"], "ok");
    assert_eq!(v["sensors"].as_array().unwrap().len(), NUM_SENSORS);
    assert_eq!(v["thermostats"].as_array().unwrap().len(), NUM_CHANNELS);
    assert_eq!(v["alarms"].as_array().unwrap().len(), NUM_CHANNELS);
    assert_eq!(v["config"]["pids"].as_array().unwrap().len(), NUM_CHANNELS);
    assert_eq!(v["config"]["alarms"][0]["warningLow"], -999.0);
    assert_eq!(v["config"]["pids"][1]["enabled"], false);
    assert_eq!(v["config"]["pids"][1]["sensorIndex"], -1);
    assert_eq!(v["thermostats"][2]["regulator_id"], 2);
    assert!(v.get("error").is_none());
}

#[test]
fn set_config_applies_valid_fields_only() {
    let mut engine = engine();
    let v = send(
        &mut engine,
        r#"{"command":"setConfig","regulator_id":1,"kp":12,"ki":5000,"setpoint":55,"sensorIndex":2,"warningHigh":300}"#,
    );
    assert_eq!(v["status"], "configured");
    let pid = &v["config"]["pids"][1];
    assert_eq!(pid["kp"], 12.0);
    assert_eq!(pid["ki"], 5.0);
    assert_eq!(pid["setpoint"], 55.0);
    assert_eq!(pid["sensorIndex"], 2);
    assert_eq!(v["config"]["alarms"][1]["warningHigh"], 999.0);
    let rejected: Vec<&str> = v["rejected"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.as_str().unwrap())
        .collect();
    assert_eq!(rejected, vec!["ki", "warning_high"]);
}

#[test]
fn set_config_array_form() {
    let mut engine = engine();
    let v = send(
        &mut engine,
        r#"{"command":"setConfig","pids":[{"setpoint":30},{"setpoint":40},{"setpoint":50}],"alarms":[{"regulator_id":2,"resetMode":1}]}"#,
    );
    let pids = v["config"]["pids"].as_array().unwrap();
    let setpoints: Vec<f64> = pids.iter().map(|p| p["setpoint"].as_f64().unwrap()).collect();
    assert_eq!(setpoints, vec![30.0, 40.0, 50.0]);
    assert_eq!(v["config"]["alarms"][2]["resetMode"], 1);
    assert_eq!(v["config"]["alarms"][0]["resetMode"], 0);
}

#[test]
fn invalid_channel_is_a_communication_error() {
    let mut engine = engine();
    for line in [
        r#"{"command":"ackAlarm","regulator_id":7}"#,
        r#"{"command":"setConfig","regulator_id":-1,"kp":1}"#,
        r#"{"command":"toggleEnable"}"#,
    ] {
        let v = send(&mut engine, line);
        assert_eq!(v["errorCode"], 1, "{line}");
        assert!(v.get("sensors").is_none(), "{line}");
        assert!(v.get("status").is_none(), "{line}");
    }
    assert_eq!(engine.slot(tr_core::ChannelId::new(0).unwrap()).channel.config().gains.kp, 2.0);
}

#[test]
fn malformed_and_unknown_commands() {
    let mut engine = engine();
    let v = send(&mut engine, "{oops");
    assert_eq!(v["error"], "Invalid JSON");
    assert!(v.get("command").is_none());

    let v = send(&mut engine, r#"{"regulator_id":1}"#);
    assert_eq!(v["error"], "Missing command");

    let v = send(&mut engine, r#"{"command":"selfDestruct"}"#);
    assert_eq!(v["error"], "Unknown command");
    assert_eq!(v["command"], "selfDestruct");
    assert_eq!(v["errorCode"], 1);
}

#[test]
fn toggle_twice_restores_enable() {
    let mut engine = engine();
    let first = send(&mut engine, r#"{"command":"toggleEnable","regulator_id":0}"#);
    assert_eq!(first["status"], "toggled");
    assert_eq!(first["regulator_id"], 0);
    assert_eq!(first["enabled"], false);
    let second = send(&mut engine, r#"{"command":"toggleEnable","regulator_id":0}"#);
    assert_eq!(second["enabled"], true);
    let explicit = send(
        &mut engine,
        r#"{"command":"toggleEnable","regulator_id":0,"enabled":true}"#,
    );
    assert_eq!(explicit["enabled"], true);
}

#[test]
fn simulation_shows_up_in_snapshot() {
    let mut engine = engine();
    let v = send(
        &mut engine,
        r#"{"command":"setSimulation","sensorIndex":4,"simulated":true,"value":37.5}"#,
    );
    assert_eq!(v["status"], "simulation_set");
    let sensor = &v["sensors"][4];
    assert_eq!(sensor["sensor_id"], 4);
    assert_eq!(sensor["temperature"], 37.5);
    assert_eq!(sensor["health"], 0);
    assert_eq!(sensor["simulated"], true);
}

#[test]
fn autotune_lifecycle_over_the_wire() {
    let mut engine = engine();
    let v = send(&mut engine, r#"{"command":"startAutotune","regulator_id":0}"#);
    assert_eq!(v["errorCode"], 1, "disabled channel cannot tune");

    send(
        &mut engine,
        r#"{"command":"setConfig","regulator_id":0,"enabled":true,"sensorIndex":0}"#,
    );
    send(
        &mut engine,
        r#"{"command":"setSimulation","sensorIndex":0,"simulated":true,"value":15}"#,
    );
    let v = send(
        &mut engine,
        r#"{"command":"startAutotune","regulator_id":0,"outputStep":120}"#,
    );
    assert_eq!(v["status"], "autotune_started");
    assert_eq!(v["thermostats"][0]["state"], 2);

    engine.tick(2000, &mut RecordingSink::default());
    let v = send(&mut engine, r#"{"command":"getStatus"}"#);
    assert_eq!(v["thermostats"][0]["output"], 120.0);

    let v = send(&mut engine, r#"{"command":"cancelAutotune","regulator_id":0}"#);
    assert_eq!(v["status"], "autotune_cancelled");
    assert_eq!(v["thermostats"][0]["state"], 0);
    let v = send(&mut engine, r#"{"command":"cancelAutotune","regulator_id":0}"#);
    assert_eq!(v["status"], "not_tuning");

    let v = send(&mut engine, r#"{"command":"setState","regulator_id":0,"state":2}"#);
    assert_eq!(v["errorCode"], 1);
    let v = send(&mut engine, r#"{"command":"setState","regulator_id":0,"state":1}"#);
    assert_eq!(v["status"], "state_set");
    assert_eq!(v["thermostats"][0]["state"], 1);
}

#[test]
fn stream_overflow_then_recovers() {
    let mut engine = engine();
    let mut session = CommandSession::new();
    let mut input = vec![b'{'; MAX_COMMAND_LEN + 1];
    input.extend_from_slice(b"garbage\n{\"command\":\"getStatus\"}\r\n");
    let responses = session.feed(&input, &mut engine, 0);
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].error.as_deref(), Some("Command too long"));
    assert!(responses[0].snapshot.is_none());
    assert_eq!(responses[1].status, Some("ok"));
}
