//! Request execution against a running engine.

use serde_json::Value;
use tracing::{debug, warn};
use tr_engine::RegulationEngine;
use tr_io::{EnableInput, SensorPort};

use crate::error::{ProtocolError, ProtocolResult};
use crate::framing::{Frame, LineAssembler};
use crate::request::{Request, command_name};
use crate::response::{Response, StatusWire};

/// Command stream attached to one engine.
///
/// Commands are executed between ticks; none of them blocks or touches the
/// tick schedule.
#[derive(Debug, Clone, Default)]
pub struct CommandSession {
    framer: LineAssembler,
}

impl CommandSession {
    pub fn new() -> Self {
        Self {
            framer: LineAssembler::new(),
        }
    }

    /// Frame `input` and answer every complete command in it.
    pub fn feed<S: SensorPort, E: EnableInput>(
        &mut self,
        input: &[u8],
        engine: &mut RegulationEngine<S, E>,
        now_ms: u64,
    ) -> Vec<Response> {
        self.framer
            .feed(input)
            .into_iter()
            .map(|frame| match frame {
                Frame::Line(line) => Self::handle_line(&line, engine, now_ms),
                Frame::Overflow => Response::error(None, None, &ProtocolError::CommandTooLong),
            })
            .collect()
    }

    /// Answer one command line.
    pub fn handle_line<S: SensorPort, E: EnableInput>(
        line: &str,
        engine: &mut RegulationEngine<S, E>,
        now_ms: u64,
    ) -> Response {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "rejecting malformed command");
                return Response::error(None, None, &ProtocolError::InvalidJson);
            }
        };
        let command = match command_name(&value) {
            Ok(c) => c,
            Err(e) => {
                warn!("rejecting command without a name");
                return Response::error(None, None, &e);
            }
        };

        let result =
            Request::from_value(command, &value).and_then(|req| Self::execute(req, engine, now_ms));
        match result {
            Ok(mut response) => {
                response.command = Some(command.to_string());
                response.timestamp = Some(now_ms);
                debug!(command, status = ?response.status, "command handled");
                response
            }
            Err(e) => {
                warn!(command, error = %e, "command refused");
                Response::error(Some(command), Some(now_ms), &e)
            }
        }
    }

    fn execute<S: SensorPort, E: EnableInput>(
        request: Request,
        engine: &mut RegulationEngine<S, E>,
        now_ms: u64,
    ) -> ProtocolResult<Response> {
        let name = request.name();
        let mut rejected = Vec::new();
        let mut toggled = None;

        let status = match request {
            Request::GetStatus => "ok",
            Request::SetConfig(targets) => {
                for target in targets {
                    if !target.controller.is_empty() {
                        let outcome = engine.patch_controller(target.channel, &target.controller)?;
                        rejected.extend(outcome.rejected);
                    }
                    if !target.alarm.is_empty() {
                        let outcome = engine.patch_alarm(target.channel, &target.alarm)?;
                        rejected.extend(outcome.rejected);
                    }
                }
                "configured"
            }
            Request::AckAlarm { channel } => {
                engine.acknowledge(channel);
                "acknowledged"
            }
            Request::SetSimulation {
                sensor,
                simulated,
                value,
            } => {
                engine.set_simulation(sensor, simulated, value);
                "simulation_set"
            }
            Request::ToggleEnable { channel, enabled } => {
                let enabled = engine.toggle_enable(channel, enabled);
                toggled = Some((i64::from(channel), enabled));
                "toggled"
            }
            Request::StartAutotune { channel, step } => {
                engine.start_autotune(channel, step, now_ms)?;
                "autotune_started"
            }
            Request::CancelAutotune { channel } => {
                if engine.cancel_autotune(channel) {
                    "autotune_cancelled"
                } else {
                    "not_tuning"
                }
            }
            Request::SetState { channel, state } => {
                engine.set_state(channel, state)?;
                "state_set"
            }
        };

        let mut response = Response::ok(
            name,
            now_ms,
            status,
            StatusWire::from_snapshot(&engine.snapshot()),
        );
        response.rejected = rejected;
        if let Some((regulator_id, enabled)) = toggled {
            response.regulator_id = Some(regulator_id);
            response.enabled = Some(enabled);
        }
        Ok(response)
    }
}
