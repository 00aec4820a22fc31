//! Newline-delimited JSON command protocol for thermoreg.
//!
//! Every request is one JSON object on one line with a `command` field.
//! Every response is one JSON object on one line that echoes the command and
//! a timestamp and, unless the request failed, carries the full status
//! snapshot:
//!
//! ```text
//! → {"command":"ackAlarm","regulator_id":1}
//! ← {"command":"ackAlarm","timestamp":5000,"status":"acknowledged","sensors":[..],"thermostats":[..],"alarms":[..],"config":{..}}
//! → {"command":"ackAlarm","regulator_id":9}
//! ← {"command":"ackAlarm","timestamp":5000,"error":"Invalid regulator_id","errorCode":1}
//! ```
//!
//! - [`LineAssembler`] frames a byte stream into command lines
//! - [`Request::parse`] decodes one line
//! - [`CommandSession`] runs requests against a
//!   [`RegulationEngine`](tr_engine::RegulationEngine) and builds responses

pub mod error;
pub mod framing;
pub mod request;
pub mod response;
pub mod session;

pub use error::{ProtocolError, ProtocolResult};
pub use framing::{Frame, LineAssembler, MAX_COMMAND_LEN};
pub use request::{ConfigTarget, Request};
pub use response::{Response, StatusWire};
pub use session::CommandSession;
