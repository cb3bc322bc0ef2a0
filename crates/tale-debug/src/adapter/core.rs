//! Adapter core loop + request dispatch.
//! - DebugAdapter::new/session accessors
//! - run/run_stdio: protocol loop
//! - dispatch_request: route DAP requests
//! - envelope helpers: responses, events, console output

use std::cell::Cell;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::protocol::{Event, MessageType, OutputEventBody, Request, Response};
use crate::session::{Session, SessionState};

use super::protocol_io::{read_message, write_message, write_protocol_log};
use super::util::env_flag;
use super::{CoordinateConverter, DebugAdapter, DispatchOutcome, LaunchState};

const DAP_LOG_ENV: &str = "TALE_DEBUG_DAP_LOG";
const DAP_VERBOSE_ENV: &str = "TALE_DEBUG_DAP_VERBOSE";

/// Outgoing side of the loop: the client stream plus the optional transcript.
struct Transport<'a, W: Write> {
    writer: &'a mut W,
    log: Option<BufWriter<File>>,
}

impl<W: Write> Transport<'_, W> {
    fn log_incoming(&mut self, payload: &str) {
        if let Some(logger) = self.log.as_mut() {
            let _ = write_protocol_log(logger, "<-", payload);
        }
    }

    fn send(&mut self, message: &Value) -> io::Result<()> {
        let serialized = serde_json::to_string(message)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        if let Some(logger) = self.log.as_mut() {
            let _ = write_protocol_log(logger, "->", &serialized);
        }
        write_message(&mut *self.writer, &serialized)
    }
}

impl DebugAdapter {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session,
            next_seq: Cell::new(1),
            coordinate: CoordinateConverter::new(true, true),
            launch_state: LaunchState::default(),
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    #[must_use]
    pub fn into_session(self) -> Session {
        self.session
    }

    /// Run a blocking stdio loop that processes DAP requests.
    pub fn run_stdio(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut reader = BufReader::new(stdin.lock());
        let mut writer = BufWriter::new(io::stdout());
        self.run(&mut reader, &mut writer)
    }

    /// Processes framed requests from `reader` until the client disconnects
    /// or the stream closes. The session is terminated on the way out.
    pub fn run<R: BufRead, W: Write>(&mut self, reader: &mut R, writer: &mut W) -> io::Result<()> {
        let dap_log_path = std::env::var(DAP_LOG_ENV).ok();
        let log = dap_log_path
            .as_deref()
            .and_then(|path| OpenOptions::new().create(true).append(true).open(path).ok())
            .map(BufWriter::new);
        let mut transport = Transport { writer, log };

        let result = self.serve(reader, &mut transport, dap_log_path.as_deref());
        if let Err(err) = &result {
            warn!(error = %err, "transport failure");
        }
        if self.session.state() != SessionState::Terminated {
            self.session.terminate();
        }
        result
    }

    fn serve<R: BufRead, W: Write>(
        &mut self,
        reader: &mut R,
        transport: &mut Transport<'_, W>,
        dap_log_path: Option<&str>,
    ) -> io::Result<()> {
        let dap_verbose = env_flag(DAP_VERBOSE_ENV);
        let mut announced_verbose = false;

        loop {
            let payload = match read_message(reader) {
                Ok(Some(payload)) => payload,
                Ok(None) => {
                    info!("client closed the stream");
                    return Ok(());
                }
                Err(err) if err.kind() == io::ErrorKind::InvalidData => {
                    warn!(error = %err, "dropping unreadable message");
                    let response =
                        self.error_response_to(0, "", &format!("invalid message: {err}"));
                    transport.send(&response)?;
                    continue;
                }
                Err(err) => return Err(err),
            };
            transport.log_incoming(&payload);
            if dap_verbose && !announced_verbose {
                let hint = match dap_log_path {
                    Some(path) => {
                        format!("[tale-debug] DAP verbose logging enabled; raw log: {path}")
                    }
                    None => format!(
                        "[tale-debug] DAP verbose logging enabled (set {DAP_LOG_ENV}=/path for raw)"
                    ),
                };
                transport.send(&self.debug_output_message(hint))?;
                announced_verbose = true;
            }

            let request = match self.parse_request(&payload) {
                Ok(request) => request,
                Err(response) => {
                    warn!(payload = %payload, "malformed request");
                    transport.send(&response)?;
                    continue;
                }
            };

            if dap_verbose {
                let message = format!(
                    "[tale-debug][dap] dispatch: seq={} command={} state={}",
                    request.seq,
                    request.command,
                    self.session.state()
                );
                transport.send(&self.debug_output_message(message))?;
            }
            let outcome = self.dispatch_request(request);
            for message in outcome.responses.iter().chain(&outcome.events) {
                transport.send(message)?;
            }
            if outcome.should_exit {
                return Ok(());
            }
        }
    }

    /// Decodes a request, or builds the error response that answers it.
    fn parse_request(&self, payload: &str) -> Result<Request<Value>, Value> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|err| self.error_response_to(0, "", &format!("invalid json: {err}")))?;
        serde_json::from_value::<Request<Value>>(value.clone()).map_err(|err| {
            let seq = value
                .get("seq")
                .and_then(Value::as_u64)
                .and_then(|seq| u32::try_from(seq).ok())
                .unwrap_or(0);
            let command = value
                .get("command")
                .and_then(Value::as_str)
                .unwrap_or_default();
            self.error_response_to(seq, command, &format!("malformed request: {err}"))
        })
    }

    pub(super) fn dispatch_request(&mut self, request: Request<Value>) -> DispatchOutcome {
        if request.message_type != MessageType::Request {
            return DispatchOutcome::default();
        }
        debug!(seq = request.seq, command = %request.command, "dispatch");

        match request.command.as_str() {
            "initialize" => self.handle_initialize(request),
            "launch" | "attach" => self.handle_launch(request),
            "configurationDone" => self.handle_configuration_done(request),
            "disconnect" => self.handle_disconnect(request),
            "terminate" => self.handle_terminate(request),
            "setBreakpoints" => self.handle_set_breakpoints(request),
            "setExceptionBreakpoints" => self.handle_set_exception_breakpoints(request),
            "threads" => self.handle_threads(request),
            "stackTrace" => self.handle_stack_trace(request),
            "scopes" => self.handle_scopes(request),
            "variables" => self.handle_variables(request),
            "continue" => self.handle_continue(request),
            "pause" => self.handle_pause(request),
            "next" => self.handle_next(request),
            "stepIn" => self.handle_step_in(request),
            "stepOut" => self.handle_step_out(request),
            "evaluate" => self.handle_evaluate(request),
            _ => DispatchOutcome {
                responses: vec![self.error_response(&request, "unsupported command")],
                ..DispatchOutcome::default()
            },
        }
    }

    fn next_seq(&self) -> u32 {
        let seq = self.next_seq.get();
        self.next_seq.set(seq.wrapping_add(1));
        seq
    }

    pub(super) fn ok_response<T>(&self, request: &Request<Value>, body: Option<T>) -> Value
    where
        T: Serialize,
    {
        let body = body
            .map(|payload| serde_json::to_value(payload))
            .transpose()
            .unwrap_or(None);
        let response = Response {
            seq: self.next_seq(),
            message_type: MessageType::Response,
            request_seq: request.seq,
            success: true,
            command: request.command.clone(),
            message: None,
            body,
        };
        serde_json::to_value(response).unwrap_or(Value::Null)
    }

    pub(super) fn error_response(&self, request: &Request<Value>, message: &str) -> Value {
        self.error_response_to(request.seq, &request.command, message)
    }

    fn error_response_to(&self, request_seq: u32, command: &str, message: &str) -> Value {
        let response: Response<Value> = Response {
            seq: self.next_seq(),
            message_type: MessageType::Response,
            request_seq,
            success: false,
            command: command.to_string(),
            message: Some(message.to_string()),
            body: None,
        };
        serde_json::to_value(response).unwrap_or(Value::Null)
    }

    /// Rejects a request that the current session state does not allow.
    pub(super) fn state_error(&self, request: &Request<Value>) -> DispatchOutcome {
        let message = format!(
            "cannot {} while session is {}",
            request.command,
            self.session.state()
        );
        DispatchOutcome {
            responses: vec![self.error_response(request, &message)],
            ..DispatchOutcome::default()
        }
    }

    pub(super) fn event<T>(&self, name: &str, body: Option<T>) -> Value
    where
        T: Serialize,
    {
        let body = body
            .map(|payload| serde_json::to_value(payload))
            .transpose()
            .unwrap_or(None);
        let event = Event {
            seq: self.next_seq(),
            message_type: MessageType::Event,
            event: name.to_string(),
            body,
        };
        serde_json::to_value(event).unwrap_or(Value::Null)
    }

    pub(super) fn debug_output_message(&self, message: impl Into<String>) -> Value {
        let output = format!("{}\n", message.into());
        let body = OutputEventBody {
            output,
            category: Some("console".to_string()),
            source: None,
            line: None,
        };
        self.event("output", Some(body))
    }

    pub(super) fn to_client_line(&self, line: u32) -> u32 {
        self.coordinate.to_client_line(line)
    }

    pub(super) fn to_client_column(&self, column: u32) -> u32 {
        self.coordinate.to_client_column(column)
    }

    pub(super) fn to_story_line(&self, line: u32) -> u32 {
        self.coordinate.to_story_line(line)
    }
}
