//! Controller client.

use crate::config::{ClientConfig, PollConfig};
use crate::gcode::{self, Move, Positioning};
use crate::poll::{PollOutcome, poll_until};
use crate::status::MachineStatus;
use crate::tool::{Axes, Tool, ToolView, Xyz};
use crate::transport::{HttpTransport, Transport};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

const SERVER_INFO: &str = "/server/info";
const PRINTER_INFO: &str = "/printer/info";
const OBJECTS_LIST: &str = "/printer/objects/list";
const OBJECTS_QUERY: &str = "/printer/objects/query";
const GCODE_SCRIPT: &str = "/printer/gcode/script";

const PRINTER_NAME: &str = "My Klipper";
const FIRMWARE_NAME: &str = "klipper";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ServerInfo {
    klippy_state: String,
}

#[derive(Debug, Deserialize)]
struct PrinterState {
    state: String,
}

#[derive(Debug, Deserialize)]
struct ObjectList {
    objects: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectQuery {
    status: HashMap<String, HashMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Serializable view of a connected printer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrinterSnapshot {
    pub address: String,
    pub name: String,
    pub nickname: String,
    pub controller: String,
    pub version: String,
    pub tools: Vec<ToolView>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// A connected controller and the tools it reported at connect time.
///
/// All calls block the current thread. Tool changes and moves poll the
/// controller until it reports idle or the configured timeout runs out.
pub struct Printer<T: Transport = HttpTransport> {
    config: ClientConfig,
    transport: T,
    firmware_version: String,
    tools: Vec<Tool>,
}

impl Printer<HttpTransport> {
    /// Connect over HTTP, check readiness and discover tools.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Printer<T> {
    /// Connect through an existing transport.
    ///
    /// Fails with [`Error::UnknownController`] unless the controller reports
    /// `ready`, then reads the offsets of every tool object it lists.
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self> {
        debug!(url = config.base_url(), "starting client");

        let mut printer = Self {
            config: config.clone(),
            transport,
            firmware_version: String::new(),
            tools: Vec::new(),
        };

        let state = printer.klippy_state()?;
        if state != "ready" {
            error!(url = printer.base_url(), %state, "unknown controller");
            return Err(Error::UnknownController(format!(
                "{} reports klippy state '{state}'",
                printer.base_url()
            )));
        }

        printer.tools = printer.discover_tools()?;
        info!(
            url = printer.base_url(),
            tools = printer.tools.len(),
            "connected to {FIRMWARE_NAME}"
        );
        Ok(printer)
    }

    fn discover_tools(&self) -> Result<Vec<Tool>> {
        let count = self.tool_count()?;
        (0..count)
            .map(|index| {
                let offset = self.tool_offset(index)?;
                info!(
                    tool = index,
                    x = offset.x,
                    y = offset.y,
                    z = offset.z,
                    "adding tool"
                );
                Ok(Tool::new(index, self.config.objects.tool(index), offset))
            })
            .collect()
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    pub fn nickname(&self) -> &str {
        &self.config.nickname
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Tools discovered at connect time, indexed from 0.
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn tool(&self, index: usize) -> Option<&Tool> {
        self.tools.get(index)
    }

    pub fn snapshot(&self) -> PrinterSnapshot {
        PrinterSnapshot {
            address: self.base_url().to_string(),
            name: PRINTER_NAME.to_string(),
            nickname: self.config.nickname.clone(),
            controller: FIRMWARE_NAME.to_string(),
            version: self.firmware_version.clone(),
            tools: self.tools.iter().map(Tool::view).collect(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    /// GET an endpoint and return its `result` payload.
    ///
    /// An `error` payload becomes [`Error::Controller`].
    pub fn query(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let mut body = self.transport.get(path, params)?;

        if let Some(err) = body.get("error") {
            let message = serde_json::from_value::<ErrorBody>(err.clone())
                .map(|e| e.message)
                .unwrap_or_else(|_| err.to_string());
            return Err(Error::Controller(message));
        }

        match body.get_mut("result") {
            Some(result) => Ok(result.take()),
            None => Err(Error::InvalidResponse(format!(
                "{path}: neither result nor error in response"
            ))),
        }
    }

    /// Query and decode, reporting controller errors and bad shapes as `kind`.
    /// Failures are logged before they are returned.
    fn query_as<R: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        kind: fn(String) -> Error,
    ) -> Result<R> {
        self.decode_query(path, params, kind)
            .inspect_err(|e| error!(path, url = self.base_url(), "{e}"))
    }

    fn decode_query<R: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
        kind: fn(String) -> Error,
    ) -> Result<R> {
        let result = self.query(path, params).map_err(|e| match e {
            Error::Controller(message) => kind(message),
            other => other,
        })?;
        serde_json::from_value(result).map_err(|e| kind(format!("{path}: {e}")))
    }

    /// Read one property of one printer object, logging failures.
    fn query_object<R: DeserializeOwned>(
        &self,
        object: &str,
        property: &str,
        kind: fn(String) -> Error,
    ) -> Result<R> {
        self.decode_object(object, property, kind)
            .inspect_err(|e| error!(object, property, "{e}"))
    }

    fn decode_object<R: DeserializeOwned>(
        &self,
        object: &str,
        property: &str,
        kind: fn(String) -> Error,
    ) -> Result<R> {
        let mut reply: ObjectQuery = self.decode_query(OBJECTS_QUERY, &[(object, property)], kind)?;
        let value = reply
            .status
            .get_mut(object)
            .and_then(|props| props.remove(property))
            .ok_or_else(|| kind(format!("{object}.{property} missing from response")))?;
        serde_json::from_value(value).map_err(|e| kind(format!("{object}.{property}: {e}")))
    }

    /// Host state as reported by `/server/info` (`ready`, `startup`, ...).
    pub fn klippy_state(&self) -> Result<String> {
        let info: ServerInfo = self.query_as(SERVER_INFO, &[], Error::Status)?;
        Ok(info.klippy_state)
    }

    /// Number of tool objects the controller lists.
    pub fn tool_count(&self) -> Result<usize> {
        debug!("querying tool count");
        let list: ObjectList = self.query_as(OBJECTS_LIST, &[], Error::ToolDetection)?;
        Ok(list
            .objects
            .iter()
            .filter(|object| self.config.objects.is_tool(object))
            .count())
    }

    /// Index of the loaded tool, or `None` when the carriage is empty.
    pub fn current_tool(&self) -> Result<Option<usize>> {
        debug!("querying current tool");
        let objects = &self.config.objects;
        let index: i64 =
            self.query_object(&objects.toolhead, &objects.current_tool, Error::ToolDetection)?;
        Ok(usize::try_from(index).ok())
    }

    /// Offsets currently applied to tool `index`, rounded to 3 decimals.
    pub fn tool_offset(&self, index: usize) -> Result<Xyz> {
        debug!(tool = index, "querying tool offset");
        let name = self.config.objects.tool(index);
        let values: Vec<f64> = self.query_object(&name, "offset", Error::OffsetCapture)?;
        Xyz::from_slice(&values).map(Xyz::rounded).ok_or_else(|| {
            let err = Error::OffsetCapture(format!("{name}.offset has {} values", values.len()));
            error!(tool = index, "{err}");
            err
        })
    }

    /// Machine state collapsed to idle, paused or processing.
    pub fn status(&self) -> Result<MachineStatus> {
        let info: PrinterState = self.query_as(PRINTER_INFO, &[], Error::Status)?;
        let status = MachineStatus::from_controller(&info.state);
        debug!(state = %info.state, %status, "machine status");
        Ok(status)
    }

    pub fn is_idle(&self) -> Result<bool> {
        Ok(self.status()?.is_idle())
    }

    /// Current g-code position, rounded to 3 decimals.
    pub fn coordinates(&self) -> Result<Xyz> {
        debug!("querying coordinates");
        let values: Vec<f64> =
            self.query_object("gcode_move", "gcode_position", Error::Coordinates)?;
        Xyz::from_slice(&values).map(Xyz::rounded).ok_or_else(|| {
            let err = Error::Coordinates(format!("gcode_position has {} values", values.len()));
            error!("{err}");
            err
        })
    }

    /// Whether X, Y and Z have all been homed.
    ///
    /// A controller error or a reply without a result counts as not homed.
    pub fn is_homed(&self) -> Result<bool> {
        match self.decode_object::<String>("toolhead", "homed_axes", Error::Controller) {
            Ok(axes) => Ok(['x', 'y', 'z'].iter().all(|axis| axes.contains(*axis))),
            Err(Error::Controller(message) | Error::InvalidResponse(message)) => {
                warn!("homing query failed: {message}");
                Ok(false)
            }
            Err(e) => {
                error!("homing query failed: {e}");
                Err(e)
            }
        }
    }

    // ── Commands ─────────────────────────────────────────────────────────────

    /// Run one g-code command; the controller must answer `ok`.
    pub fn gcode(&self, command: &str) -> Result<()> {
        debug!(command, "sending g-code");
        let result = self
            .query(GCODE_SCRIPT, &[("script", command)])
            .map_err(|e| match e {
                Error::Controller(message) => Error::GCode(format!("{command}: {message}")),
                other => other,
            })
            .inspect_err(|e| error!(command, "{e}"))?;

        if result.as_str() == Some("ok") {
            Ok(())
        } else {
            error!(command, %result, "g-code not acknowledged");
            Err(Error::GCode(format!("{command}: unexpected result {result}")))
        }
    }

    /// Run commands in order, stopping at the first failure.
    pub fn gcode_batch<S: AsRef<str>>(&self, commands: &[S]) -> Result<()> {
        commands.iter().try_for_each(|c| self.gcode(c.as_ref()))
    }

    /// Apply new offsets to a discovered tool.
    ///
    /// At least one of X or Y is required. The local tool record is not
    /// updated; re-read with [`Printer::tool_offset`].
    pub fn set_tool_offsets(&self, tool: usize, offsets: Axes) -> Result<()> {
        debug!(tool, %offsets, "setting tool offsets");
        if tool >= self.tools.len() {
            let err = Error::SetOffset(format!(
                "no tool with index {tool} ({} discovered)",
                self.tools.len()
            ));
            error!("{err}");
            return Err(err);
        }
        if offsets.x.is_none() && offsets.y.is_none() {
            let err = Error::SetOffset("an X or Y offset is required".into());
            error!("{err}");
            return Err(err);
        }
        if !offsets.is_finite() {
            let err = Error::SetOffset(format!("offsets must be finite numbers, got {offsets}"));
            error!("{err}");
            return Err(err);
        }

        self.gcode(&gcode::set_tool_offset(tool, &offsets))?;
        debug!(tool, "tool offsets applied");
        Ok(())
    }

    /// Load tool `index` and wait for the machine to go idle.
    pub fn load_tool(&self, index: usize) -> Result<()> {
        debug!(tool = index, "loading tool");
        self.gcode(&gcode::tool_load(index))?;
        self.finish_tool_change(format!("request to change to tool T{index} timed out"))
    }

    /// Unload the current tool and wait for the machine to go idle.
    pub fn unload_tools(&self) -> Result<()> {
        debug!("unloading tools");
        self.gcode(gcode::TOOL_UNLOAD)?;
        self.finish_tool_change("request to unload tools timed out".to_string())
    }

    fn finish_tool_change(&self, timeout_message: String) -> Result<()> {
        match self.wait_for_idle(&self.config.tool_change)? {
            PollOutcome::Ready { .. } => Ok(()),
            PollOutcome::TimedOut { .. } => {
                warn!("{timeout_message}");
                Err(Error::ToolTimeout(timeout_message))
            }
        }
    }

    /// Move by the given distances, then restore absolute positioning.
    pub fn move_relative(&self, mv: &Move) -> Result<()> {
        self.execute_move(mv, Positioning::Relative)
    }

    /// Move to the given coordinates.
    pub fn move_absolute(&self, mv: &Move) -> Result<()> {
        self.execute_move(mv, Positioning::Absolute)
    }

    fn execute_move(&self, mv: &Move, positioning: Positioning) -> Result<()> {
        debug!(?positioning, line = %mv.line(), "moving");
        if !mv.is_valid() {
            let err = Error::InvalidMove(format!(
                "target {} at F{} is not a finite move",
                mv.target, mv.speed
            ));
            error!("{err}");
            return Err(err);
        }
        if !self.is_homed()? {
            let err = Error::Homing("machine axes have not been homed".into());
            error!("{err}");
            return Err(err);
        }

        let moved = self
            .gcode_batch(&mv.commands(positioning))
            .and_then(|()| self.wait_for_idle(&self.config.moves))
            .and_then(|outcome| match outcome {
                PollOutcome::Ready { .. } => Ok(()),
                PollOutcome::TimedOut { .. } => {
                    Err(Error::MoveTimeout("request to move timed out".into()))
                }
            });

        moved.inspect_err(|e| {
            error!(
                "move failed to {:?} coordinates: {} at speed {}: {e}",
                positioning, mv.target, mv.speed
            );
        })
    }

    fn wait_for_idle(&self, config: &PollConfig) -> Result<PollOutcome> {
        let outcome = poll_until(config, || self.is_idle())?;
        debug!(?outcome, "idle poll finished");
        Ok(outcome)
    }

    /// Wait for queued moves to drain.
    pub fn flush_movement_buffer(&self) -> Result<()> {
        debug!("flushing movement buffer");
        self.gcode(gcode::FLUSH_MOVES)
    }

    /// Axis limits are enforced by the controller's own configuration.
    pub fn limit_axes(&self) -> Result<()> {
        debug!("axis limits left to controller configuration");
        Ok(())
    }

    /// Persisting offsets is not supported by this controller; offsets only
    /// last until the next restart.
    pub fn save_offsets_to_firmware(&self) -> Result<()> {
        debug!("saving tool offsets to {FIRMWARE_NAME} firmware is not supported");
        Ok(())
    }
}

impl<T: Transport> std::fmt::Display for Printer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}({}, tools={})",
            self.config.nickname,
            self.base_url(),
            self.tools.len()
        )
    }
}
