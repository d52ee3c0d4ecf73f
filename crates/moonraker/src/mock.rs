//! In-memory controller for tests.

use crate::{Error, Result};
use crate::transport::Transport;
use serde_json::{Map, Value, json};
use std::cell::{RefCell, RefMut};
use std::collections::{HashMap, VecDeque};

/// Mutable controller state behind a [`MockController`].
#[derive(Debug)]
pub struct MockState {
    pub klippy_state: String,
    pub objects: Vec<String>,
    pub offsets: HashMap<String, [f64; 3]>,
    pub current_tool: i64,
    /// Printer states served before `settled_state`, one per status read.
    pub pending_states: VecDeque<String>,
    pub settled_state: String,
    pub status_reads: u32,
    pub homed_axes: String,
    pub position: [f64; 3],
    pub relative: bool,
    pub gcode_reply: Value,
    pub gcode_log: Vec<String>,
    /// Error messages keyed by endpoint path, object name or g-code command.
    pub failures: HashMap<String, String>,
    /// Bodies served verbatim, keyed like `failures`.
    pub raw: HashMap<String, Value>,
    /// Every request fails as if the host were down.
    pub unreachable: bool,
}

/// Scripted controller that answers like the real REST API.
#[derive(Debug)]
pub struct MockController {
    state: RefCell<MockState>,
}

impl MockController {
    /// A ready, homed, idle machine with `count` tools.
    pub fn with_tools(count: usize) -> Self {
        let mut objects: Vec<String> = ["gcode_move", "toolhead", "toollock", "extruder"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut offsets = HashMap::new();
        for i in 0..count {
            let name = format!("tool {i}");
            offsets.insert(name.clone(), [i as f64 * 0.1234, i as f64 * -0.5, 0.0]);
            objects.push(name);
        }

        Self {
            state: RefCell::new(MockState {
                klippy_state: "ready".into(),
                objects,
                offsets,
                current_tool: -1,
                pending_states: VecDeque::new(),
                settled_state: "ready".into(),
                status_reads: 0,
                homed_axes: "xyz".into(),
                position: [0.0; 3],
                relative: false,
                gcode_reply: json!("ok"),
                gcode_log: Vec::new(),
                failures: HashMap::new(),
                raw: HashMap::new(),
                unreachable: false,
            }),
        }
    }

    pub fn state(&self) -> RefMut<'_, MockState> {
        self.state.borrow_mut()
    }

    /// Answer requests for `key` (path, object name or command) with an error payload.
    pub fn fail(&self, key: &str, message: &str) {
        self.state().failures.insert(key.into(), message.into());
    }

    /// Answer requests for `key` with `body` as is.
    pub fn reply(&self, key: &str, body: Value) {
        self.state().raw.insert(key.into(), body);
    }

    /// Report busy for the next `reads` status reads.
    pub fn busy_for(&self, reads: usize) {
        let mut state = self.state();
        state.pending_states.extend((0..reads).map(|_| "busy".to_string()));
    }
}

fn error_body(message: &str) -> Value {
    json!({"error": {"code": 400, "message": message}})
}

impl MockState {
    fn object_status(&self, object: &str, property: &str) -> Option<Value> {
        let value = match (object, property) {
            ("toollock", "tool_current") => json!(self.current_tool),
            ("toolhead", "homed_axes") => json!(self.homed_axes),
            ("gcode_move", "gcode_position") => json!(self.position),
            (name, "offset") => json!(self.offsets.get(name)?),
            _ => return None,
        };
        let mut props = Map::new();
        props.insert(property.to_string(), value);
        let mut status = Map::new();
        status.insert(object.to_string(), Value::Object(props));
        Some(Value::Object(status))
    }

    fn run_gcode(&mut self, command: &str) {
        self.gcode_log.push(command.to_string());
        let mut words = command.split_whitespace();
        match words.next() {
            Some("G90") => self.relative = false,
            Some("G91") => self.relative = true,
            Some("G0" | "G1") => {
                for word in words {
                    let (axis, value) = word.split_at(1);
                    let Some(i) = "XYZ".find(axis) else { continue };
                    let value: f64 = value.parse().unwrap();
                    if self.relative {
                        self.position[i] += value;
                    } else {
                        self.position[i] = value;
                    }
                }
            }
            Some("T_1") => self.current_tool = -1,
            Some("SET_TOOL_OFFSET") => {
                let mut fields: HashMap<&str, &str> = words
                    .filter_map(|w| w.split_once('='))
                    .collect();
                let Some(tool) = fields.remove("TOOL") else { return };
                let offset = self.offsets.entry(format!("tool {tool}")).or_default();
                for (i, axis) in ["X", "Y", "Z"].iter().enumerate() {
                    if let Some(v) = fields.get(axis) {
                        offset[i] = v.parse().unwrap();
                    }
                }
            }
            Some(t) if t.starts_with('T') => {
                if let Ok(index) = t[1..].parse() {
                    self.current_tool = index;
                }
            }
            _ => {}
        }
    }
}

impl Transport for MockController {
    fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let mut state = self.state();
        if state.unreachable {
            return Err(Error::Network(format!("{path}: connection refused")));
        }

        let (key, value) = params.first().copied().unwrap_or((path, path));
        for failing in [path, key, value] {
            if let Some(message) = state.failures.get(failing) {
                return Ok(error_body(message));
            }
            if let Some(body) = state.raw.get(failing) {
                return Ok(body.clone());
            }
        }

        let body = match path {
            "/server/info" => json!({"result": {"klippy_state": state.klippy_state}}),
            "/printer/info" => {
                state.status_reads += 1;
                let current = state
                    .pending_states
                    .pop_front()
                    .unwrap_or_else(|| state.settled_state.clone());
                json!({"result": {"state": current}})
            }
            "/printer/objects/list" => json!({"result": {"objects": state.objects}}),
            "/printer/objects/query" => {
                let (object, property) = params[0];
                match state.object_status(object, property) {
                    Some(status) => json!({"result": {"eventtime": 1.0, "status": status}}),
                    None => error_body(&format!("Unknown object {object}")),
                }
            }
            "/printer/gcode/script" => {
                let (_, command) = params[0];
                state.run_gcode(command);
                json!({"result": state.gcode_reply})
            }
            _ => error_body("Not Found"),
        };
        Ok(body)
    }
}
