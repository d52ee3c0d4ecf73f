//! G-code command builders.

use crate::tool::{Axes, round3};

/// Unload whatever tool is on the carriage.
pub const TOOL_UNLOAD: &str = "T_1";

/// Wait for all queued moves to finish.
pub const FLUSH_MOVES: &str = "M400";

pub const ABSOLUTE_POSITIONING: &str = "G90";
pub const RELATIVE_POSITIONING: &str = "G91";

/// Default move feedrate, mm/min.
pub const DEFAULT_MOVE_SPEED: f64 = 1000.0;

/// Load tool `index`.
pub fn tool_load(index: usize) -> String {
    format!("T{index}")
}

/// `SET_TOOL_OFFSET` for the supplied axes, rounded to 3 decimals.
pub fn set_tool_offset(tool: usize, offsets: &Axes) -> String {
    let mut command = format!("SET_TOOL_OFFSET TOOL={tool}");
    for (axis, value) in offsets.supplied() {
        command.push_str(&format!(" {axis}={:.6}", round3(value)));
    }
    command
}

/// Whether a move is expressed in absolute or relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Positioning {
    Absolute,
    Relative,
}

/// A single linear move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Move {
    /// `G0` instead of `G1`.
    pub rapid: bool,
    /// Feedrate in mm/min.
    pub speed: f64,
    pub target: Axes,
}

impl Default for Move {
    fn default() -> Self {
        Self {
            rapid: false,
            speed: DEFAULT_MOVE_SPEED,
            target: Axes::default(),
        }
    }
}

impl Move {
    pub fn to(target: Axes) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    pub fn rapid(mut self, rapid: bool) -> Self {
        self.rapid = rapid;
        self
    }

    pub fn speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Speed is positive and every target axis is a real number.
    pub fn is_valid(&self) -> bool {
        self.speed.is_finite() && self.speed > 0.0 && self.target.is_finite()
    }

    /// The `G0`/`G1` line for this move.
    pub fn line(&self) -> String {
        let mut line = String::from(if self.rapid { "G0" } else { "G1" });
        for (axis, value) in self.target.supplied() {
            line.push_str(&format!(" {axis}{}", round3(value)));
        }
        line.push_str(&format!(" F{}", self.speed));
        line
    }

    /// Full command sequence, always leaving the machine in absolute mode.
    pub fn commands(&self, positioning: Positioning) -> Vec<String> {
        let mode = match positioning {
            Positioning::Absolute => ABSOLUTE_POSITIONING,
            Positioning::Relative => RELATIVE_POSITIONING,
        };
        vec![
            mode.to_string(),
            self.line(),
            ABSOLUTE_POSITIONING.to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_commands() {
        assert_eq!(tool_load(0), "T0");
        assert_eq!(tool_load(12), "T12");
        assert_eq!(TOOL_UNLOAD, "T_1");
    }

    #[test]
    fn set_offset_formats_six_digits() {
        let offsets = Axes::new().x(1.23456).y(-0.5);
        assert_eq!(
            set_tool_offset(2, &offsets),
            "SET_TOOL_OFFSET TOOL=2 X=1.235000 Y=-0.500000"
        );
    }

    #[test]
    fn set_offset_skips_missing_axes() {
        let offsets = Axes::new().y(3.0);
        assert_eq!(set_tool_offset(0, &offsets), "SET_TOOL_OFFSET TOOL=0 Y=3.000000");
    }

    #[test]
    fn relative_move_sequence() {
        let mv = Move::to(Axes::new().x(10.0).y(-2.12345));
        assert_eq!(
            mv.commands(Positioning::Relative),
            vec!["G91", "G1 X10 Y-2.123 F1000", "G90"]
        );
    }

    #[test]
    fn rapid_absolute_move() {
        let mv = Move::to(Axes::new().z(5.5)).rapid(true).speed(3000.0);
        assert_eq!(
            mv.commands(Positioning::Absolute),
            vec!["G90", "G0 Z5.5 F3000", "G90"]
        );
    }

    #[test]
    fn move_without_axes_only_sets_speed() {
        assert_eq!(Move::default().line(), "G1 F1000");
    }

    #[test]
    fn move_validity() {
        assert!(Move::to(Axes::new().x(1.0)).is_valid());
        assert!(!Move::to(Axes::new().x(f64::NAN)).is_valid());
        assert!(!Move::default().speed(f64::INFINITY).is_valid());
        assert!(!Move::default().speed(0.0).is_valid());
        assert!(!Move::default().speed(-500.0).is_valid());
    }
}
