//! Tool records and XYZ value types.

use serde::{Deserialize, Serialize};

/// Nozzle diameter assumed for discovered tools, in millimeters.
pub const DEFAULT_NOZZLE_SIZE: f64 = 0.4;

/// Round to the 3 decimal places the controller reports.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// A point or offset in machine space, in millimeters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Xyz {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Build from the `[x, y, z]` arrays the controller returns.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        match values {
            [x, y, z, ..] => Some(Self::new(*x, *y, *z)),
            _ => None,
        }
    }

    pub fn rounded(self) -> Self {
        Self::new(round3(self.x), round3(self.y), round3(self.z))
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Optional per-axis values, used for move targets and offset updates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Axes {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl Axes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn x(mut self, x: f64) -> Self {
        self.x = Some(x);
        self
    }

    pub fn y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn z(mut self, z: f64) -> Self {
        self.z = Some(z);
        self
    }

    /// No supplied axis is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.supplied().all(|(_, value)| value.is_finite())
    }

    /// Supplied axes in X, Y, Z order, paired with their letter.
    pub fn supplied(&self) -> impl Iterator<Item = (char, f64)> + '_ {
        [('X', self.x), ('Y', self.y), ('Z', self.z)]
            .into_iter()
            .filter_map(|(axis, value)| value.map(|v| (axis, v)))
    }
}

impl std::fmt::Display for Axes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (axis, value) in self.supplied() {
            write!(f, " {axis}{value}")?;
        }
        write!(f, " )")
    }
}

/// A tool discovered on the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    pub index: usize,
    pub name: String,
    pub nozzle_size: f64,
    pub offset: Xyz,
}

impl Tool {
    pub fn new(index: usize, name: impl Into<String>, offset: Xyz) -> Self {
        Self {
            index,
            name: name.into(),
            nozzle_size: DEFAULT_NOZZLE_SIZE,
            offset,
        }
    }

    /// Serializable view of this tool.
    pub fn view(&self) -> ToolView {
        ToolView {
            number: self.index,
            name: self.name.clone(),
            nozzle_size: self.nozzle_size,
            offsets: self.offset.to_array(),
        }
    }
}

/// Serialized form of a [`Tool`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolView {
    pub number: usize,
    pub name: String,
    pub nozzle_size: f64,
    pub offsets: [f64; 3],
}
