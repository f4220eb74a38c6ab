//! Per-entity label style
//!
//! A `LabelStyle` is the template for an entity's *future* labels. It is edited
//! in place by `Setup` commands and read when a label is created and when its
//! visual is first drawn.

use crate::error::{CalloutError, Result};
use crate::expr;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Frame ticks per second of the host's update loop
pub const TICKS_PER_SECOND: u32 = 60;

/// How long a label lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifetime {
    /// Stays until erased
    Persistent,
    /// Remaining frame ticks, always at least 1 while the label is alive
    Ticks(u32),
}

impl Lifetime {
    /// Zero ticks means persistent
    pub fn from_ticks(ticks: u32) -> Self {
        if ticks == 0 {
            Lifetime::Persistent
        } else {
            Lifetime::Ticks(ticks)
        }
    }

    /// Converts a duration in seconds at `TICKS_PER_SECOND`.
    ///
    /// Zero and NaN are persistent. Partial ticks round up, and any other
    /// non-positive value expires on the first tick.
    pub fn from_seconds(seconds: f64) -> Self {
        if seconds == 0.0 || seconds.is_nan() {
            return Lifetime::Persistent;
        }
        let ticks = (seconds * TICKS_PER_SECOND as f64).ceil();
        if ticks >= u32::MAX as f64 {
            Lifetime::Ticks(u32::MAX)
        } else {
            Lifetime::Ticks(ticks.max(1.0) as u32)
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self, Lifetime::Persistent)
    }
}

/// Slide animation direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlideDirection {
    Up,
    Down,
    Left,
    Right,
}

impl SlideDirection {
    pub const ALL: [SlideDirection; 4] = [
        SlideDirection::Up,
        SlideDirection::Down,
        SlideDirection::Left,
        SlideDirection::Right,
    ];
}

/// Independent speed for each slide direction, in anchor fractions per tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideSpeeds {
    pub up: f64,
    pub down: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for SlideSpeeds {
    fn default() -> Self {
        SlideSpeeds {
            up: 0.05,
            down: 0.05,
            left: 0.05,
            right: 0.05,
        }
    }
}

impl SlideSpeeds {
    pub fn get(&self, direction: SlideDirection) -> f64 {
        match direction {
            SlideDirection::Up => self.up,
            SlideDirection::Down => self.down,
            SlideDirection::Left => self.left,
            SlideDirection::Right => self.right,
        }
    }

    pub fn set(&mut self, direction: SlideDirection, speed: f64) {
        match direction {
            SlideDirection::Up => self.up = speed,
            SlideDirection::Down => self.down = speed,
            SlideDirection::Left => self.left = speed,
            SlideDirection::Right => self.right = speed,
        }
    }
}

/// Display and behavior parameters for an entity's labels.
///
/// Numeric values are not range checked: an alpha of 3 or a negative size is
/// stored as given and left to the rasterizer to make sense of.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    pub duration: Lifetime,
    /// Vertical anchor fraction (1 = text sits above the anchor point)
    pub top: f64,
    /// Horizontal anchor fraction (0.5 = centered)
    pub left: f64,
    pub font_face: String,
    pub font_size: f64,
    pub italic: bool,
    pub color: String,
    pub outline_color: String,
    pub outline_width: f64,
    pub alpha: f64,
    /// At most one direction is active; use `set_slide` to change it
    slide: Option<SlideDirection>,
    pub slide_speeds: SlideSpeeds,
}

impl Default for LabelStyle {
    fn default() -> Self {
        LabelStyle {
            duration: Lifetime::Ticks(180),
            top: 1.0,
            left: 0.5,
            font_face: "GameFont".to_string(),
            font_size: 21.0,
            italic: false,
            color: "#ffffff".to_string(),
            outline_color: "rgba(0,0,0,0.5)".to_string(),
            outline_width: 2.0,
            alpha: 1.0,
            slide: None,
            slide_speeds: SlideSpeeds::default(),
        }
    }
}

impl LabelStyle {
    /// The active slide direction, if any
    pub fn slide(&self) -> Option<SlideDirection> {
        self.slide
    }

    pub fn is_sliding(&self, direction: SlideDirection) -> bool {
        self.slide == Some(direction)
    }

    /// Activating a direction deactivates the other three. Deactivating only
    /// clears the flag if that direction is the active one. Speeds are untouched.
    pub fn set_slide(&mut self, direction: SlideDirection, active: bool) {
        if active {
            self.slide = Some(direction);
        } else if self.slide == Some(direction) {
            self.slide = None;
        }
    }

    /// Applies a configuration value to one field.
    ///
    /// Numbers go through the expression evaluator, booleans are true only for
    /// the literal `true` (any case), strings are copied verbatim. On error the
    /// style is left unchanged.
    pub fn set(&mut self, field: SetupField, value: &str) -> Result<()> {
        let number = || {
            expr::evaluate(value).map_err(|source| CalloutError::InvalidNumber {
                field,
                value: value.to_string(),
                source,
            })
        };
        let flag = value.trim().eq_ignore_ascii_case("true");

        match field {
            SetupField::Duration => self.duration = Lifetime::from_seconds(number()?),
            SetupField::Top => self.top = number()?,
            SetupField::Left => self.left = number()?,
            SetupField::Font => self.font_face = value.to_string(),
            SetupField::Size => self.font_size = number()?,
            SetupField::Italic => self.italic = flag,
            SetupField::Color => self.color = value.to_string(),
            SetupField::OutlineWidth => self.outline_width = number()?,
            SetupField::OutlineColor => self.outline_color = value.to_string(),
            SetupField::Alpha => self.alpha = number()?,
            SetupField::Slide(direction) => self.set_slide(direction, flag),
            SetupField::SlideSpeed(direction) => self.slide_speeds.set(direction, number()?),
        }
        Ok(())
    }
}

/// A configurable style field, as named on the command surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupField {
    Duration,
    Top,
    Left,
    Font,
    Size,
    Italic,
    Color,
    OutlineWidth,
    OutlineColor,
    Alpha,
    Slide(SlideDirection),
    SlideSpeed(SlideDirection),
}

impl SetupField {
    pub fn name(&self) -> &'static str {
        match self {
            SetupField::Duration => "Duration",
            SetupField::Top => "Top",
            SetupField::Left => "Left",
            SetupField::Font => "Font",
            SetupField::Size => "Size",
            SetupField::Italic => "Italic",
            SetupField::Color => "Color",
            SetupField::OutlineWidth => "OutlineWidth",
            SetupField::OutlineColor => "OutlineColor",
            SetupField::Alpha => "Alpha",
            SetupField::Slide(SlideDirection::Up) => "SlideUp",
            SetupField::Slide(SlideDirection::Down) => "SlideDown",
            SetupField::Slide(SlideDirection::Left) => "SlideLeft",
            SetupField::Slide(SlideDirection::Right) => "SlideRight",
            SetupField::SlideSpeed(SlideDirection::Up) => "SlideUpSpeed",
            SetupField::SlideSpeed(SlideDirection::Down) => "SlideDownSpeed",
            SetupField::SlideSpeed(SlideDirection::Left) => "SlideLeftSpeed",
            SetupField::SlideSpeed(SlideDirection::Right) => "SlideRightSpeed",
        }
    }

    pub fn all() -> Vec<Self> {
        let mut fields = vec![
            SetupField::Duration,
            SetupField::Top,
            SetupField::Left,
            SetupField::Font,
            SetupField::Size,
            SetupField::Italic,
            SetupField::Color,
            SetupField::OutlineWidth,
            SetupField::OutlineColor,
            SetupField::Alpha,
        ];
        for direction in SlideDirection::ALL {
            fields.push(SetupField::Slide(direction));
            fields.push(SetupField::SlideSpeed(direction));
        }
        fields
    }
}

impl fmt::Display for SetupField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SetupField {
    type Err = CalloutError;

    fn from_str(s: &str) -> Result<Self> {
        SetupField::all()
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CalloutError::UnknownSetupField(s.to_string()))
    }
}
