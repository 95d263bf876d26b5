use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Window an element is assigned to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    /// The single window spanning all of time
    Global,

    /// Half-open interval `[start, end)`
    Interval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl Window {
    /// Whether `timestamp` falls inside this window
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        match self {
            Window::Global => true,
            Window::Interval { start, end } => *start <= timestamp && timestamp < *end,
        }
    }
}

/// When a pane fired relative to the watermark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaneTiming {
    Early,
    OnTime,
    Late,
    Unknown,
}

/// Describes which firing of a window produced an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaneInfo {
    pub is_first: bool,
    pub is_last: bool,
    pub timing: PaneTiming,
    pub index: u64,
}

impl PaneInfo {
    /// Pane for elements that were never grouped by a trigger
    pub const NO_FIRING: PaneInfo = PaneInfo {
        is_first: true,
        is_last: true,
        timing: PaneTiming::Unknown,
        index: 0,
    };
}

impl Default for PaneInfo {
    fn default() -> Self {
        Self::NO_FIRING
    }
}

/// One record flowing between operations, with its timing and grouping metadata
///
/// The envelope is immutable: operations that transform the value derive a new
/// envelope with [`WindowedValue::with_value`], which keeps timestamp, windows
/// and pane unchanged.
///
/// # Example
/// ```
/// use opgraph::graph::WindowedValue;
///
/// let elem = WindowedValue::in_global_window(21);
/// let doubled = elem.with_value(elem.value() * 2);
/// assert_eq!(*doubled.value(), 42);
/// assert_eq!(doubled.timestamp(), elem.timestamp());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowedValue<T> {
    value: T,
    timestamp: DateTime<Utc>,
    windows: Vec<Window>,
    pane: PaneInfo,
}

impl<T> WindowedValue<T> {
    /// Create an envelope with explicit metadata
    pub fn of(value: T, timestamp: DateTime<Utc>, windows: Vec<Window>, pane: PaneInfo) -> Self {
        Self {
            value,
            timestamp,
            windows,
            pane,
        }
    }

    /// Element in the global window at the minimum timestamp
    pub fn in_global_window(value: T) -> Self {
        Self::timestamped_in_global_window(value, DateTime::<Utc>::MIN_UTC)
    }

    /// Element in the global window at `timestamp`
    pub fn timestamped_in_global_window(value: T, timestamp: DateTime<Utc>) -> Self {
        Self::of(value, timestamp, vec![Window::Global], PaneInfo::NO_FIRING)
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn windows(&self) -> &[Window] {
        &self.windows
    }

    pub fn pane(&self) -> PaneInfo {
        self.pane
    }

    /// Consume the envelope and return the bare value
    pub fn into_value(self) -> T {
        self.value
    }

    /// New envelope carrying `value` with this element's metadata
    pub fn with_value<U>(&self, value: U) -> WindowedValue<U> {
        WindowedValue {
            value,
            timestamp: self.timestamp,
            windows: self.windows.clone(),
            pane: self.pane,
        }
    }

    /// Map the value, keeping metadata
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> WindowedValue<U> {
        WindowedValue {
            value: f(self.value),
            timestamp: self.timestamp,
            windows: self.windows,
            pane: self.pane,
        }
    }
}
