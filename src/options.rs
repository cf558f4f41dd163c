//! Option records for the parameterised recipes.
//!
//! They derive [`Deserialize`] with camelCase keys so a host can load a
//! recipe configuration from whatever serde format it already uses.
//!
//! ```
//! use rewrite_apache::options::{AddTimeUnitArgumentOptions, TimeUnit};
//!
//! let options = AddTimeUnitArgumentOptions::new("org.acme.Pool setTimeout(int)");
//! assert_eq!(options.time_unit, TimeUnit::Milliseconds);
//! ```

use core::fmt;

use serde::Deserialize;

/// `java.util.concurrent.TimeUnit` constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    #[default]
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// The Java constant name, `MILLISECONDS` and so on.
    pub fn constant(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "NANOSECONDS",
            TimeUnit::Microseconds => "MICROSECONDS",
            TimeUnit::Milliseconds => "MILLISECONDS",
            TimeUnit::Seconds => "SECONDS",
            TimeUnit::Minutes => "MINUTES",
            TimeUnit::Hours => "HOURS",
            TimeUnit::Days => "DAYS",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.constant())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddTimeUnitArgumentOptions {
    /// Method pattern of the calls that gain the unit argument.
    pub method_pattern: String,
    #[serde(default)]
    pub time_unit: TimeUnit,
}

impl AddTimeUnitArgumentOptions {
    pub fn new(method_pattern: &str) -> Self {
        Self {
            method_pattern: method_pattern.to_string(),
            time_unit: TimeUnit::default(),
        }
    }

    pub fn with_time_unit(mut self, time_unit: TimeUnit) -> Self {
        self.time_unit = time_unit;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangeArgumentToTimeValueOptions {
    /// Method pattern of the calls whose duration becomes a `TimeValue`.
    pub method_pattern: String,
    /// Unit of a bare duration. Ignored when the call already passes one.
    #[serde(default)]
    pub time_unit: TimeUnit,
}

impl ChangeArgumentToTimeValueOptions {
    pub fn new(method_pattern: &str) -> Self {
        Self {
            method_pattern: method_pattern.to_string(),
            time_unit: TimeUnit::default(),
        }
    }

    pub fn with_time_unit(mut self, time_unit: TimeUnit) -> Self {
        self.time_unit = time_unit;
        self
    }
}
