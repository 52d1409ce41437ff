use serde::{Deserialize, Serialize};

/// What to do with an object whose `isa` is not registered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownObjectPolicy {
    /// Keep the object's attributes verbatim.
    #[default]
    Preserve,
    /// Fail with an unknown-object-type error.
    Reject,
}

/// Options for [`Decoder`](crate::Decoder).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Worker threads for object construction. `0` uses the global pool.
    pub workers: usize,
    pub unknown_objects: UnknownObjectPolicy,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            unknown_objects: UnknownObjectPolicy::Preserve,
        }
    }
}

impl DecodeOptions {
    /// Reject unknown object classes instead of preserving them.
    pub fn strict() -> Self {
        Self {
            unknown_objects: UnknownObjectPolicy::Reject,
            ..Default::default()
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

/// Layout of the object table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStyle {
    /// Build files and file references on one line each, like the IDE.
    #[default]
    Xcode,
    /// Every object written across multiple lines.
    Expanded,
}

/// Options for [`Encoder`](crate::Encoder).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Write `/* name */` annotations and section markers.
    pub comments: bool,
    pub style: OutputStyle,
    pub unknown_objects: UnknownObjectPolicy,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            comments: true,
            style: OutputStyle::Xcode,
            unknown_objects: UnknownObjectPolicy::Preserve,
        }
    }
}

impl OutputSettings {
    /// Multi-line objects throughout. Easier to diff by line.
    pub fn expanded() -> Self {
        Self {
            style: OutputStyle::Expanded,
            ..Default::default()
        }
    }

    /// No annotations, no section markers.
    pub fn bare() -> Self {
        Self {
            comments: false,
            ..Default::default()
        }
    }
}

/// Combined codec settings, as read from a `pbx.toml` file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub decode: DecodeOptions,
    pub output: OutputSettings,
}
