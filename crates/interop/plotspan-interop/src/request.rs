//! Animation request model: the mutable context threaded through the hook
//! chain for one `animate()` call.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::data::DataPayload;
use crate::handle::SnapshotHandle;

/// Timing settings for one animation phase or one channel of it. Values keep
/// their string encoding ("500ms", "ease-in") and are passed through to the
/// engine unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Timing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
}

/// Per-target animation options: whole-phase timing plus optional
/// per-channel overrides keyed by channel name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimOptions {
    #[serde(flatten)]
    pub timing: Timing,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub channels: HashMap<String, Timing>,
}

/// Configuration delta carried by a non-snapshot target.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<DataPayload>,
    /// Chart configuration as a JSON tree; flattened to dotted-path string
    /// pairs at submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<JsonValue>,
}

/// What one animation phase animates to.
#[derive(Clone, Debug)]
pub enum TargetKind {
    Config(ConfigDelta),
    /// Instantaneous replay of a stored configuration. Normalization and
    /// config flattening do not apply.
    Snapshot(SnapshotHandle),
}

/// One animation phase: a target plus optional timing overrides.
#[derive(Clone, Debug)]
pub struct AnimTarget {
    pub target: TargetKind,
    pub options: Option<AnimOptions>,
}

impl AnimTarget {
    pub fn config(delta: ConfigDelta) -> Self {
        Self {
            target: TargetKind::Config(delta),
            options: None,
        }
    }

    pub fn snapshot(snapshot: SnapshotHandle) -> Self {
        Self {
            target: TargetKind::Snapshot(snapshot),
            options: None,
        }
    }

    pub fn with_options(mut self, options: AnimOptions) -> Self {
        self.options = Some(options);
        self
    }
}

/// Shared, mutable state visible to every hook of one animate() pass.
///
/// `targets` is always an ordered sequence; a single-phase request is a
/// one-element sequence. Hooks that act on targets must iterate explicitly —
/// a mutation here is visible to all downstream hooks and to the final
/// submission.
#[derive(Debug, Default)]
pub struct AnimationContext {
    pub targets: Vec<AnimTarget>,
}

impl AnimationContext {
    pub fn single(target: AnimTarget) -> Self {
        Self {
            targets: vec![target],
        }
    }

    pub fn phases(targets: Vec<AnimTarget>) -> Self {
        Self { targets }
    }
}
