//! Wire types for scenes, overlays, and transitions.

use serde::{Deserialize, Serialize};

use crate::id::SceneId;

/// Kind of capture or media input behind a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    /// Local camera.
    Camera,

    /// Local screen or window capture.
    Screen,

    /// A remote participant's feed.
    RemoteParticipant,

    /// A static asset (image, looping clip).
    Asset,
}

/// Layout preset for a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// One source full-frame.
    Single,

    /// Two sources side by side.
    Split,

    /// One source full-frame with another inset.
    Pip,

    /// Equal-sized tiles.
    Grid,

    /// Per-source placements set by the operator.
    Custom,
}

/// Transition run when the program cursor moves between scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    /// Instantaneous switch.
    Cut,

    /// Crossfade between the outgoing and incoming composites.
    Fade,

    /// Incoming composite slides over the outgoing one.
    Slide,

    /// Incoming composite scales up over the outgoing one.
    Zoom,
}

impl TransitionKind {
    /// Whether this transition completes within a single tick.
    pub const fn is_instant(self) -> bool {
        matches!(self, Self::Cut)
    }
}

/// Placement of a source within a scene.
///
/// Coordinates and sizes are normalized to the frame (0.0 - 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourcePlacement {
    /// Left edge.
    pub x: f32,

    /// Top edge.
    pub y: f32,

    /// Width.
    pub width: f32,

    /// Height.
    pub height: f32,

    /// Stacking order; higher renders on top.
    pub z_order: u32,

    /// Whether the source is rendered.
    pub visible: bool,
}

impl Default for SourcePlacement {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            z_order: 0,
            visible: true,
        }
    }
}

/// Corner or center the overlay is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayAnchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

/// Animation used when an overlay enters or leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayAnimation {
    /// Appears or disappears immediately.
    None,

    /// Fades in or out.
    Fade,

    /// Slides in from or out to the anchored edge.
    Slide,
}

/// Kind of overlay content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayKind {
    /// Name/title band along the lower part of the frame.
    LowerThird,

    /// Channel or sponsor logo.
    Logo,

    /// Free-form text.
    Text,
}

/// Definition of an overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySpec {
    /// What the overlay shows.
    pub kind: OverlayKind,

    /// Displayed content.
    pub content: String,

    /// Where the overlay is pinned.
    pub anchor: OverlayAnchor,

    /// Entry animation.
    pub animate_in: OverlayAnimation,

    /// Exit animation.
    pub animate_out: OverlayAnimation,

    /// When set, the overlay is hidden as soon as the program leaves
    /// this scene; otherwise it persists across switches.
    pub scene_scope: Option<SceneId>,
}

impl OverlaySpec {
    /// A lower third pinned bottom-left with fade animations.
    pub fn lower_third(content: impl Into<String>) -> Self {
        Self {
            kind: OverlayKind::LowerThird,
            content: content.into(),
            anchor: OverlayAnchor::BottomLeft,
            animate_in: OverlayAnimation::Fade,
            animate_out: OverlayAnimation::Fade,
            scene_scope: None,
        }
    }
}
