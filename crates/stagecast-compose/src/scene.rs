//! Scenes and layout presets.

use stagecast_core::{LayoutKind, SceneId, SourceId, SourcePlacement};

/// One source placed within a scene.
#[derive(Debug, Clone)]
pub struct SceneEntry {
    /// The placed source.
    pub source: SourceId,

    /// Where and how it renders.
    pub placement: SourcePlacement,
}

/// An ordered arrangement of sources.
#[derive(Debug, Clone)]
pub struct Scene {
    id: SceneId,
    name: String,
    layout: LayoutKind,
    entries: Vec<SceneEntry>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new(name: impl Into<String>, layout: LayoutKind) -> Self {
        Self {
            id: SceneId::new(),
            name: name.into(),
            layout,
            entries: Vec::new(),
        }
    }

    /// Scene identifier.
    pub fn id(&self) -> &SceneId {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Layout preset.
    pub fn layout(&self) -> LayoutKind {
        self.layout
    }

    /// Entries in placement order.
    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    /// Whether the source is placed in this scene.
    pub fn contains(&self, source: &SourceId) -> bool {
        self.entries.iter().any(|e| &e.source == source)
    }

    /// Place a source, replacing any existing placement for it.
    pub fn place(&mut self, source: SourceId, placement: SourcePlacement) {
        match self.entries.iter_mut().find(|e| e.source == source) {
            Some(entry) => entry.placement = placement,
            None => self.entries.push(SceneEntry { source, placement }),
        }
    }

    /// Remove a source. Returns false when it was not placed here.
    pub fn unplace(&mut self, source: &SourceId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.source != source);
        self.entries.len() != before
    }
}

/// Placement for slot `index` under a layout preset.
///
/// `Custom` layouts ignore presets; callers supply placements directly.
pub fn layout_slot(layout: LayoutKind, index: usize) -> SourcePlacement {
    match layout {
        LayoutKind::Single | LayoutKind::Custom => SourcePlacement::default(),
        LayoutKind::Split => SourcePlacement {
            x: if index % 2 == 0 { 0.0 } else { 0.5 },
            y: 0.0,
            width: 0.5,
            height: 1.0,
            z_order: index as u32,
            visible: true,
        },
        LayoutKind::Pip => {
            if index == 0 {
                SourcePlacement::default()
            } else {
                // Inset bottom-right, above the full-frame source.
                SourcePlacement {
                    x: 0.7,
                    y: 0.7,
                    width: 0.25,
                    height: 0.25,
                    z_order: index as u32,
                    visible: true,
                }
            }
        }
        LayoutKind::Grid => {
            let col = index % 2;
            let row = (index / 2) % 2;
            SourcePlacement {
                x: col as f32 * 0.5,
                y: row as f32 * 0.5,
                width: 0.5,
                height: 0.5,
                z_order: index as u32,
                visible: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_replaces_existing_entry() {
        let mut scene = Scene::new("main", LayoutKind::Custom);
        let source = SourceId::new();

        scene.place(source.clone(), SourcePlacement::default());
        scene.place(
            source.clone(),
            SourcePlacement {
                x: 0.5,
                ..Default::default()
            },
        );

        assert_eq!(scene.entries().len(), 1);
        assert_eq!(scene.entries()[0].placement.x, 0.5);
        assert!(scene.contains(&source));
    }

    #[test]
    fn test_unplace_reports_presence() {
        let mut scene = Scene::new("main", LayoutKind::Single);
        let source = SourceId::new();
        scene.place(source.clone(), SourcePlacement::default());

        assert!(scene.unplace(&source));
        assert!(!scene.unplace(&source));
        assert!(!scene.contains(&source));
    }

    #[test]
    fn test_split_layout_slots() {
        let left = layout_slot(LayoutKind::Split, 0);
        let right = layout_slot(LayoutKind::Split, 1);

        assert_eq!(left.x, 0.0);
        assert_eq!(right.x, 0.5);
        assert_eq!(left.width, 0.5);
        assert_eq!(right.width, 0.5);
    }

    #[test]
    fn test_pip_layout_insets_secondary() {
        let main = layout_slot(LayoutKind::Pip, 0);
        let inset = layout_slot(LayoutKind::Pip, 1);

        assert_eq!(main.width, 1.0);
        assert!(inset.width < 0.5);
        assert!(inset.z_order > main.z_order);
    }
}
