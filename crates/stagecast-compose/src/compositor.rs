//! Scene list, cursors, and per-tick program composition.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, instrument};

use stagecast_core::{
    LayoutKind, OverlayId, OverlaySpec, SceneId, SourceId, SourceKind, SourcePlacement,
    TransitionKind,
};

use crate::error::ComposeError;
use crate::overlay::{Overlay, OverlayPhase};
use crate::program::{Composite, OverlayLayer, ProgramFrame, ProgramLayer, TransitionSnapshot};
use crate::scene::{layout_slot, Scene};
use crate::transition::TransitionRun;
use crate::{ComposeResult, OVERLAY_ANIMATION_MS};

/// A registered source.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    /// What kind of input it is.
    pub kind: SourceKind,

    /// Display label.
    pub label: String,
}

/// Outcome of a switch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The program cursor moved using this transition.
    Switched(TransitionKind),

    /// The scene already is the program target; nothing ran.
    AlreadyProgram,
}

/// The composition engine for one session.
///
/// Holds the scene list, the preview and program cursors, overlays,
/// and the running transition. `tick` yields exactly one
/// [`ProgramFrame`] per call.
pub struct Compositor {
    scenes: Vec<Scene>,
    sources: HashMap<SourceId, SourceInfo>,
    overlays: HashMap<OverlayId, Overlay>,
    overlay_order: Vec<OverlayId>,
    preview: Option<SceneId>,
    program: Option<SceneId>,
    transition: Option<TransitionRun>,
    default_transition: TransitionKind,
    transition_duration: Duration,
    sequence: u64,
}

impl Compositor {
    /// Create an empty compositor.
    pub fn new(default_transition: TransitionKind, transition_duration: Duration) -> Self {
        Self {
            scenes: Vec::new(),
            sources: HashMap::new(),
            overlays: HashMap::new(),
            overlay_order: Vec::new(),
            preview: None,
            program: None,
            transition: None,
            default_transition,
            transition_duration,
            sequence: 0,
        }
    }

    /// Current program cursor.
    pub fn program(&self) -> Option<&SceneId> {
        self.program.as_ref()
    }

    /// Current preview cursor.
    pub fn preview(&self) -> Option<&SceneId> {
        self.preview.as_ref()
    }

    /// Whether a transition is currently running.
    pub fn in_transition(&self) -> bool {
        self.transition.is_some()
    }

    /// Scenes in creation order.
    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Add an empty scene. The first scene becomes preview and program.
    pub fn add_scene(&mut self, name: impl Into<String>, layout: LayoutKind) -> SceneId {
        let scene = Scene::new(name, layout);
        let id = scene.id().clone();
        self.scenes.push(scene);

        if self.program.is_none() {
            self.program = Some(id.clone());
        }
        if self.preview.is_none() {
            self.preview = Some(id.clone());
        }
        id
    }

    /// Register a source with the session.
    pub fn add_source(&mut self, kind: SourceKind, label: impl Into<String>) -> SourceId {
        let id = SourceId::new();
        self.sources.insert(
            id.clone(),
            SourceInfo {
                kind,
                label: label.into(),
            },
        );
        id
    }

    /// Look up a registered source.
    pub fn source(&self, id: &SourceId) -> Option<&SourceInfo> {
        self.sources.get(id)
    }

    /// Registered source ids.
    pub fn source_ids(&self) -> Vec<SourceId> {
        self.sources.keys().cloned().collect()
    }

    /// Remove a source from the session and every scene.
    pub fn drop_source(&mut self, source: &SourceId) -> ComposeResult<()> {
        if !self.sources.contains_key(source) {
            return Err(ComposeError::UnknownSource(source.clone()));
        }
        if let Some(run) = &self.transition {
            let locked = self
                .scenes
                .iter()
                .any(|s| run.involves(s.id()) && s.contains(source));
            if locked {
                return Err(ComposeError::SceneInTransition(run.to.clone()));
            }
        }

        self.sources.remove(source);
        for scene in &mut self.scenes {
            scene.unplace(source);
        }
        Ok(())
    }

    /// Place a source within a scene.
    ///
    /// With no explicit placement the source takes the next preset slot
    /// of the scene's layout. Rejected while the scene participates in a
    /// running transition.
    pub fn place_source(
        &mut self,
        scene: &SceneId,
        source: &SourceId,
        placement: Option<SourcePlacement>,
    ) -> ComposeResult<()> {
        if !self.sources.contains_key(source) {
            return Err(ComposeError::UnknownSource(source.clone()));
        }
        self.check_mutable(scene)?;
        let entry = self.scene_mut(scene)?;
        let placement =
            placement.unwrap_or_else(|| layout_slot(entry.layout(), entry.entries().len()));
        entry.place(source.clone(), placement);
        Ok(())
    }

    /// Remove a source from one scene.
    pub fn unplace_source(&mut self, scene: &SceneId, source: &SourceId) -> ComposeResult<()> {
        self.check_mutable(scene)?;
        let entry = self.scene_mut(scene)?;
        if !entry.unplace(source) {
            return Err(ComposeError::UnknownSource(source.clone()));
        }
        Ok(())
    }

    /// Move the preview cursor. Never affects visible output.
    pub fn preview_scene(&mut self, scene: &SceneId) -> ComposeResult<()> {
        self.scene_index(scene)?;
        self.preview = Some(scene.clone());
        Ok(())
    }

    /// Move the program cursor to `scene` with the configured transition.
    ///
    /// Repeated switches to the current target run one transition, not
    /// several: switching to the scene that is already the program (or
    /// already being entered) is a no-op.
    #[instrument(name = "switch_scene", skip(self, now))]
    pub fn switch_scene(&mut self, scene: &SceneId, now: Instant) -> ComposeResult<SwitchOutcome> {
        self.scene_index(scene)?;

        if self.program.as_ref() == Some(scene) {
            return Ok(SwitchOutcome::AlreadyProgram);
        }

        // A retarget mid-transition completes the running switch first.
        if let Some(run) = self.transition.take() {
            debug!(to = %run.to, "Cutting running transition short for retarget");
        }

        let from = self.program.replace(scene.clone());
        let kind = self.default_transition;

        match from {
            Some(from) if !kind.is_instant() && !self.transition_duration.is_zero() => {
                self.transition = Some(TransitionRun::new(
                    kind,
                    from,
                    scene.clone(),
                    now,
                    self.transition_duration,
                ));
            }
            // First switch or cut: instantaneous.
            _ => {}
        }

        debug!(program = %scene, transition = ?kind, "Program cursor moved");
        Ok(SwitchOutcome::Switched(kind))
    }

    /// Register a hidden overlay.
    pub fn add_overlay(&mut self, spec: OverlaySpec) -> OverlayId {
        let overlay = Overlay::new(spec, Duration::from_millis(OVERLAY_ANIMATION_MS));
        let id = overlay.id().clone();
        self.overlay_order.push(id.clone());
        self.overlays.insert(id.clone(), overlay);
        id
    }

    /// Begin showing an overlay.
    pub fn show_overlay(&mut self, overlay: &OverlayId, now: Instant) -> ComposeResult<()> {
        self.overlay_mut(overlay)?.show(now);
        Ok(())
    }

    /// Begin hiding an overlay.
    pub fn hide_overlay(&mut self, overlay: &OverlayId, now: Instant) -> ComposeResult<()> {
        self.overlay_mut(overlay)?.hide(now);
        Ok(())
    }

    /// Replace an overlay's definition, keeping its lifecycle phase.
    pub fn update_overlay(&mut self, overlay: &OverlayId, spec: OverlaySpec) -> ComposeResult<()> {
        self.overlay_mut(overlay)?.update(spec);
        Ok(())
    }

    /// Render one tick of program output.
    ///
    /// Advances the running transition and overlay animations, then
    /// composes exactly one frame: mid-transition it carries both the
    /// outgoing and incoming composites plus the blend progress.
    pub fn tick(&mut self, now: Instant) -> ProgramFrame {
        // Finish a transition that has run its course.
        if let Some(run) = &self.transition {
            if run.is_complete(now) {
                debug!(to = %run.to, "Transition complete");
                self.transition = None;
            }
        }

        // Scene-scoped overlays leave with their scene.
        let program = self.program.clone();
        for overlay in self.overlays.values_mut() {
            if let Some(scope) = overlay.spec().scene_scope.clone() {
                let on_program = program.as_ref() == Some(&scope);
                if !on_program
                    && matches!(
                        overlay.phase(),
                        OverlayPhase::Visible | OverlayPhase::AnimatingIn { .. }
                    )
                {
                    overlay.hide(now);
                }
            }
            overlay.tick(now);
        }

        let primary = program.as_ref().and_then(|id| self.composite(id));
        let (outgoing, transition) = match &self.transition {
            Some(run) => (
                self.composite(&run.from),
                Some(TransitionSnapshot {
                    kind: run.kind,
                    from: run.from.clone(),
                    to: run.to.clone(),
                    progress: run.progress(now),
                }),
            ),
            None => (None, None),
        };

        let overlays = self
            .overlay_order
            .iter()
            .filter_map(|id| {
                let overlay = self.overlays.get(id)?;
                let opacity = overlay.opacity(now)?;
                Some(OverlayLayer {
                    overlay: id.clone(),
                    opacity,
                })
            })
            .collect();

        let frame = ProgramFrame {
            sequence: self.sequence,
            primary,
            outgoing,
            transition,
            overlays,
        };
        self.sequence += 1;
        frame
    }

    fn composite(&self, scene: &SceneId) -> Option<Composite> {
        let scene = self.scenes.iter().find(|s| s.id() == scene)?;
        let mut layers: Vec<ProgramLayer> = scene
            .entries()
            .iter()
            .filter(|e| e.placement.visible)
            .map(|e| ProgramLayer {
                source: e.source.clone(),
                placement: e.placement,
            })
            .collect();
        layers.sort_by_key(|l| l.placement.z_order);
        Some(Composite {
            scene: scene.id().clone(),
            layers,
        })
    }

    fn check_mutable(&self, scene: &SceneId) -> ComposeResult<()> {
        if let Some(run) = &self.transition {
            if run.involves(scene) {
                return Err(ComposeError::SceneInTransition(scene.clone()));
            }
        }
        Ok(())
    }

    fn scene_index(&self, scene: &SceneId) -> ComposeResult<usize> {
        self.scenes
            .iter()
            .position(|s| s.id() == scene)
            .ok_or_else(|| ComposeError::UnknownScene(scene.clone()))
    }

    fn scene_mut(&mut self, scene: &SceneId) -> ComposeResult<&mut Scene> {
        let index = self.scene_index(scene)?;
        Ok(&mut self.scenes[index])
    }

    fn overlay_mut(&mut self, overlay: &OverlayId) -> ComposeResult<&mut Overlay> {
        self.overlays
            .get_mut(overlay)
            .ok_or_else(|| ComposeError::UnknownOverlay(overlay.clone()))
    }
}
