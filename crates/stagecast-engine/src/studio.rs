//! The studio control loop.
//!
//! One thread owns every piece of session state and drains the command
//! channel; acquisition and publish run off-loop and come back as
//! epoch-tagged completions. A stop bumps the epoch, so a completion
//! that raced the stop is torn down instead of installed.

use std::collections::HashMap;
use std::mem;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, Receiver, Sender};
use tokio::runtime::Runtime;
use tracing::{debug, info, instrument, warn};

use stagecast_audio::{AudioError, AudioGraph, MidiDispatch, MidiMap, BLOCK_SIZE};
use stagecast_capture::{
    acquire, AcquireError, DeviceEvent, LocalMediaHandle, MediaBackend, PreviewSink,
};
use stagecast_compose::{Compositor, SwitchOutcome};
use stagecast_core::{
    Capability, ChannelId, DestinationStore, DeviceSelection, FanoutReport, LifecycleState,
    MidiAction, MidiMessage, ParticipantId, ProfileStore, PublishParams, SceneId, SessionId,
    SourceKind, StagecastConfig, StripConfig, StudioCommand, StudioEvent,
};
use stagecast_egress::FanoutController;
use stagecast_session::{CollabSession, SessionExit};
use stagecast_transport::{
    AccessTokenService, EgressService, PublishService, RoomHandle, TokenScope, TransportResult,
};

use crate::error::EngineError;
use crate::room::{can_go_live, RoomLink};
use crate::{EngineResult, COMPLETION_CHANNEL_CAPACITY};

/// Control loop tick while no command is pending.
const TICK: Duration = Duration::from_millis(20);

/// Wall time covered by one audio block (BLOCK_SIZE at the engine rate).
const BLOCK_INTERVAL: Duration = Duration::from_millis(10);

/// Blocks rendered per tick before the audio clock resynchronizes.
const MAX_CATCHUP_BLOCKS: u32 = 8;

/// Everything the engine talks to outside its own thread.
pub struct StudioServices {
    /// Device backend used for acquisition.
    pub backend: Arc<dyn MediaBackend>,

    /// Mints room-scoped publish tokens.
    pub tokens: Arc<dyn AccessTokenService>,

    /// Opens and closes the publish connection.
    pub publisher: Arc<dyn PublishService>,

    /// Server-side restream to external ingests.
    pub egress: Arc<dyn EgressService>,

    /// The channel's destination records.
    pub destinations: Arc<dyn DestinationStore>,

    /// Channel-level studio settings.
    pub profiles: Arc<dyn ProfileStore>,
}

/// Per-session engine parameters.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Session configuration.
    pub config: StagecastConfig,

    /// Channel the session belongs to.
    pub channel: ChannelId,

    /// Origin the studio runs under; gates device access.
    pub origin: String,

    /// Display identity of the local host.
    pub host_identity: String,
}

impl EngineOptions {
    /// Options with the default configuration and a secure local origin.
    pub fn new(channel: ChannelId, host_identity: impl Into<String>) -> Self {
        Self {
            config: StagecastConfig::default(),
            channel,
            origin: "https://studio.localhost".to_string(),
            host_identity: host_identity.into(),
        }
    }
}

/// Result of an off-loop operation, tagged with the epoch it started in.
enum Completion {
    Acquired {
        epoch: u64,
        sink: PreviewSink,
        result: Result<LocalMediaHandle, AcquireError>,
    },
    Published {
        epoch: u64,
        result: TransportResult<RoomHandle>,
    },
    FanoutStarted {
        epoch: u64,
        report: FanoutReport,
    },
}

/// The stream lifecycle controller for one open studio.
pub struct StudioEngine {
    command_rx: Receiver<StudioCommand>,
    event_tx: Sender<StudioEvent>,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
    runtime: Runtime,

    config: StagecastConfig,
    session_id: SessionId,
    channel: ChannelId,
    origin: String,

    backend: Arc<dyn MediaBackend>,
    tokens: Arc<dyn AccessTokenService>,
    publisher: Arc<dyn PublishService>,
    destinations: Arc<dyn DestinationStore>,
    fanout: Arc<FanoutController>,

    state: LifecycleState,
    epoch: u64,
    // None exactly while an acquisition is in flight.
    sink: Option<PreviewSink>,
    stream: Option<LocalMediaHandle>,
    room: RoomLink,
    auto_fanout: bool,

    compositor: Compositor,
    audio: AudioGraph,
    midi: MidiMap,
    session: CollabSession,

    audio_clock: Option<Instant>,
    block: Vec<f32>,
    last_meters: Instant,
}

impl StudioEngine {
    /// Create an engine wired to the given UI channels.
    pub fn new(
        services: StudioServices,
        options: EngineOptions,
        command_rx: Receiver<StudioCommand>,
        event_tx: Sender<StudioEvent>,
    ) -> EngineResult<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        // The channel profile overrides session defaults where set.
        let profile = services.profiles.profile(&options.channel);
        let compositor = Compositor::new(
            profile.default_transition,
            Duration::from_millis(profile.transition_duration_ms),
        );
        let session = CollabSession::new(
            options.host_identity.clone(),
            Duration::from_millis(options.config.request_expiry_ms),
        );
        let fanout = Arc::new(FanoutController::new(
            Arc::clone(&services.egress),
            Arc::clone(&services.destinations),
        ));
        let (completion_tx, completion_rx) = bounded(COMPLETION_CHANNEL_CAPACITY);

        Ok(Self {
            command_rx,
            event_tx,
            completion_tx,
            completion_rx,
            runtime,
            audio: AudioGraph::new(options.config.duck_attenuation),
            config: options.config,
            session_id: SessionId::new(),
            channel: options.channel,
            origin: options.origin,
            backend: services.backend,
            tokens: services.tokens,
            publisher: services.publisher,
            destinations: services.destinations,
            fanout,
            state: LifecycleState::Idle,
            epoch: 0,
            sink: Some(PreviewSink::new()),
            stream: None,
            room: RoomLink::Disconnected,
            auto_fanout: profile.auto_fanout,
            compositor,
            midi: MidiMap::new(),
            session,
            audio_clock: None,
            block: vec![0.0; BLOCK_SIZE],
            last_meters: Instant::now(),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    /// Run the control loop (blocking).
    #[instrument(name = "studio_run", skip(self))]
    pub fn run(&mut self) {
        info!(session = %self.session_id, channel = %self.channel, "Studio engine starting");
        self.send_event(StudioEvent::Ready {
            host: self.session.host_info(),
        });

        let commands = self.command_rx.clone();
        let completions = self.completion_rx.clone();

        loop {
            select! {
                recv(commands) -> msg => match msg {
                    Ok(command) => {
                        if !self.handle_command(command) {
                            break;
                        }
                    }
                    Err(_) => {
                        info!("Command channel disconnected, shutting down");
                        break;
                    }
                },
                recv(completions) -> msg => match msg {
                    Ok(completion) => self.handle_completion(completion),
                    Err(_) => break,
                },
                default(TICK) => self.tick(),
            }
        }

        info!("Studio engine stopped");
    }

    /// Handle a command. Returns false if the engine should stop.
    fn handle_command(&mut self, command: StudioCommand) -> bool {
        debug!(?command, "Handling command");

        match command {
            StudioCommand::StartPreview { selection } => self.start_preview(selection),
            StudioCommand::GoLive { params } => self.go_live(params),
            StudioCommand::StopLive => self.stop_live(),
            StudioCommand::StopPreview => self.stop_preview(),

            StudioCommand::CreateScene { name, layout } => {
                let scene = self.compositor.add_scene(name.clone(), layout);
                self.send_event(StudioEvent::SceneCreated { scene, name });
            }
            StudioCommand::AddSource { kind, label } => self.add_source(kind, label),
            StudioCommand::DropSource { source } => match self.compositor.drop_source(&source) {
                Ok(()) => {
                    self.audio.remove_strip(&source);
                    self.send_event(StudioEvent::SourceDropped { source });
                }
                Err(e) => self.recoverable(e),
            },
            StudioCommand::PlaceSource {
                scene,
                source,
                placement,
            } => {
                if let Err(e) = self.compositor.place_source(&scene, &source, placement) {
                    self.recoverable(e);
                }
            }
            StudioCommand::UnplaceSource { scene, source } => {
                if let Err(e) = self.compositor.unplace_source(&scene, &source) {
                    self.recoverable(e);
                }
            }
            StudioCommand::PreviewScene { scene } => {
                match self.compositor.preview_scene(&scene) {
                    Ok(()) => self.send_event(StudioEvent::PreviewChanged { scene }),
                    Err(e) => self.recoverable(e),
                }
            }
            StudioCommand::SwitchScene { actor, scene } => self.switch_scene(actor, scene),
            StudioCommand::CreateOverlay { spec } => {
                let overlay = self.compositor.add_overlay(spec);
                self.send_event(StudioEvent::OverlayCreated { overlay });
            }
            StudioCommand::ShowOverlay { overlay } => {
                if let Err(e) = self.compositor.show_overlay(&overlay, Instant::now()) {
                    self.recoverable(e);
                }
            }
            StudioCommand::HideOverlay { overlay } => {
                if let Err(e) = self.compositor.hide_overlay(&overlay, Instant::now()) {
                    self.recoverable(e);
                }
            }
            StudioCommand::UpdateOverlay { overlay, spec } => {
                if let Err(e) = self.compositor.update_overlay(&overlay, spec) {
                    self.recoverable(e);
                }
            }

            StudioCommand::SetFader {
                actor,
                source,
                gain,
            } => {
                if self.authorized(&actor, Capability::ControlAudio) {
                    if let Err(e) = self.audio.set_fader(&source, gain) {
                        self.recoverable(e);
                    }
                }
            }
            StudioCommand::SetMuted {
                actor,
                source,
                muted,
            } => {
                if self.authorized(&actor, Capability::ControlAudio) {
                    if let Err(e) = self.audio.set_muted(&source, muted) {
                        self.recoverable(e);
                    }
                }
            }
            StudioCommand::SetStripConfig {
                actor,
                source,
                config,
            } => {
                if self.authorized(&actor, Capability::ControlAudio) {
                    if let Err(e) = self.audio.set_strip_config(&source, &config) {
                        self.recoverable(e);
                    }
                }
            }
            StudioCommand::AddPad { spec } => {
                let label = spec.label.clone();
                match self.audio.add_pad(spec) {
                    Ok(pad) => self.send_event(StudioEvent::PadAdded { pad, label }),
                    Err(e) => self.recoverable(e),
                }
            }
            StudioCommand::TriggerPad { pad } => {
                if let Err(e) = self.audio.trigger_pad(&pad) {
                    self.recoverable(e);
                }
            }
            StudioCommand::StopPad { pad } => {
                if let Err(e) = self.audio.stop_pad(&pad) {
                    self.recoverable(e);
                }
            }
            // MIDI comes from the local control surface; it carries the
            // host's authority and skips the session checks.
            StudioCommand::Midi { message } => self.handle_midi(message),
            StudioCommand::LearnMidi { action } => self.midi.begin_learn(action),

            StudioCommand::Join { identity, role } => match self.session.join(identity, role) {
                Ok(info) => self.send_event(StudioEvent::ParticipantJoined { participant: info }),
                Err(e) => self.recoverable(e),
            },
            StudioCommand::Leave { participant } => match self.session.leave(&participant) {
                Ok(exit) => self.participant_left(exit),
                Err(e) => self.recoverable(e),
            },
            StudioCommand::Kick { actor, participant } => {
                match self.session.kick(&actor, &participant) {
                    Ok(exit) => self.participant_left(exit),
                    Err(e) => self.recoverable(e),
                }
            }
            StudioCommand::RequestControl {
                participant,
                capability,
            } => match self
                .session
                .request_control(&participant, capability, Instant::now())
            {
                Ok((request, _created)) => self.send_event(StudioEvent::ControlRequested {
                    request,
                    participant,
                    capability,
                }),
                Err(e) => self.recoverable(e),
            },
            StudioCommand::ResolveRequest {
                resolver,
                request,
                granted,
            } => match self
                .session
                .resolve_request(&resolver, &request, granted, Instant::now())
            {
                Ok(resolved) => self.send_event(StudioEvent::ControlResolved {
                    request: resolved.request,
                    granted: resolved.granted,
                    holder: resolved.holder,
                }),
                Err(e) => self.recoverable(e),
            },
            StudioCommand::SendCue { from, text } => match self.session.send_cue(&from, text) {
                Ok(cue) => self.send_event(StudioEvent::CueAppended { cue }),
                Err(e) => self.recoverable(e),
            },

            StudioCommand::SetDestinationEnabled {
                actor,
                destination,
                enabled,
            } => {
                if self.authorized(&actor, Capability::Publish)
                    && !self.destinations.set_enabled(&destination, enabled)
                {
                    self.recoverable(format!("unknown destination {destination}"));
                }
            }
            StudioCommand::StartFanout => self.start_fanout(),
            StudioCommand::StopFanout => self.stop_fanout(),

            StudioCommand::GetState => self.send_state(),
            StudioCommand::Shutdown => {
                self.stop_preview();
                self.send_event(StudioEvent::Shutdown);
                return false;
            }
        }

        true
    }

    /// Acquire devices off-loop and start the preview when they arrive.
    #[instrument(name = "start_preview", skip(self, selection))]
    fn start_preview(&mut self, selection: DeviceSelection) {
        if !self.state.is_idle() {
            self.reject(EngineError::InvalidTransition {
                operation: "start_preview",
                state: self.state.name(),
            });
            return;
        }
        let Some(mut sink) = self.sink.take() else {
            self.reject(EngineError::AcquireInFlight);
            return;
        };

        info!("Acquiring devices");
        let backend = Arc::clone(&self.backend);
        let origin = self.origin.clone();
        let timeout = Duration::from_millis(self.config.acquire_timeout_ms);
        let epoch = self.epoch;
        let completion_tx = self.completion_tx.clone();

        // acquire() blocks on the frame clock, so it runs off-loop and
        // the sink travels with it.
        thread::spawn(move || {
            let result = acquire(backend.as_ref(), &mut sink, &origin, &selection, timeout);
            let _ = completion_tx.send(Completion::Acquired {
                epoch,
                sink,
                result,
            });
        });
    }

    /// Publish the previewed stream to a room.
    #[instrument(name = "go_live", skip(self, params))]
    fn go_live(&mut self, params: PublishParams) {
        if !can_go_live(&self.state, self.stream.as_ref()) {
            self.reject(EngineError::InvalidTransition {
                operation: "go_live",
                state: self.state.name(),
            });
            return;
        }

        info!(room = %params.room, "Publishing room");
        self.transition_to(LifecycleState::Connecting);
        self.room = RoomLink::Connecting;

        let tokens = Arc::clone(&self.tokens);
        let publisher = Arc::clone(&self.publisher);
        let completion_tx = self.completion_tx.clone();
        let epoch = self.epoch;
        self.runtime.spawn(async move {
            let result = async {
                let token = tokens
                    .issue(TokenScope::publisher(params.room, params.identity))
                    .await?;
                publisher.publish(&token.token).await
            }
            .await;
            let _ = completion_tx.send(Completion::Published { epoch, result });
        });
    }

    /// Disconnect the room, stop fan-out, and tear the preview down.
    #[instrument(name = "stop_live", skip(self))]
    fn stop_live(&mut self) {
        if !self.state.is_live() && !self.state.is_connecting() {
            self.reject(EngineError::InvalidTransition {
                operation: "stop_live",
                state: self.state.name(),
            });
            return;
        }

        info!("Stopping live session");
        self.epoch += 1;

        let stopped = self.runtime.block_on(self.fanout.stop_fanout());
        debug!(stopped, "Egress jobs stopped");
        self.send_event(StudioEvent::FanoutStopped);

        if let RoomLink::Live(handle) = mem::take(&mut self.room) {
            if let Err(e) = self.runtime.block_on(self.publisher.disconnect(&handle)) {
                warn!(error = %e, "Room disconnect failed");
            }
        }

        self.release_stream();
        self.transition_to(LifecycleState::Idle);
    }

    /// Stop every local track and return to idle.
    ///
    /// Also the explicit reset out of the error state. While live this
    /// routes through the full live teardown.
    #[instrument(name = "stop_preview", skip(self))]
    fn stop_preview(&mut self) {
        if self.state.is_live() || self.state.is_connecting() {
            self.stop_live();
            return;
        }

        self.epoch += 1;
        self.room = RoomLink::Disconnected;
        self.release_stream();
        if !self.state.is_idle() {
            self.transition_to(LifecycleState::Idle);
        }
    }

    fn release_stream(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop_all();
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.stop_attached();
        }
        self.audio_clock = None;
    }

    /// Start egress jobs for every enabled destination.
    fn start_fanout(&mut self) {
        let Some(room) = self.room.room().cloned() else {
            self.reject(EngineError::NoPublishedRoom);
            return;
        };

        let fanout = Arc::clone(&self.fanout);
        let channel = self.channel.clone();
        let completion_tx = self.completion_tx.clone();
        let epoch = self.epoch;
        self.runtime.spawn(async move {
            let report = fanout.start_fanout(&channel, &room).await;
            let _ = completion_tx.send(Completion::FanoutStarted { epoch, report });
        });
    }

    fn stop_fanout(&mut self) {
        let stopped = self.runtime.block_on(self.fanout.stop_fanout());
        debug!(stopped, "Egress jobs stopped");
        self.send_event(StudioEvent::FanoutStopped);
    }

    fn add_source(&mut self, kind: SourceKind, label: String) {
        let source = self.compositor.add_source(kind, label.clone());
        // Every source carries a strip, so its meter exists from the start.
        if let Err(e) = self.audio.add_strip(&source, &StripConfig::default()) {
            let _ = self.compositor.drop_source(&source);
            self.recoverable(e);
            return;
        }
        self.send_event(StudioEvent::SourceAdded {
            source,
            kind,
            label,
        });
    }

    fn switch_scene(&mut self, actor: ParticipantId, scene: SceneId) {
        if !self.authorized(&actor, Capability::SwitchScene) {
            return;
        }
        match self.compositor.switch_scene(&scene, Instant::now()) {
            Ok(SwitchOutcome::Switched(transition)) => {
                self.send_event(StudioEvent::ProgramChanged { scene, transition });
            }
            Ok(SwitchOutcome::AlreadyProgram) => {
                debug!(scene = %scene, "Scene already on program");
            }
            Err(e) => self.recoverable(e),
        }
    }

    fn handle_midi(&mut self, message: MidiMessage) {
        match self.midi.handle(&message) {
            MidiDispatch::Learned(action) => {
                self.send_event(StudioEvent::MidiBound { message, action });
            }
            MidiDispatch::Bound(action) => self.apply_midi(action, message.value),
            MidiDispatch::Unmapped => debug!(?message, "Unmapped MIDI message"),
        }
    }

    fn apply_midi(&mut self, action: MidiAction, value: u8) {
        match action {
            MidiAction::TriggerPad(pad) => {
                if let Err(e) = self.audio.trigger_pad(&pad) {
                    self.recoverable(e);
                }
            }
            MidiAction::SetFader(source) => {
                let gain = f32::from(value) / 127.0;
                if let Err(e) = self.audio.set_fader(&source, gain) {
                    self.recoverable(e);
                }
            }
            MidiAction::ToggleMute(source) => match self.audio.strip_handle(&source) {
                Some(handle) => {
                    let muted = handle.muted.load(Ordering::Relaxed);
                    handle.muted.store(!muted, Ordering::Relaxed);
                }
                None => self.recoverable(AudioError::UnknownStrip(source)),
            },
        }
    }

    fn participant_left(&self, exit: SessionExit) {
        self.send_event(StudioEvent::ParticipantLeft {
            participant: exit.participant.id,
        });
        for request in exit.expired_requests {
            self.send_event(StudioEvent::ControlExpired { request });
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Acquired {
                epoch,
                mut sink,
                result,
            } => {
                if epoch != self.epoch {
                    debug!("Discarding stale acquisition");
                    if let Ok(handle) = &result {
                        handle.stop_all();
                    }
                    sink.stop_attached();
                    self.sink = Some(sink);
                    return;
                }
                self.sink = Some(sink);
                match result {
                    Ok(handle) => {
                        info!(tracks = handle.active_track_count(), "Preview started");
                        self.stream = Some(handle);
                        self.audio_clock = None;
                        self.last_meters = Instant::now();
                        self.transition_to(LifecycleState::Previewing);
                    }
                    Err(e) => {
                        warn!(error = %e, "Device acquisition failed");
                        let message = e.to_string();
                        self.transition_to(LifecycleState::Error {
                            message: message.clone(),
                        });
                        self.send_event(StudioEvent::Error {
                            recoverable: false,
                            message,
                        });
                    }
                }
            }
            Completion::Published { epoch, result } => {
                if epoch != self.epoch {
                    if let Ok(handle) = result {
                        debug!("Disconnecting stale publish");
                        let publisher = Arc::clone(&self.publisher);
                        self.runtime.spawn(async move {
                            if let Err(e) = publisher.disconnect(&handle).await {
                                warn!(error = %e, "Stale publish disconnect failed");
                            }
                        });
                    }
                    return;
                }
                match result {
                    Ok(handle) => {
                        info!(room = %handle.room, "Room published");
                        self.room = RoomLink::Live(handle);
                        self.transition_to(LifecycleState::Live);
                        if self.auto_fanout {
                            self.start_fanout();
                        }
                    }
                    Err(e) => {
                        // Preview survives; the operator can retry.
                        warn!(error = %e, "Publish failed");
                        self.room = RoomLink::Disconnected;
                        self.transition_to(LifecycleState::Previewing);
                        self.send_event(StudioEvent::Error {
                            recoverable: true,
                            message: e.to_string(),
                        });
                    }
                }
            }
            Completion::FanoutStarted { epoch, report } => {
                if epoch != self.epoch {
                    debug!("Stopping stale fan-out");
                    let fanout = Arc::clone(&self.fanout);
                    self.runtime.spawn(async move {
                        fanout.stop_fanout().await;
                    });
                    return;
                }
                info!(
                    started = report.started.len(),
                    failed = report.failed.len(),
                    "Fan-out started"
                );
                self.send_event(StudioEvent::FanoutStarted { report });
            }
        }
    }

    fn tick(&mut self) {
        let now = Instant::now();
        self.compositor.tick(now);

        for request in self.session.sweep_expired(now) {
            self.send_event(StudioEvent::ControlExpired { request });
        }

        if !self.state.holds_stream() {
            return;
        }
        self.check_devices();
        if !self.state.holds_stream() {
            return;
        }
        self.pump_audio(now);

        if now.duration_since(self.last_meters)
            >= Duration::from_millis(self.config.meter_interval_ms)
        {
            self.last_meters = now;
            let strips = self.audio.meters();
            if !strips.is_empty() {
                self.send_event(StudioEvent::Meters { strips });
            }
        }
    }

    /// React to device-side track ends.
    ///
    /// Before the room is published a dead track kills the whole preview;
    /// once live the session keeps running on whatever tracks remain.
    fn check_devices(&mut self) {
        let events = match self.stream.as_ref() {
            Some(stream) => stream.poll_device_events(),
            None => return,
        };
        for event in events {
            let DeviceEvent::TrackEnded { track } = event;
            if self.state.is_live() {
                warn!(track = %track, "Device track ended while live");
                self.send_event(StudioEvent::Error {
                    recoverable: true,
                    message: format!("device track {track} ended while live"),
                });
            } else {
                warn!(track = %track, "Device track ended, tearing preview down");
                self.epoch += 1;
                self.room = RoomLink::Disconnected;
                self.release_stream();
                let message = format!("device track {track} ended");
                self.transition_to(LifecycleState::Error {
                    message: message.clone(),
                });
                self.send_event(StudioEvent::Error {
                    recoverable: false,
                    message,
                });
                return;
            }
        }
    }

    /// Advance the audio graph to wall time in whole blocks.
    ///
    /// Silence feeds the strips, which lets pads play, ducks engage and
    /// release, and meters decay between real inputs. A long stall
    /// resynchronizes instead of rendering the backlog.
    fn pump_audio(&mut self, now: Instant) {
        let mut clock = self.audio_clock.unwrap_or(now);
        let inputs = HashMap::new();
        let mut blocks = 0u32;
        while now.duration_since(clock) >= BLOCK_INTERVAL {
            self.audio.process_block(&inputs, &mut self.block);
            clock += BLOCK_INTERVAL;
            blocks += 1;
            if blocks >= MAX_CATCHUP_BLOCKS {
                clock = now;
                break;
            }
        }
        self.audio_clock = Some(clock);
    }

    fn authorized(&self, actor: &ParticipantId, capability: Capability) -> bool {
        match self.session.authorize(actor, capability) {
            Ok(()) => true,
            Err(e) => {
                self.recoverable(e);
                false
            }
        }
    }

    fn reject(&self, err: EngineError) {
        warn!(error = %err, "Command rejected");
        self.send_event(StudioEvent::Error {
            recoverable: true,
            message: err.to_string(),
        });
    }

    fn recoverable(&self, err: impl std::fmt::Display) {
        self.send_event(StudioEvent::Error {
            recoverable: true,
            message: err.to_string(),
        });
    }

    fn send_state(&self) {
        let state = self.state.clone();
        self.send_event(StudioEvent::StateChanged {
            previous: Box::new(state.clone()),
            current: Box::new(state),
        });
    }

    fn transition_to(&mut self, next: LifecycleState) {
        let previous = mem::replace(&mut self.state, next.clone());
        debug!(
            previous = previous.name(),
            current = next.name(),
            "State transition"
        );
        self.send_event(StudioEvent::StateChanged {
            previous: Box::new(previous),
            current: Box::new(next),
        });
    }

    fn send_event(&self, event: StudioEvent) {
        if let Err(e) = self.event_tx.try_send(event) {
            warn!("Failed to send event: {e}");
        }
    }
}

impl Drop for StudioEngine {
    fn drop(&mut self) {
        self.release_stream();
    }
}
