//! Player - owns the engine instance and drives the state machine
//!
//! The player translates host commands into engine calls and surfaces
//! playback status through callbacks and queryable state.
//! [`PlayerCore::set_state`] is the single authoritative mutation point
//! for playback state; engine operations declare their transitions and
//! the player applies them uniformly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tracing::{debug, info, instrument, warn};

use crate::engine::Engine;
use crate::registry::EngineRegistry;
use crate::stream::{ConnectionParams, StreamAddress};
use crate::types::{
    Command, CommandSource, MessageSeverity, PlayerConfig, PlayerId, PlayerMessage, PlayerState,
    Transition,
};
use crate::{Error, Result};

/// Host hooks fired by the player.
///
/// `on_command` runs before default command handling; returning true
/// claims the command. `on_state_change` fires once per committed
/// state transition.
pub struct PlayerCallbacks {
    pub on_command: Arc<dyn Fn(PlayerId, Command, CommandSource) -> bool + Send + Sync>,
    pub on_state_change: Arc<dyn Fn(PlayerId, PlayerState, Option<&str>) + Send + Sync>,
}

impl Default for PlayerCallbacks {
    fn default() -> Self {
        Self {
            on_command: Arc::new(|_, _, _| false),
            on_state_change: Arc::new(|_, _, _| {}),
        }
    }
}

/// State shared between a player and its engine instance.
///
/// Engines receive a [`PlayerHandle`] over this core; the player keeps
/// the owning reference. All state mutation funnels through
/// [`PlayerCore::set_state`].
pub struct PlayerCore {
    id: PlayerId,
    config: PlayerConfig,
    callbacks: PlayerCallbacks,
    state: RwLock<PlayerState>,
    state_tx: watch::Sender<PlayerState>,
    playing: AtomicBool,
    status: RwLock<Option<String>>,
    message: RwLock<Option<PlayerMessage>>,
}

impl PlayerCore {
    fn new(config: PlayerConfig, callbacks: PlayerCallbacks) -> Self {
        let (state_tx, _) = watch::channel(PlayerState::Stopped);
        Self {
            id: PlayerId::new(),
            config,
            callbacks,
            state: RwLock::new(PlayerState::Stopped),
            state_tx,
            playing: AtomicBool::new(false),
            status: RwLock::new(None),
            message: RwLock::new(None),
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub async fn state(&self) -> PlayerState {
        *self.state.read().await
    }

    /// Derived flag: true exactly while the state is `Playing`.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    /// Subscribe to committed state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<PlayerState> {
        self.state_tx.subscribe()
    }

    /// Commits a state transition.
    ///
    /// Re-entering the current state is a no-op, so hosts never observe
    /// duplicate callbacks. A committed transition clears the transient
    /// status line, refreshes the derived playing flag, replaces the
    /// user-facing message (severity error iff the new state is the
    /// error state) and notifies the host.
    pub async fn set_state(&self, state: PlayerState, message: Option<&str>) {
        {
            let mut current = self.state.write().await;
            if *current == state {
                return;
            }
            info!(player = %self.id, from = %*current, to = %state, "state transition");
            *current = state;
        }

        *self.status.write().await = None;
        self.playing
            .store(state == PlayerState::Playing, Ordering::Relaxed);

        let message_record = message.map(|text| PlayerMessage {
            severity: if state == PlayerState::Error {
                MessageSeverity::Error
            } else {
                MessageSeverity::Info
            },
            text: text.to_string(),
        });
        *self.message.write().await = message_record;

        let _ = self.state_tx.send(state);
        (self.callbacks.on_state_change)(self.id, state, message);
    }

    /// Transient status line (FPS readouts and the like).
    pub async fn status(&self) -> Option<String> {
        self.status.read().await.clone()
    }

    pub async fn display_status(&self, status: Option<&str>) {
        *self.status.write().await = status.map(str::to_string);
    }

    /// Current user-facing overlay message, if any.
    pub async fn message(&self) -> Option<PlayerMessage> {
        self.message.read().await.clone()
    }

    /// Shows an overlay message without a state change (nag screens,
    /// degraded-mode warnings).
    pub async fn display_message(&self, severity: MessageSeverity, text: impl Into<String>) {
        let text = text.into();
        debug!(player = %self.id, %severity, message = %text, "display message");
        *self.message.write().await = Some(PlayerMessage { severity, text });
    }

    pub async fn clear_message(&self) {
        *self.message.write().await = None;
    }
}

/// Engine-side handle to the owning player.
///
/// Engines report errors, forward status lines and apply out-of-band
/// transitions through this handle; they never hold the player itself.
#[derive(Clone)]
pub struct PlayerHandle {
    core: Arc<PlayerCore>,
}

impl PlayerHandle {
    fn new(core: Arc<PlayerCore>) -> Self {
        Self { core }
    }

    pub fn player_id(&self) -> PlayerId {
        self.core.id()
    }

    pub async fn state(&self) -> PlayerState {
        self.core.state().await
    }

    /// Media format the player was configured for.
    pub fn format(&self) -> &str {
        &self.core.config().format
    }

    /// Player-level default address engines fall back to when a play
    /// request carries none of its own.
    pub fn default_address(&self) -> Option<StreamAddress> {
        self.core.config().address.clone()
    }

    /// Applies a transition produced outside a contract method (an
    /// engine's internal task reaching the playing state, say).
    pub async fn apply(&self, transition: Transition) {
        match transition {
            Transition::None => {}
            Transition::To(state) => self.core.set_state(state, None).await,
        }
    }

    /// Reports a fatal engine failure, forcing the error state.
    ///
    /// Runtime engine errors are absorbed into the state machine; they
    /// surface only through the state-change callback and the displayed
    /// message.
    pub async fn report_error(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        warn!(player = %self.core.id(), error = message, "engine error");
        self.core.set_state(PlayerState::Error, Some(message)).await;
    }

    /// Forwards a status line (FPS readout) to the player display.
    pub async fn display_status(&self, status: impl Into<String>) {
        self.core.display_status(Some(&status.into())).await;
    }
}

/// Player owning the current engine instance and driving the
/// stopped → loading → playing/error → stopped lifecycle.
pub struct Player {
    core: Arc<PlayerCore>,
    registry: Arc<EngineRegistry>,
    engine: Option<Box<dyn Engine>>,
    engine_id: Option<String>,
    destroyed: bool,
}

impl Player {
    /// Creates a player, auto-selecting the preferred compatible engine
    /// when the configuration names none.
    pub fn new(
        config: PlayerConfig,
        callbacks: PlayerCallbacks,
        registry: Arc<EngineRegistry>,
    ) -> Self {
        let engine_id = config.engine.clone().or_else(|| {
            registry
                .preferred_engine(Some(config.format.as_str()))
                .map(|e| e.id)
        });
        debug!(engine = ?engine_id, format = %config.format, "player created");
        Self {
            core: Arc::new(PlayerCore::new(config, callbacks)),
            registry,
            engine: None,
            engine_id,
            destroyed: false,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.core.id()
    }

    pub async fn state(&self) -> PlayerState {
        self.core.state().await
    }

    pub fn is_playing(&self) -> bool {
        self.core.is_playing()
    }

    pub async fn status(&self) -> Option<String> {
        self.core.status().await
    }

    pub async fn message(&self) -> Option<PlayerMessage> {
        self.core.message().await
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PlayerState> {
        self.core.subscribe_state()
    }

    /// Resolved engine id: the explicit override or the registry's
    /// preference at construction time.
    pub fn engine_id(&self) -> Option<&str> {
        self.engine_id.as_deref()
    }

    /// Handle engines use to reach back into this player.
    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle::new(Arc::clone(&self.core))
    }

    /// Instantiates the configured engine.
    ///
    /// Validates that an engine id is resolvable, registered,
    /// implemented and supported before constructing the instance and
    /// running its one-time setup. Failures force the error state and
    /// are re-raised.
    pub async fn setup(&mut self) -> Result<()> {
        match self.try_setup().await {
            Ok(()) => Ok(()),
            Err(error) => {
                self.core
                    .set_state(PlayerState::Error, Some(&error.to_string()))
                    .await;
                Err(error)
            }
        }
    }

    async fn try_setup(&mut self) -> Result<()> {
        if self.destroyed {
            return Err(Error::Destroyed);
        }
        let id = self.engine_id.clone().ok_or(Error::EngineNotConfigured)?;
        if !self.registry.has(&id) {
            return Err(Error::EngineNotAvailable(id));
        }
        let factory = self
            .registry
            .factory(&id)
            .ok_or_else(|| Error::EngineNotFound(id.clone()))?;
        if !self.registry.supports(&id) {
            return Err(Error::EngineNotSupported(id));
        }

        let mut engine = factory(self.handle());
        engine.setup().await?;
        info!(player = %self.core.id(), engine = %id, "engine ready");
        self.engine = Some(engine);
        Ok(())
    }

    /// Begins playback.
    ///
    /// Lazily constructs the engine, commits the loading state and
    /// delegates; the engine's `play` resolves with the transition to
    /// apply once media actually starts. Any error forces the error
    /// state carrying its message and is re-raised to the caller.
    #[instrument(skip(self))]
    pub async fn play(&mut self, params: ConnectionParams) -> Result<()> {
        match self.try_play(&params).await {
            Ok(()) => Ok(()),
            Err(error) => {
                self.core
                    .set_state(PlayerState::Error, Some(&error.to_string()))
                    .await;
                Err(error)
            }
        }
    }

    async fn try_play(&mut self, params: &ConnectionParams) -> Result<()> {
        if self.destroyed {
            return Err(Error::Destroyed);
        }
        if self.engine.is_none() {
            self.try_setup().await?;
        }
        if self.core.state().await == PlayerState::Playing {
            return Ok(());
        }

        self.core.set_state(PlayerState::Loading, None).await;
        let engine = self
            .engine
            .as_mut()
            .ok_or_else(|| Error::Internal("engine instance missing after setup".into()))?;
        let transition = engine.play(params).await?;
        self.apply(transition).await;
        Ok(())
    }

    /// Stops playback; a no-op when already stopped.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> Result<()> {
        if self.destroyed {
            return Err(Error::Destroyed);
        }
        if self.core.state().await == PlayerState::Stopped {
            return Ok(());
        }
        if let Some(engine) = self.engine.as_mut() {
            let transition = engine.stop().await?;
            self.apply(transition).await;
        }
        Ok(())
    }

    /// Pauses or resumes playback through the engine.
    pub async fn pause(&mut self, flag: bool) -> Result<()> {
        if let Some(engine) = self.engine.as_mut() {
            let transition = engine.pause(flag).await?;
            self.apply(transition).await;
        }
        Ok(())
    }

    /// Mutes or unmutes audio output.
    pub async fn mute(&mut self, flag: bool) -> Result<()> {
        if let Some(engine) = self.engine.as_mut() {
            engine.mute(flag).await?;
        }
        Ok(())
    }

    /// Offers a remote stream candidate to the engine.
    pub async fn on_remote_candidate(&mut self, candidate: &str) -> Result<()> {
        if let Some(engine) = self.engine.as_mut() {
            engine.on_remote_candidate(candidate).await?;
        }
        Ok(())
    }

    /// Dispatches a playback command.
    ///
    /// The host's `on_command` hook runs first; when it declines the
    /// command, the defaults apply: play with the configured default
    /// parameters, stop, and fullscreen (which belongs to the host view
    /// and is only logged here).
    pub async fn send_command(&mut self, cmd: Command, source: CommandSource) -> Result<()> {
        if (self.core.callbacks.on_command)(self.core.id(), cmd, source) {
            return Ok(());
        }
        match cmd {
            Command::Play => self.play(ConnectionParams::default()).await,
            Command::Stop => self.stop().await,
            Command::Fullscreen => {
                debug!(player = %self.core.id(), "fullscreen toggling is handled by the host view");
                Ok(())
            }
        }
    }

    async fn apply(&self, transition: Transition) {
        match transition {
            Transition::None => {}
            Transition::To(state) => self.core.set_state(state, None).await,
        }
    }

    /// Tears down the engine and releases player surfaces; the player
    /// is unusable afterwards.
    #[instrument(skip(self))]
    pub async fn destroy(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy().await;
        }
        self.core.display_status(None).await;
        self.core.clear_message().await;
        self.destroyed = true;
        info!(player = %self.core.id(), "player destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EngineDescriptor;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    struct MockEngine {
        handle: PlayerHandle,
        fail_play: bool,
        setup_calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Engine for MockEngine {
        async fn setup(&mut self) -> Result<()> {
            self.setup_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn play(&mut self, params: &ConnectionParams) -> Result<Transition> {
            if self.fail_play {
                return Err(Error::Engine("connection refused by peer".into()));
            }
            // Engines fall back to the player's configured address.
            let effective = params
                .address
                .clone()
                .or_else(|| self.handle.default_address());
            if effective.is_none() {
                return Err(Error::MissingAddress);
            }
            Ok(Transition::To(PlayerState::Playing))
        }

        async fn stop(&mut self) -> Result<Transition> {
            Ok(Transition::To(PlayerState::Stopped))
        }
    }

    struct Fixture {
        registry: Arc<EngineRegistry>,
        setup_calls: Arc<AtomicUsize>,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(EngineRegistry::new());
        let setup_calls = Arc::new(AtomicUsize::new(0));

        registry.register(EngineDescriptor::new("A", "Engine A", 1, true));
        registry.register(EngineDescriptor::new("B", "Engine B", 5, true));

        for id in ["A", "B"] {
            let setup_calls = Arc::clone(&setup_calls);
            let fail = id == "A";
            registry.register_factory(id, Arc::new(move |handle| {
                Box::new(MockEngine {
                    handle,
                    fail_play: fail,
                    setup_calls: Arc::clone(&setup_calls),
                }) as Box<dyn Engine>
            }));
        }

        Fixture {
            registry,
            setup_calls,
        }
    }

    fn state_recorder() -> (PlayerCallbacks, Arc<Mutex<Vec<PlayerState>>>) {
        let states = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&states);
        let callbacks = PlayerCallbacks {
            on_state_change: Arc::new(move |_, state, _| {
                recorded.lock().unwrap().push(state);
            }),
            ..Default::default()
        };
        (callbacks, states)
    }

    fn params() -> ConnectionParams {
        ConnectionParams::new(StreamAddress::new("http", "cam.local", 8080))
    }

    #[tokio::test]
    async fn test_auto_selects_preferred_engine() {
        let fx = fixture();
        let player = Player::new(
            PlayerConfig::default(),
            PlayerCallbacks::default(),
            fx.registry,
        );
        assert_eq!(player.engine_id(), Some("B"));
        assert_eq!(player.state().await, PlayerState::Stopped);
    }

    #[tokio::test]
    async fn test_explicit_engine_override() {
        let fx = fixture();
        let config = PlayerConfig {
            engine: Some("A".to_string()),
            ..Default::default()
        };
        let player = Player::new(config, PlayerCallbacks::default(), fx.registry);
        assert_eq!(player.engine_id(), Some("A"));
    }

    #[tokio::test]
    async fn test_play_reaches_playing() {
        let fx = fixture();
        let (callbacks, states) = state_recorder();
        let mut player = Player::new(PlayerConfig::default(), callbacks, fx.registry);

        player.play(params()).await.unwrap();

        assert_eq!(player.state().await, PlayerState::Playing);
        assert!(player.is_playing());
        assert_eq!(
            *states.lock().unwrap(),
            vec![PlayerState::Loading, PlayerState::Playing]
        );
        assert_eq!(fx.setup_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_play_while_playing_is_noop() {
        let fx = fixture();
        let (callbacks, states) = state_recorder();
        let mut player = Player::new(PlayerConfig::default(), callbacks, fx.registry);

        player.play(params()).await.unwrap();
        player.play(params()).await.unwrap();

        assert_eq!(states.lock().unwrap().len(), 2);
        assert_eq!(fx.setup_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_engine_error_forces_error_state_and_reraises() {
        let fx = fixture();
        let config = PlayerConfig {
            engine: Some("A".to_string()),
            ..Default::default()
        };
        let mut player = Player::new(config, PlayerCallbacks::default(), fx.registry);

        let error = player.play(params()).await.unwrap_err();
        assert!(matches!(error, Error::Engine(_)));
        assert_eq!(player.state().await, PlayerState::Error);

        let message = player.message().await.unwrap();
        assert_eq!(message.severity, MessageSeverity::Error);
        assert!(message.text.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_unimplemented_engine_is_configuration_error() {
        let registry = Arc::new(EngineRegistry::new());
        registry.register(EngineDescriptor::new("ghost", "Ghost", 5, true));
        let mut player = Player::new(
            PlayerConfig::default(),
            PlayerCallbacks::default(),
            registry,
        );

        let error = player.play(params()).await.unwrap_err();
        assert!(matches!(error, Error::EngineNotFound(_)));
        assert!(error.is_configuration());
        assert_eq!(player.state().await, PlayerState::Error);
        let message = player.message().await.unwrap();
        assert!(message.text.contains("ghost"));
    }

    #[tokio::test]
    async fn test_unsupported_engine_is_configuration_error() {
        let fx = fixture();
        fx.registry.set_support("B", false);
        let config = PlayerConfig {
            engine: Some("B".to_string()),
            ..Default::default()
        };
        let mut player = Player::new(config, PlayerCallbacks::default(), fx.registry);

        let error = player.setup().await.unwrap_err();
        assert!(matches!(error, Error::EngineNotSupported(_)));
        assert_eq!(player.state().await, PlayerState::Error);
    }

    #[tokio::test]
    async fn test_empty_registry_means_not_configured() {
        let registry = Arc::new(EngineRegistry::new());
        let mut player = Player::new(
            PlayerConfig::default(),
            PlayerCallbacks::default(),
            registry,
        );

        assert!(player.engine_id().is_none());
        let error = player.play(params()).await.unwrap_err();
        assert!(matches!(error, Error::EngineNotConfigured));
    }

    #[tokio::test]
    async fn test_stop_when_stopped_is_noop() {
        let fx = fixture();
        let (callbacks, states) = state_recorder();
        let mut player = Player::new(PlayerConfig::default(), callbacks, fx.registry);

        player.stop().await.unwrap();
        assert!(states.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stop_after_play() {
        let fx = fixture();
        let mut player = Player::new(
            PlayerConfig::default(),
            PlayerCallbacks::default(),
            fx.registry,
        );

        player.play(params()).await.unwrap();
        player.stop().await.unwrap();
        assert_eq!(player.state().await, PlayerState::Stopped);
        assert!(!player.is_playing());
    }

    #[tokio::test]
    async fn test_set_state_idempotent_on_repeat() {
        let fx = fixture();
        let (callbacks, states) = state_recorder();
        let player = Player::new(PlayerConfig::default(), callbacks, fx.registry);
        let handle = player.handle();

        handle.apply(Transition::To(PlayerState::Loading)).await;
        handle.apply(Transition::To(PlayerState::Loading)).await;

        assert_eq!(*states.lock().unwrap(), vec![PlayerState::Loading]);
    }

    #[tokio::test]
    async fn test_runtime_error_report() {
        let fx = fixture();
        let mut player = Player::new(
            PlayerConfig::default(),
            PlayerCallbacks::default(),
            fx.registry,
        );
        player.play(params()).await.unwrap();

        let handle = player.handle();
        handle.report_error("stream closed by remote host").await;

        assert_eq!(player.state().await, PlayerState::Error);
        assert!(!player.is_playing());
        let message = player.message().await.unwrap();
        assert_eq!(message.severity, MessageSeverity::Error);
    }

    #[tokio::test]
    async fn test_state_change_clears_status_display() {
        let fx = fixture();
        let mut player = Player::new(
            PlayerConfig::default(),
            PlayerCallbacks::default(),
            fx.registry,
        );
        player.play(params()).await.unwrap();

        player.handle().display_status("40 ms (25.000 fps)").await;
        assert!(player.status().await.is_some());

        player.stop().await.unwrap();
        assert!(player.status().await.is_none());
    }

    #[tokio::test]
    async fn test_command_hook_claims_command() {
        let fx = fixture();
        let callbacks = PlayerCallbacks {
            on_command: Arc::new(|_, _, _| true),
            ..Default::default()
        };
        let mut player = Player::new(PlayerConfig::default(), callbacks, fx.registry);

        player
            .send_command(Command::Play, CommandSource::Controls)
            .await
            .unwrap();
        assert_eq!(player.state().await, PlayerState::Stopped);
    }

    #[tokio::test]
    async fn test_command_default_play_uses_config_address() {
        let fx = fixture();
        let config = PlayerConfig {
            address: Some(StreamAddress::new("http", "cam.local", 8080)),
            ..Default::default()
        };
        let mut player = Player::new(config, PlayerCallbacks::default(), fx.registry);

        player
            .send_command(Command::Play, CommandSource::Controls)
            .await
            .unwrap();
        assert_eq!(player.state().await, PlayerState::Playing);
    }

    #[tokio::test]
    async fn test_command_default_play_without_address_errors() {
        let fx = fixture();
        let mut player = Player::new(
            PlayerConfig::default(),
            PlayerCallbacks::default(),
            fx.registry,
        );

        let error = player
            .send_command(Command::Play, CommandSource::Host)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::MissingAddress));
        assert_eq!(player.state().await, PlayerState::Error);
    }

    #[tokio::test]
    async fn test_destroy_leaves_player_unusable() {
        let fx = fixture();
        let mut player = Player::new(
            PlayerConfig::default(),
            PlayerCallbacks::default(),
            fx.registry,
        );
        player.play(params()).await.unwrap();

        player.destroy().await;
        assert!(player.message().await.is_none());

        let error = player.play(params()).await.unwrap_err();
        assert!(matches!(error, Error::Destroyed));
    }
}
