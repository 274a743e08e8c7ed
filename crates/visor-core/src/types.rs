//! Core types for the Visor player

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stream::StreamAddress;

/// Unique identifier for a player instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    /// Initial state, no stream attached
    Stopped,
    /// An engine is connecting to the stream
    Loading,
    /// Media is playing
    Playing,
    /// Playback paused without tearing down the transport
    Paused,
    /// A fatal error occurred
    Error,
}

impl std::fmt::Display for PlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerState::Stopped => write!(f, "stopped"),
            PlayerState::Loading => write!(f, "loading"),
            PlayerState::Playing => write!(f, "playing"),
            PlayerState::Paused => write!(f, "paused"),
            PlayerState::Error => write!(f, "error"),
        }
    }
}

/// State change an engine operation commits.
///
/// Engine contract methods declare the transition they trigger as part
/// of their result; the owning player applies it uniformly instead of
/// trusting engines to call back into the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The operation does not change the lifecycle state
    None,
    /// Commit the given state once the operation resolves
    To(PlayerState),
}

/// Severity of a user-facing player message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageSeverity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for MessageSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageSeverity::Info => write!(f, "info"),
            MessageSeverity::Warning => write!(f, "warning"),
            MessageSeverity::Error => write!(f, "error"),
        }
    }
}

/// User-facing overlay message surfaced by the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMessage {
    pub severity: MessageSeverity,
    pub text: String,
}

/// Playback commands dispatched through the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Play,
    Stop,
    Fullscreen,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Play => write!(f, "play"),
            Command::Stop => write!(f, "stop"),
            Command::Fullscreen => write!(f, "fullscreen"),
        }
    }
}

/// Where a command originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandSource {
    /// The player's own controls
    Controls,
    /// The embedding application
    Host,
}

/// Player configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Desired media format (MJPEG, FLV, ...)
    pub format: String,
    /// Explicit engine id override; auto-selected from the registry when unset
    pub engine: Option<String>,
    /// Default stream address engines fall back to when a play request
    /// carries no address of its own
    pub address: Option<StreamAddress>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            format: "MJPEG".to_string(),
            engine: None,
            address: None,
        }
    }
}
