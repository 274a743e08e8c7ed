//! Visor Core - Streaming Player Library
//!
//! This crate provides the core functionality for live-stream playback:
//! - Engine registry with preference-ranked selection
//! - Playback lifecycle state machine
//! - Asynchronous candidate-reachability probing
//! - Cache-busted stream URL construction
//! - The capability contract pluggable engines implement
//!
//! Rendering, control wiring and the wire protocols of concrete engines
//! (multipart image streaming, pseudo-streaming relays, ...) live in the
//! embedding application; this crate owns the decisions they consume.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Visor Core                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐           │
//! │  │    Engine    │  │  Candidate   │  │     URL      │           │
//! │  │   Registry   │  │    Prober    │  │   Builder    │           │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘           │
//! │         │                 │                 │                   │
//! │         │                 └────────┬────────┘                   │
//! │         │                          │                            │
//! │  ┌──────┴──────┐            ┌──────┴──────┐                     │
//! │  │   Player    │───────────▶│   Engine    │                     │
//! │  │  (states)   │◀───────────│  Contract   │                     │
//! │  └──────┬──────┘  handle    └─────────────┘                     │
//! │         │                                                       │
//! │     host callbacks (state changes, commands)                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod candidate;
pub mod engine;
pub mod error;
pub mod player;
pub mod registry;
pub mod stream;
pub mod types;

pub use candidate::{check_candidate, probe_candidate};
pub use engine::{Engine, EngineFactory, FpsCounter};
pub use error::{Error, Result};
pub use player::{Player, PlayerCallbacks, PlayerCore, PlayerHandle};
pub use registry::{EngineDescriptor, EngineRegistry};
pub use stream::{build_url, ConnectionParams, StreamAddress};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the player library with default configuration
pub fn init() {
    tracing::info!(version = VERSION, "Visor Core initialized");
}
