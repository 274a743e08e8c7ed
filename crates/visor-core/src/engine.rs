//! Engine contract - the capability interface playback engines implement
//!
//! Concrete engines (multipart image streaming, pseudo-streaming
//! relays, ...) live outside this crate; this module defines the
//! surface they must expose to participate in selection and lifecycle
//! management, the factory signature the registry dispenses, and the
//! FPS instrumentation conforming engines embed.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::debug;

use crate::player::PlayerHandle;
use crate::stream::ConnectionParams;
use crate::types::Transition;
use crate::Result;

/// Constructor producing a fresh engine instance bound to a player.
///
/// The registry maps engine ids to factories; the player invokes the
/// factory lazily on first play, handing the engine a [`PlayerHandle`]
/// back-reference.
pub type EngineFactory = Arc<dyn Fn(PlayerHandle) -> Box<dyn Engine> + Send + Sync>;

/// Capability interface every playback engine implements.
///
/// Operations that can change the playback lifecycle declare the
/// transition they commit as part of their result and the owning
/// player applies it; engines never mutate player state directly.
/// `play` resolves with `Transition::To(Playing)` once media actually
/// starts, `stop` with `Transition::To(Stopped)` once the transport is
/// torn down. Out-of-band failures (a stream dying mid-playback) are
/// reported through [`PlayerHandle::report_error`].
#[async_trait]
pub trait Engine: Send {
    /// Idempotent initialization, invoked once before the first play.
    async fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    /// Begins playback of the given stream parameters.
    async fn play(&mut self, params: &ConnectionParams) -> Result<Transition>;

    /// Stops playback and closes the stream transport.
    async fn stop(&mut self) -> Result<Transition>;

    /// Pauses or resumes playback without tearing down the transport.
    async fn pause(&mut self, flag: bool) -> Result<Transition> {
        let _ = flag;
        Ok(Transition::None)
    }

    /// Mutes or unmutes audio output.
    async fn mute(&mut self, flag: bool) -> Result<()> {
        let _ = flag;
        Ok(())
    }

    /// Releases all engine resources; the instance is unusable afterwards.
    async fn destroy(&mut self) {}

    /// Offers an ICE-style remote stream candidate to the engine.
    async fn on_remote_candidate(&mut self, candidate: &str) -> Result<()> {
        debug!(candidate, "remote candidates not supported");
        Ok(())
    }
}

/// Frames-per-second estimator fed by successive frame timestamps.
///
/// The first update establishes the baseline (fps stays 0); each later
/// update derives the rate from the elapsed time since the previous
/// frame, rounded to three decimal places. Engines embed one of these
/// and forward [`FpsCounter::status_line`] to the player's status
/// display.
#[derive(Debug, Default)]
pub struct FpsCounter {
    prev: Option<Instant>,
    seq: u64,
    delta_ms: u64,
    fps: f64,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a frame and refreshes the estimate.
    pub fn update(&mut self) {
        let now = Instant::now();
        if self.prev.is_none() {
            self.prev = Some(now);
        }
        if self.seq > 0 {
            if let Some(prev) = self.prev {
                self.delta_ms = now.duration_since(prev).as_millis() as u64;
                if self.delta_ms > 0 {
                    self.fps = (1000.0 / self.delta_ms as f64 * 1000.0).round() / 1000.0;
                }
                self.prev = Some(now);
            }
        }
        self.seq += 1;
    }

    /// Current estimate; 0 until two frames have been observed.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Frames observed so far.
    pub fn frames(&self) -> u64 {
        self.seq
    }

    /// Milliseconds between the two most recent frames.
    pub fn delta_ms(&self) -> u64 {
        self.delta_ms
    }

    /// Formatted readout for the player's status display.
    pub fn status_line(&self) -> String {
        format!("{} ms ({:.3} fps)", self.delta_ms, self.fps)
    }
}
