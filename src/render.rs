//! Hooks for drawing and recording the cart-pole while it trains.
//!
//! The training loop hands every [`FrameSink`] the state after each step
//! together with the cumulative applied action, which is what a renderer
//! draws as the push on the cart. Whether a sink is recording or playing
//! back is only reported, never acted upon.

use {
    crate::envs::CartPoleState,
    tracing::info,
};

pub trait FrameSink {
    fn frame(
        &mut self,
        state: &CartPoleState,
        applied_action: f64,
    );

    fn is_recording(&self) -> bool {
        false
    }

    fn is_playing(&self) -> bool {
        false
    }
}

/// Discards every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn frame(
        &mut self,
        _state: &CartPoleState,
        _applied_action: f64,
    ) {
    }
}

/// Logs every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceSink {
    frames: usize,
}
impl TraceSink {
    pub fn frames(&self) -> usize {
        self.frames
    }
}

impl FrameSink for TraceSink {
    fn frame(
        &mut self,
        state: &CartPoleState,
        applied_action: f64,
    ) {
        self.frames += 1;
        info!(
            concat!(
                "\nFrame {}:",
                "\nAction post apply : {:.3}",
                "\nState after tick  : {}",
            ),
            self.frames, applied_action, state,
        );
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_sink_counts_frames() {
        let mut sink = TraceSink::default();
        for _ in 0..3 {
            sink.frame(&CartPoleState::default(), 0.5);
        }
        assert_eq!(sink.frames(), 3);
        assert!(!sink.is_recording());
        assert!(!sink.is_playing());
    }
}
