//! Per-node animation timeline
//!
//! A node plays at most one clip at a time. Its timeline moves through three
//! states: idle (no clip selected), playing, and stopped once the requested
//! number of loops has been consumed.

use crate::foundation::collections::NodeId;

/// Events raised while a timeline wraps around the end of its clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimationEvent {
    /// The clip wrapped and will keep playing
    Loop,
    /// The clip wrapped for the last requested time
    Complete,
}

/// Callback invoked with the owning node when its timeline raises an event
pub type AnimationEventHandler = Box<dyn FnMut(NodeId, AnimationEvent)>;

/// Playback state derived from the timeline fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No clip selected
    Idle,
    /// A clip is selected and loops remain
    Playing,
    /// All requested loops are done; advancing is a no-op
    Stopped,
}

/// Timeline position and loop bookkeeping for one node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationTimeline {
    /// Index of the selected clip in the node's animation list
    pub clip: Option<usize>,
    /// Position on the timeline, in frames (the integer part is the frame)
    pub position: f32,
    /// Multiplier applied to every advance
    pub speed: f32,
    /// Loops left to play; negative means forever
    pub remaining_loops: i32,
}

impl Default for AnimationTimeline {
    fn default() -> Self {
        Self {
            clip: None,
            position: 0.0,
            speed: 1.0,
            remaining_loops: -1,
        }
    }
}

impl AnimationTimeline {
    /// Select a clip and rewind to its first frame
    pub fn play(&mut self, clip: usize) {
        self.clip = Some(clip);
        self.position = 0.0;
    }

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        match (self.clip, self.remaining_loops) {
            (None, _) => PlaybackState::Idle,
            (Some(_), 0) => PlaybackState::Stopped,
            (Some(_), _) => PlaybackState::Playing,
        }
    }

    /// Frame index at the current position
    pub fn frame(&self) -> usize {
        self.position.max(0.0) as usize
    }

    /// Move the timeline forward by `delta * speed` frames
    ///
    /// When the end of a `frame_count` long clip is reached the position wraps
    /// (keeping its fractional part) and an event is returned: `Loop` while
    /// more than one loop remains, `Complete` on the last one. A positive loop
    /// counter is consumed by each wrap; the timeline stops on the call after
    /// `Complete`.
    pub fn advance(&mut self, frame_count: usize, delta: f32) -> Option<AnimationEvent> {
        if self.state() != PlaybackState::Playing || self.position < 0.0 || frame_count == 0 {
            return None;
        }

        self.position += delta * self.speed;

        let frames = frame_count as f32;
        if self.position.floor() < frames {
            return None;
        }

        self.position %= frames;

        let event = if self.remaining_loops == 1 {
            AnimationEvent::Complete
        } else {
            AnimationEvent::Loop
        };

        if self.remaining_loops > 0 {
            self.remaining_loops -= 1;
        }

        Some(event)
    }
}
