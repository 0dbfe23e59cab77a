//! Skeletal animation clips and the pose applier seam

use super::Model;
use crate::foundation::math::Transform;

/// One skeletal animation: a bone pose per frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationClip {
    /// Clip name, used by name-based playback
    pub name: String,
    /// Number of frames in the timeline
    pub frame_count: usize,
    /// Bone transforms for each frame
    pub frame_poses: Vec<Vec<Transform>>,
}

impl AnimationClip {
    /// Create a clip from its frame poses
    pub fn new(name: impl Into<String>, frame_poses: Vec<Vec<Transform>>) -> Self {
        Self {
            name: name.into(),
            frame_count: frame_poses.len(),
            frame_poses,
        }
    }
}

/// The set of clips loaded from one animation file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationList {
    /// Clips in file order
    pub clips: Vec<AnimationClip>,
}

impl AnimationList {
    /// Wrap a list of clips
    pub fn new(clips: Vec<AnimationClip>) -> Self {
        Self { clips }
    }

    /// Index of the first clip with the given name
    pub fn find(&self, name: &str) -> Option<usize> {
        self.clips.iter().position(|clip| clip.name == name)
    }
}

/// Poses a model's skeleton at a frame of an animation clip
pub trait PoseApplier {
    /// Mutate `model`'s current pose in place to match `clip` at `frame`
    fn apply_pose(&mut self, model: &mut Model, clip: &AnimationClip, frame: usize);
}

/// Copies the clip's frame pose straight into the model
///
/// Frames past the end clamp to the last one; bones missing from the frame
/// keep their current pose.
#[derive(Debug, Clone, Copy, Default)]
pub struct FramePoseApplier;

impl PoseApplier for FramePoseApplier {
    fn apply_pose(&mut self, model: &mut Model, clip: &AnimationClip, frame: usize) {
        let Some(poses) = clip.frame_poses.get(frame).or_else(|| clip.frame_poses.last()) else {
            return;
        };

        for (current, pose) in model.pose.iter_mut().zip(poses) {
            *current = *pose;
        }
    }
}
