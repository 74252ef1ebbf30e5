//! Head pose sampling
//!
//! Tracking can drop out for a frame. Sources report that with `None` and the
//! `PoseSampler` falls back to the last known pose, which makes the frame's
//! motion delta zero.

use std::collections::VecDeque;

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Head position and rotation in tracking space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for HeadPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl HeadPose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Standing at `position`, facing `yaw_deg` around up
    pub fn facing(position: Vec3, yaw_deg: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw_deg.to_radians()),
        }
    }
}

/// Anything that can report the current head pose
pub trait PoseSource {
    /// Current head pose, or `None` if tracking produced no sample this frame
    fn try_head_pose(&mut self) -> Option<HeadPose>;
}

/// Previous and current pose for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseDelta {
    pub previous: HeadPose,
    pub current: HeadPose,
}

impl PoseDelta {
    #[inline]
    pub fn translation(&self) -> Vec3 {
        self.current.position - self.previous.position
    }

    /// Signed yaw change in degrees (positive = turning right)
    #[inline]
    pub fn yaw(&self) -> f32 {
        crate::yaw_delta(self.previous.rotation, self.current.rotation)
    }
}

/// Tracks the last known pose so a missing sample becomes a zero delta
///
/// Until the first real sample arrives there is nothing to measure motion
/// from, so every delta is zero and the first sample is only recorded.
#[derive(Debug, Clone, Default)]
pub struct PoseSampler {
    last: Option<HeadPose>,
    missed_frames: u32,
}

impl PoseSampler {
    pub fn new(initial: HeadPose) -> Self {
        Self {
            last: Some(initial),
            missed_frames: 0,
        }
    }

    /// Last known pose, `None` before the first sample
    pub fn last(&self) -> Option<HeadPose> {
        self.last
    }

    /// Consecutive frames without a fresh sample
    pub fn missed_frames(&self) -> u32 {
        self.missed_frames
    }

    /// Advance one frame with an optional fresh sample
    pub fn advance(&mut self, sample: Option<HeadPose>) -> PoseDelta {
        let previous = self.last;
        match sample {
            Some(pose) => {
                self.missed_frames = 0;
                self.last = Some(pose);
            }
            None => self.missed_frames += 1,
        }
        let current = self.last.unwrap_or_default();
        PoseDelta {
            previous: previous.unwrap_or(current),
            current,
        }
    }
}

/// Pre-recorded samples, `None` entries are dropped frames
///
/// Once exhausted, the source keeps reporting the final pose.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPoseSource {
    samples: VecDeque<Option<HeadPose>>,
    last: Option<HeadPose>,
}

impl ScriptedPoseSource {
    pub fn new(samples: impl IntoIterator<Item = Option<HeadPose>>) -> Self {
        Self {
            samples: samples.into_iter().collect(),
            last: None,
        }
    }

    /// Straight walk from `from` to `to` over `frames` frames (both ends included)
    pub fn walk(from: Vec3, to: Vec3, yaw_deg: f32, frames: usize) -> Self {
        let steps = frames.max(1);
        let samples = (0..=steps).map(|i| {
            let t = i as f32 / steps as f32;
            Some(HeadPose::facing(from.lerp(to, t), yaw_deg))
        });
        Self::new(samples)
    }

    /// Append more samples to the end of the script
    pub fn extend(&mut self, samples: impl IntoIterator<Item = Option<HeadPose>>) {
        self.samples.extend(samples);
    }

    pub fn remaining(&self) -> usize {
        self.samples.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.samples.is_empty()
    }
}

impl PoseSource for ScriptedPoseSource {
    fn try_head_pose(&mut self) -> Option<HeadPose> {
        match self.samples.pop_front() {
            Some(Some(pose)) => {
                self.last = Some(pose);
                Some(pose)
            }
            Some(None) => None,
            None => self.last,
        }
    }
}

/// Wraps a source and drops samples with a fixed probability (seeded)
#[derive(Debug, Clone)]
pub struct DroppingPoseSource<S> {
    inner: S,
    drop_chance: f32,
    rng: Pcg32,
    dropped: u64,
}

impl<S: PoseSource> DroppingPoseSource<S> {
    pub fn new(inner: S, drop_chance: f32, seed: u64) -> Self {
        Self {
            inner,
            drop_chance: drop_chance.clamp(0.0, 1.0),
            rng: Pcg32::seed_from_u64(seed),
            dropped: 0,
        }
    }

    /// Samples dropped so far
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: PoseSource> PoseSource for DroppingPoseSource<S> {
    fn try_head_pose(&mut self) -> Option<HeadPose> {
        // Always pull from the inner source so the script keeps its pace
        let sample = self.inner.try_head_pose();
        if self.rng.random::<f32>() < self.drop_chance {
            self.dropped += 1;
            return None;
        }
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sample_reuses_last_pose() {
        let mut sampler = PoseSampler::new(HeadPose::at(Vec3::ZERO));
        let d = sampler.advance(Some(HeadPose::at(Vec3::new(0.0, 0.0, 0.5))));
        assert!((d.translation().z - 0.5).abs() < 1e-6);

        let d = sampler.advance(None);
        assert_eq!(d.translation(), Vec3::ZERO);
        assert_eq!(sampler.missed_frames(), 1);

        let d = sampler.advance(Some(HeadPose::at(Vec3::new(0.0, 0.0, 0.75))));
        assert!((d.translation().z - 0.25).abs() < 1e-6);
        assert_eq!(sampler.missed_frames(), 0);
    }

    #[test]
    fn test_first_sample_is_only_recorded() {
        let mut sampler = PoseSampler::default();
        let d = sampler.advance(None);
        assert_eq!(d.translation(), Vec3::ZERO);
        assert!(d.yaw().abs() < 1e-6);
        assert_eq!(sampler.last(), None);

        let pose = HeadPose::facing(Vec3::new(0.0, 1.7, 1.0), 45.0);
        let d = sampler.advance(Some(pose));
        assert_eq!(d.translation(), Vec3::ZERO);
        assert!(d.yaw().abs() < 1e-6);
        assert_eq!(sampler.last(), Some(pose));

        let d = sampler.advance(Some(HeadPose::facing(Vec3::new(0.0, 1.7, 1.5), 45.0)));
        assert!((d.translation().z - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_yaw_delta() {
        let mut sampler = PoseSampler::new(HeadPose::facing(Vec3::ZERO, 170.0));
        let d = sampler.advance(Some(HeadPose::facing(Vec3::ZERO, -170.0)));
        assert!((d.yaw() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_scripted_source_holds_last_pose() {
        let mut source = ScriptedPoseSource::new([
            Some(HeadPose::at(Vec3::X)),
            None,
            Some(HeadPose::at(Vec3::Y)),
        ]);
        assert_eq!(source.try_head_pose(), Some(HeadPose::at(Vec3::X)));
        assert_eq!(source.try_head_pose(), None);
        assert_eq!(source.try_head_pose(), Some(HeadPose::at(Vec3::Y)));
        assert!(source.is_exhausted());
        assert_eq!(source.try_head_pose(), Some(HeadPose::at(Vec3::Y)));
    }

    #[test]
    fn test_walk_covers_both_ends() {
        let mut source = ScriptedPoseSource::walk(Vec3::ZERO, Vec3::Z, 0.0, 4);
        assert_eq!(source.remaining(), 5);
        assert_eq!(source.try_head_pose().map(|p| p.position), Some(Vec3::ZERO));
        let mut last = None;
        while !source.is_exhausted() {
            last = source.try_head_pose();
        }
        assert_eq!(last.map(|p| p.position), Some(Vec3::Z));
    }

    #[test]
    fn test_dropping_source_is_deterministic() {
        let script = ScriptedPoseSource::walk(Vec3::ZERO, Vec3::Z, 0.0, 200);
        let mut a = DroppingPoseSource::new(script.clone(), 0.25, 7);
        let mut b = DroppingPoseSource::new(script, 0.25, 7);
        for _ in 0..200 {
            assert_eq!(a.try_head_pose(), b.try_head_pose());
        }
        assert_eq!(a.dropped(), b.dropped());
        assert!(a.dropped() > 0);
    }

    #[test]
    fn test_dropping_source_never_drops_at_zero_chance() {
        let script = ScriptedPoseSource::walk(Vec3::ZERO, Vec3::Z, 0.0, 50);
        let mut source = DroppingPoseSource::new(script, 0.0, 1);
        for _ in 0..50 {
            assert!(source.try_head_pose().is_some());
        }
        assert_eq!(source.dropped(), 0);
    }
}
