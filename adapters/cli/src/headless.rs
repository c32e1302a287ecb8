//! Rendering backend that presents nothing and advances frames as fast as possible.

use std::{collections::VecDeque, time::Duration};

use anyhow::{ensure, Result};
use log::debug;
use transit_rendering::{FrameControl, FrameInput, Presentation, RenderingBackend, Scene};

/// Drives a fixed number of frames with a constant delta, replaying scripted input.
#[derive(Clone, Debug)]
pub(crate) struct HeadlessBackend {
    frame_dt: Duration,
    frame_limit: u64,
    script: VecDeque<FrameInput>,
}

impl HeadlessBackend {
    /// Creates a backend that runs at most `frame_limit` frames of `frame_dt` each.
    ///
    /// Scripted inputs are consumed one per frame; later frames receive no input.
    pub(crate) fn new(frame_dt: Duration, frame_limit: u64, script: VecDeque<FrameInput>) -> Self {
        Self {
            frame_dt,
            frame_limit,
            script,
        }
    }
}

impl RenderingBackend for HeadlessBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) -> FrameControl,
    {
        let Self {
            frame_dt,
            frame_limit,
            mut script,
        } = self;
        ensure!(!frame_dt.is_zero(), "frame duration must be positive");

        let Presentation {
            window_title,
            scene,
            ..
        } = presentation;
        let mut scene = scene;
        debug!(
            "{window_title}: running up to {frame_limit} headless frames of {frame_dt:?}"
        );

        for frame in 0..frame_limit {
            let input = script.pop_front().unwrap_or_default();
            if update_scene(frame_dt, input, &mut scene) == FrameControl::Exit {
                debug!("{window_title}: exit requested after frame {frame}");
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use transit_core::{GamePhase, GameSnapshot, SimulationSnapshot};
    use transit_rendering::{Color, SceneStyle};

    fn presentation() -> Presentation {
        let snapshot = SimulationSnapshot {
            stations: Vec::new(),
            lines: Vec::new(),
            trains: Vec::new(),
            game: GameSnapshot {
                score: 0,
                day: 1,
                time_until_next_day: Duration::from_secs(1),
                overflow_count: 0,
                phase: GamePhase::Playing,
            },
        };
        Presentation::new(
            "test",
            Color::from_rgb_u8(0, 0, 0),
            Scene::from_snapshot(SceneStyle::default(), &snapshot),
        )
    }

    #[test]
    fn replays_script_then_idles_until_frame_limit() {
        let scripted = FrameInput {
            cursor_world_space: Some(Vec2::new(1.0, 2.0)),
            activate: true,
            ..FrameInput::default()
        };
        let backend = HeadlessBackend::new(
            Duration::from_millis(16),
            4,
            VecDeque::from(vec![scripted]),
        );

        let mut seen = Vec::new();
        backend
            .run(presentation(), |dt, input, _| {
                assert_eq!(dt, Duration::from_millis(16));
                seen.push(input);
                FrameControl::Continue
            })
            .expect("headless run succeeds");

        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], scripted);
        let idle = FrameInput::default();
        assert!(seen[1..].iter().all(|input| *input == idle));
    }

    #[test]
    fn stops_when_the_scene_requests_exit() {
        let backend = HeadlessBackend::new(Duration::from_millis(16), 100, VecDeque::new());

        let mut frames = 0;
        backend
            .run(presentation(), |_, _, _| {
                frames += 1;
                if frames == 3 {
                    FrameControl::Exit
                } else {
                    FrameControl::Continue
                }
            })
            .expect("headless run succeeds");

        assert_eq!(frames, 3);
    }

    #[test]
    fn zero_frame_duration_is_rejected() {
        let backend = HeadlessBackend::new(Duration::ZERO, 10, VecDeque::new());

        let result = backend.run(presentation(), |_, _, _| FrameControl::Continue);

        assert!(result.is_err());
    }
}
