//! Redirected walking demo
//!
//! Loads a rig (JSON path as the first argument, or the built-in demo rig) and
//! runs a scripted walk through it: down the curved corridor, a turn on the
//! spot, then a short slide. Outcomes are logged.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Redirected walking demo starting...");

    if let Err(e) = demo::run(std::env::args().nth(1)) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Nothing to run without a host loop
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec3;

    use redirected_walking::consts::FRAME_DT;
    use redirected_walking::pose::{DroppingPoseSource, HeadPose, PoseSource, ScriptedPoseSource};
    use redirected_walking::redirect::RedirectionEventKind;
    use redirected_walking::rooms::{RoomArea, RoomEvent, TriggerEvent, TriggerPhase};
    use redirected_walking::sim::{TickInput, World, WorldEvent, tick};
    use redirected_walking::{Result, RigConfig, yaw_degrees};

    /// Share of tracking frames lost
    const DROP_CHANCE: f32 = 0.02;
    const DROP_SEED: u64 = 7;

    const CORRIDOR_FRAMES: usize = 300;
    const TURN_FRAMES: usize = 200;
    const TURN_DEG_PER_FRAME: f32 = -5.0;
    const SLIDE_FRAMES: usize = 150;

    /// Head motion for the whole demo, one entry per frame
    fn script() -> ScriptedPoseSource {
        let corridor_end = Vec3::new(0.0, 1.7, 3.0);
        let mut script =
            ScriptedPoseSource::walk(Vec3::new(0.0, 1.7, 0.0), corridor_end, 0.0, CORRIDOR_FRAMES);

        script.extend((1..=TURN_FRAMES).map(|i| {
            Some(HeadPose::facing(corridor_end, i as f32 * TURN_DEG_PER_FRAME))
        }));

        let final_yaw = TURN_FRAMES as f32 * TURN_DEG_PER_FRAME;
        let slide_end = corridor_end + Vec3::Z * 1.5;
        script.extend((1..=SLIDE_FRAMES).map(|i| {
            let t = i as f32 / SLIDE_FRAMES as f32;
            Some(HeadPose::facing(corridor_end.lerp(slide_end, t), final_yaw))
        }));
        script
    }

    pub fn run(path: Option<String>) -> Result<()> {
        let config = match path {
            Some(path) => RigConfig::load(path)?,
            None => RigConfig::demo(),
        };
        let mut world = World::from_config(&config)?;

        let phases = [
            (1, world.redirector_by_name("corridor")),
            (CORRIDOR_FRAMES + 1, world.redirector_by_name("turn")),
            (CORRIDOR_FRAMES + TURN_FRAMES + 1, world.redirector_by_name("slide")),
        ];
        let start_room = config
            .rooms
            .iter()
            .find(|r| r.player_starts_in_room)
            .and_then(|r| world.rooms.room_by_name(&r.name));

        let mut source = DroppingPoseSource::new(script(), DROP_CHANCE, DROP_SEED);
        let total_frames = CORRIDOR_FRAMES + TURN_FRAMES + SLIDE_FRAMES + 1;

        for frame in 0..total_frames {
            let mut input = TickInput {
                head_pose: source.try_head_pose(),
                ..Default::default()
            };
            if frame == 0 {
                if let Some(room) = start_room {
                    input.triggers.push(TriggerEvent::player(
                        room,
                        RoomArea::Interior,
                        TriggerPhase::Enter,
                    ));
                }
            }
            input.start.extend(
                phases
                    .iter()
                    .filter(|(start, _)| *start == frame)
                    .filter_map(|(_, id)| *id),
            );

            tick(&mut world, &input, FRAME_DT);
            report(&world.drain_events(), frame);
        }

        log::info!("Tracking dropped {} of {total_frames} frames", source.dropped());
        if let Some(object) = world.redirection_object {
            log::info!(
                "Redirection object at {:.3} facing {:.1} degrees",
                object.position,
                yaw_degrees(object.rotation)
            );
        }
        if let Some(logger) = world.logger.take() {
            logger.close()?;
        }
        Ok(())
    }

    fn report(events: &[WorldEvent], frame: usize) {
        for event in events {
            match event {
                WorldEvent::Redirection(e) => match e.kind {
                    RedirectionEventKind::Started => {
                        log::info!("[{frame}] {} started", e.name);
                    }
                    RedirectionEventKind::Ended(stats) => log::info!(
                        "[{frame}] {} ended after {:.2}s, head turned {:.1} degrees",
                        e.name,
                        stats.duration_secs,
                        stats.total_real_rotation_deg
                    ),
                    RedirectionEventKind::Interrupted(stats) => log::info!(
                        "[{frame}] {} interrupted after {:.2}s",
                        e.name,
                        stats.duration_secs
                    ),
                },
                WorldEvent::Room(RoomEvent::EnteredRoom { room, previous }) => {
                    log::info!("[{frame}] entered {room:?} (from {previous:?})");
                }
                WorldEvent::Room(other) => log::debug!("[{frame}] {other:?}"),
            }
        }
    }
}
