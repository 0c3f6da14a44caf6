//! Neon Arcade headless runner
//!
//! In the browser the page drives `ArcadeHandle` from the wasm build; natively
//! this binary plays each game unattended for a fixed number of frames and
//! prints the final HUD. Set `NEON_ARCADE_SEED` for a reproducible run and
//! `NEON_ARCADE_SETTINGS` to a JSON settings file to override tuning.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use neon_arcade::platform::{FixedStepDriver, FrameFlag};
    use neon_arcade::sim::{GameEvent, GameKind, Session};
    use neon_arcade::Settings;

    const FRAMES: u32 = 60 * 60;

    env_logger::init();
    log::info!("Neon Arcade (native) starting...");

    let mut settings = match std::env::var("NEON_ARCADE_SETTINGS") {
        Ok(path) => match std::fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|json| Settings::from_json(&json).map_err(|err| err.to_string()))
        {
            Ok(settings) => settings,
            Err(err) => {
                log::error!("Could not load {path}: {err}");
                std::process::exit(1);
            }
        },
        Err(_) => Settings::default(),
    };
    if let Some(seed) = std::env::var("NEON_ARCADE_SEED").ok().and_then(|s| s.parse().ok()) {
        settings.seed = Some(seed);
    }

    for kind in GameKind::ALL {
        let mut session = Session::new(kind.create(&settings));
        let mut flag = FrameFlag::default();
        // Shooter fires whenever fire is held; everything else plays idle
        if kind == GameKind::Shooter {
            session.key_down(" ", &mut flag);
        }

        let report = FixedStepDriver::new(1.0 / 60.0).run(&mut session, FRAMES);
        let hud = session.hud();
        let levels = report
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::LevelCleared { .. }))
            .count();

        println!(
            "{:<9} frames {:>5}  score {:>6}  level {:>2}  lives {:>4}  events {:>4}  levels cleared {}{}",
            kind.as_str(),
            report.frames,
            hud.score,
            hud.level,
            hud.lives.map(|l| l.to_string()).unwrap_or_else(|| "-".into()),
            report.events.len(),
            levels,
            if hud.game_over { "  (game over)" } else { "" },
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is web::start; this only satisfies the bin target
}
