//! Curling Sim entry point
//!
//! Headless demo: plays one scripted end through the frame clock and prints
//! every event, then the resting sheet, as JSON lines.
//!
//! Usage: `curling-sim [settings.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use curling_sim::Settings;
    use curling_sim::consts::SIM_DT;
    use curling_sim::sim::{
        ChargeRelease, CurlDirection, DeliveryParams, DeliveryPhase, FrameClock,
        SimulationContext, Team, TickInput,
    };

    env_logger::init();
    log::info!("Curling Sim (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings = match args.next() {
        Some(path) => Settings::load(path),
        None => Settings::default(),
    };
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0xC0FFEE);
    log::info!("Skill tier {}, seed {}", settings.skill_tier.as_str(), seed);

    // (effort %, aim radians, curl, handle)
    let script = [
        (52.0, 0.012, CurlDirection::CounterClockwise, 50.0),
        (50.0, -0.010, CurlDirection::Clockwise, 60.0),
        (56.0, 0.008, CurlDirection::CounterClockwise, 40.0),
        (80.0, 0.0, CurlDirection::Clockwise, 80.0),
        (54.0, -0.006, CurlDirection::Clockwise, 50.0),
        (58.0, 0.010, CurlDirection::CounterClockwise, 30.0),
        (90.0, 0.002, CurlDirection::CounterClockwise, 70.0),
        (55.0, -0.004, CurlDirection::Clockwise, 50.0),
    ];

    let mut ctx = SimulationContext::new(settings, seed);
    let mut clock = FrameClock::new();
    let mut input = TickInput::default();
    let mut team = Team::Red;

    for (effort, aim, curl, handle) in script {
        ctx.begin_delivery(team);
        let params = DeliveryParams {
            aim_angle: aim,
            effort_percent: effort,
            curl_direction: curl,
            handle_amount: handle,
        };
        if let ChargeRelease::Aborted(reason) = ctx.execute_delivery(params) {
            log::warn!("Delivery for {:?} aborted: {:?}", team, reason);
        }

        // Simulated 60 Hz display, fast-forwarding once the stone is let go
        let mut frames = 0u32;
        while ctx.phase() != DeliveryPhase::Waiting && frames < 60 * 120 {
            clock.set_fast_forward(4);
            clock.advance(&mut ctx, &mut input, SIM_DT);
            frames += 1;
            for event in ctx.drain_events() {
                print_json(&event);
            }
        }
        team = team.opponent();
    }

    for snapshot in ctx.snapshots() {
        print_json(&snapshot);
    }
    log::info!(
        "End complete: {} of {} stones in play after {} ticks",
        ctx.in_play_count(),
        ctx.stones().len(),
        ctx.time_ticks
    );
}

#[cfg(not(target_arch = "wasm32"))]
fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{}", line),
        Err(e) => log::error!("Failed to serialize output: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on wasm; the host drives `SimulationContext` directly
}
