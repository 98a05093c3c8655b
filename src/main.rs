//! Stone Sling entry point
//!
//! Headless driver: plays one CPU-vs-CPU match at the fixed timestep and
//! prints the final status as JSON.
//!
//! Usage: `stone-sling [level] [seed]`

#[cfg(not(target_arch = "wasm32"))]
use stone_sling::consts::SIM_DT;
#[cfg(not(target_arch = "wasm32"))]
use stone_sling::sim::{Rect, SideSettings};
#[cfg(not(target_arch = "wasm32"))]
use stone_sling::{LevelKind, MatchEvent, MatchStatus, Tuning, ai_decide, create_match, tick};

/// Give up after ten simulated minutes
#[cfg(not(target_arch = "wasm32"))]
const MAX_TICKS: u32 = 60 * 60 * 10;

#[cfg(not(target_arch = "wasm32"))]
const BOARD_WIDTH: f32 = 1280.0;
#[cfg(not(target_arch = "wasm32"))]
const BOARD_HEIGHT: f32 = 720.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Stone Sling (headless) starting...");

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let level: LevelKind = match args.next() {
        Some(arg) => arg.parse()?,
        None => LevelKind::default(),
    };
    let seed: u64 = match args.next() {
        Some(arg) => arg.parse()?,
        None => 42,
    };

    let board = Rect::from_size(BOARD_WIDTH, BOARD_HEIGHT);
    let config = level
        .config(board)
        .with_sides(SideSettings::automated("cpu-1"), SideSettings::automated("cpu-2"));
    let mut state = create_match(config, Tuning::for_board(BOARD_WIDTH, BOARD_HEIGHT), seed)?;
    log::info!("Playing level '{}' with seed {}", level, seed);

    let diagonal = board.diagonal();
    let mut shots = 0u32;
    for _ in 0..MAX_TICKS {
        if let Some(decision) = ai_decide(&state, diagonal) {
            if state.apply_decision(&decision) {
                shots += 1;
            }
        }

        for event in tick(&mut state, SIM_DT) {
            match event {
                MatchEvent::Collision { magnitude, .. } => {
                    log::trace!("Collision (magnitude {magnitude:.2})")
                }
                MatchEvent::Death { stone, side, .. } => {
                    log::info!("{side:?} lost stone {}", stone.0)
                }
                MatchEvent::Launch { stone, velocity } => {
                    log::debug!("Stone {} launched at {:.1}", stone.0, velocity.length())
                }
                MatchEvent::Finished { winner } => log::info!("{winner:?} wins"),
            }
        }

        if state.status == MatchStatus::Finished {
            break;
        }
    }

    if state.status != MatchStatus::Finished {
        log::warn!("Match still running after {MAX_TICKS} ticks");
    }
    log::info!("{} shots over {:.1}s", shots, state.elapsed);

    println!("{}", serde_json::to_string_pretty(&state.status())?);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No web front end; the library is the product on wasm
}
