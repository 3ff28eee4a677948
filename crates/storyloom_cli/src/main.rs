//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `storyloom_core` linkage.
//! - Apply an optional engine config file (first argument) before any work.
//! - Replay a tiny built-in timeline so query output can be eyeballed.
//! - Keep output deterministic (no ids or timestamps are printed).

use serde_json::json;
use std::error::Error;
use std::path::Path;
use storyloom_core::{
    init_logging, Engine, EngineConfig, EngineError, MutationPayload, StoryObject,
};

fn main() -> Result<(), Box<dyn Error>> {
    let config = match std::env::args_os().nth(1) {
        Some(path) => read_config(Path::new(&path))?,
        None => EngineConfig::default(),
    };
    let file_logging = init_logging(&config.logging)?;
    let engine = Engine::new(config)?;

    println!("storyloom_core ping={}", storyloom_core::ping());
    println!("storyloom_core version={}", storyloom_core::core_version());
    println!("storyloom_core file_logging={file_logging}");
    replay_demo(engine)?;
    Ok(())
}

fn read_config(path: &Path) -> Result<EngineConfig, Box<dyn Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(EngineConfig::from_json_str(&text)?)
}

fn replay_demo(mut engine: Engine) -> Result<(), EngineError> {
    let dawn = engine.append_timeslot()?;
    let noon = engine.append_timeslot()?;
    let dusk = engine.append_timeslot()?;

    let mara = engine.create_object(StoryObject::new("Mara"))?;
    engine.place_object(mara, dawn)?;
    engine.add_mutation(
        mara,
        noon,
        MutationPayload::new("ambush").with_change("health", json!(10), json!(4)),
    )?;
    engine.add_mutation(
        mara,
        dusk,
        MutationPayload::new("rest").with_change("health", json!(4), json!(7)),
    )?;

    for index in 0..engine.project().timeslots().len() {
        let state = engine.project().temporal().state_at(mara, index);
        let health = state
            .attribute("health")
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "demo index={} health={} mutations={}",
            index,
            health,
            state.applied_mutations.len()
        );
    }
    Ok(())
}
