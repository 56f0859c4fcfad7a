use chrono::Local;

use super::{engine_at, preload_holidays, CmdResult, ConfigStore};

/// One tick at launch time, then print the projection. Nothing is saved.
pub fn run(store: &ConfigStore) -> CmdResult {
    let config = store.load()?;
    let now = Local::now();
    let holidays = preload_holidays(&config, now)?;
    let mut engine = engine_at(&config, &holidays, now);
    engine.tick_at(now);
    println!("{}", serde_json::to_string_pretty(&engine.status())?);
    Ok(())
}
