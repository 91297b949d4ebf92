use pomocycle_core::StateStore;

use super::render;

pub fn run(json: bool, clear: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = StateStore::open()?;
    if clear {
        store.clear()?;
        tracing::debug!(path = %store.path().display(), "cleared saved state");
        println!("saved session cleared");
        return Ok(());
    }
    match store.load()? {
        Some(snapshot) if json => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        Some(snapshot) => println!("{}", render::snapshot_line(&snapshot)),
        None if json => println!("null"),
        None => println!("no saved session"),
    }
    Ok(())
}
