//! `fetchq clear` – drop every link from the saved queue.

use anyhow::Result;
use fetchq_core::session::SessionStore;

pub fn run_clear() -> Result<()> {
    let store = SessionStore::open_default()?;
    store.clear()?;
    println!("Queue cleared.");
    Ok(())
}
