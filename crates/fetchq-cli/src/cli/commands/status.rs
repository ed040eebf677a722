//! `fetchq status` – show the saved queue.

use anyhow::Result;
use fetchq_core::session::SessionStatus;
use fetchq_core::ItemStatus;

use super::load_queue;

pub fn run_status() -> Result<()> {
    let (store, queue, warning) = load_queue()?;
    if let Some(w) = warning {
        eprintln!("warning: {}", w);
    }
    if queue.is_empty() {
        println!("Queue is empty ({}).", store.path().display());
        return Ok(());
    }
    for item in queue.items() {
        println!("{}  {}", SessionStatus::from(item.status).icon(), item.source_url);
    }
    println!(
        "{} pending, {} completed, {} failed",
        queue.count(ItemStatus::Pending),
        queue.count(ItemStatus::Completed),
        queue.count(ItemStatus::Failed)
    );
    Ok(())
}
