//! fetchq core: a sequential queue of download pages, each resolved to a
//! direct URL and fetched with parallel byte ranges or a single stream.

pub mod config;
pub mod control;
pub mod downloader;
pub mod error;
pub mod events;
pub mod fetch_head;
pub mod logging;
pub mod resolver;
pub mod retry;
pub mod scheduler;
pub mod segmenter;
pub mod session;
pub mod storage;
pub mod url_model;

pub use control::EngineControl;
pub use error::EngineError;
pub use events::{EngineEvent, Observer};
pub use scheduler::{DownloadEngine, ItemStatus, Queue, QueueItem, QueueProcessor, RunSummary};
