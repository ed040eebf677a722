//! Disk I/O and file lifecycle.
//!
//! Preallocates the output file to its final size (fallocate on Linux when
//! available, else set_len), supports concurrent offset writes from chunk
//! workers, and finalizes by renaming `<name>.part` to `<name>`.

mod builder;
mod writer;

pub use builder::StorageWriterBuilder;
pub use writer::StorageWriter;

/// Temporary file suffix used before the final rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `file.iso` → `file.iso.part`).
pub fn temp_path(final_path: &std::path::Path) -> std::path::PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    std::path::PathBuf::from(o)
}
