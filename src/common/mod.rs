mod frame;
mod fs;

pub(crate) use frame::*;
pub use fs::ensure_dir_exists;
