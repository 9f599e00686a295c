//! Writing a rendered build to disk.

pub mod static_copy;
pub mod writer;

pub use static_copy::copy_static;
pub use writer::{replace_output_dir, validate_output_dir, validate_output_path, write_files};
