//! File-system access for the file routes: root confinement plus the
//! read/save/delete collaborator.

pub mod path;
pub mod store;

pub use path::{PathError, validate};
pub use store::{delete_file, read_file, save_file};
