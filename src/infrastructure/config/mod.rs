//! Configuration infrastructure module

mod xdg;

pub use xdg::{default_data_dir, XdgConfigStore, APP_DIR};
