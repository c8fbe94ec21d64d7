pub use crate::app::App;
pub use dkv_types::prelude::*;

// vim: ts=4
