pub use dkv_core::prelude::*;

// vim: ts=4
