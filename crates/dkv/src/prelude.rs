pub use dkv_core::app::App;
pub use dkv_types::error::{ClResult, Error};
pub use dkv_types::types::{ConfigPath, PropertyMap, TenantRecord};

pub use tracing::{debug, error, info, warn};

// vim: ts=4
