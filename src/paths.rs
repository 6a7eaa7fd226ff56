use std::path::PathBuf;

use crate::CRATE_NAME;

pub const INVENTORY_FILE: &str = "hosts.csv";
pub const SETTINGS_FILE: &str = "config.ini";

pub fn inventory_path(explicit: Option<PathBuf>) -> PathBuf {
    locate(explicit, INVENTORY_FILE)
}

pub fn settings_path(explicit: Option<PathBuf>) -> PathBuf {
    locate(explicit, SETTINGS_FILE)
}

// current working directory first (the historical layout), then the user
// config dir
fn locate(explicit: Option<PathBuf>, name: &str) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    let local = PathBuf::from(name);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join(CRATE_NAME).join(name))
        .unwrap_or(local)
}
