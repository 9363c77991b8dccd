use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    /// Where the result history lives.
    pub fn results_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("typometer");
            Some(state_dir.join("results.json"))
        } else {
            ProjectDirs::from("", "", "typometer")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("results.json"))
        }
    }
}
