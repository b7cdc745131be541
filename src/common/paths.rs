use directories::ProjectDirs;
use std::path::PathBuf;

pub fn local_config_file() -> PathBuf {
    PathBuf::from("configs/facegate.toml")
}

pub fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("com", "facegate", "FaceGate")
        .map(|dirs| dirs.config_dir().join("facegate.toml"))
}

pub fn system_config_file() -> PathBuf {
    PathBuf::from("/etc/facegate/facegate.toml")
}

/// Config locations in lookup order.
pub fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![local_config_file()];
    candidates.extend(user_config_file());
    candidates.push(system_config_file());
    candidates
}
