mod support;

use learnonauts_lab::config::{self, LabSettings};
use learnonauts_lab::workbench::{SNAPSHOT_FILE_NAME, default_snapshot_path};
use support::learnonauts_env::LearnonautsEnvGuard;
use tempfile::tempdir;

#[test]
fn settings_round_trip_under_the_config_home() {
    let dir = tempdir().unwrap();
    let _guard = LearnonautsEnvGuard::set_config_home(dir.path().to_path_buf());

    assert_eq!(config::load_or_default().unwrap(), LabSettings::default());

    let mut settings = LabSettings::default();
    settings.training.learning_rate = 0.5;
    settings.accessibility.reduced_motion = true;
    settings.knn.max_k = 9;
    config::save_settings(&settings).unwrap();

    let path = config::config_path().unwrap();
    assert!(path.starts_with(dir.path()));
    assert_eq!(config::load_or_default().unwrap(), settings);
}

#[test]
fn snapshots_default_to_the_models_directory() {
    let dir = tempdir().unwrap();
    let _guard = LearnonautsEnvGuard::set_config_home(dir.path().to_path_buf());
    let path = default_snapshot_path().unwrap();
    assert!(path.starts_with(dir.path()));
    assert!(path.ends_with(format!("models/{SNAPSHOT_FILE_NAME}")));
    assert!(path.parent().unwrap().is_dir());
}
