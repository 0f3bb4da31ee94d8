mod support;

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use learnonauts_lab::config::LabSettings;
use learnonauts_lab::dataset::{DatasetKind, ImportOutcome, Label};
use learnonauts_lab::training::{HostScheduler, TrainingState};
use learnonauts_lab::vision::DirectorySource;
use learnonauts_lab::workbench::{Mode, Workbench};
use tempfile::tempdir;

fn workbench(seed: u64) -> (Workbench, Arc<HostScheduler>) {
    let mut settings = LabSettings::default();
    settings.training.seed = Some(seed);
    settings.render.width = 120;
    settings.render.height = 120;
    let scheduler = Arc::new(HostScheduler::new());
    let workbench = Workbench::new(settings, scheduler.clone(), DirectorySource::new("."));
    (workbench, scheduler)
}

#[test]
fn pausing_before_the_first_frame_freezes_the_model() {
    let (mut workbench, scheduler) = workbench(11);
    let before = workbench.engine().model();
    assert!(workbench.start_training());
    assert!(workbench.pause_training());
    scheduler.run_frame();
    scheduler.run_frame();
    let after = workbench.engine().model();
    assert_eq!(before.w1.to_bits(), after.w1.to_bits());
    assert_eq!(before.w2.to_bits(), after.w2.to_bits());
    assert_eq!(before.bias.to_bits(), after.bias.to_bits());
    assert_eq!(workbench.engine().epoch(), 0);
}

#[test]
fn frames_train_the_ocean_dataset_to_high_accuracy() {
    let (mut workbench, scheduler) = workbench(12);
    workbench.start_training();
    for _ in 0..40 {
        scheduler.run_frame();
    }
    workbench.pause_training();
    let metrics = workbench.engine().metrics();
    assert_eq!(metrics.epoch, 40 * 12);
    assert!(metrics.accuracy >= 0.95, "accuracy {}", metrics.accuracy);
    assert!(metrics.loss.is_finite());
}

#[test]
fn switching_datasets_stops_training_and_resets() {
    let (mut workbench, scheduler) = workbench(13);
    workbench.start_training();
    scheduler.run_frame();
    let trained = workbench.engine().model();
    workbench.set_dataset_kind(DatasetKind::FruitVeg);
    assert_eq!(workbench.training_state(), TrainingState::Idle);
    assert_eq!(workbench.engine().epoch(), 0);
    assert_ne!(workbench.engine().model(), trained);
    scheduler.run_frame();
    assert_eq!(workbench.engine().epoch(), 0);
}

#[test]
fn switching_modes_stops_training() {
    let (mut workbench, scheduler) = workbench(14);
    workbench.start_training();
    workbench.set_mode(Mode::Image);
    assert_eq!(workbench.training_state(), TrainingState::Idle);
    assert!(!workbench.start_training());
    scheduler.run_frame();
    assert_eq!(workbench.engine().epoch(), 0);
}

#[test]
fn reduced_motion_applies_to_a_running_loop() {
    let (mut workbench, scheduler) = workbench(17);
    workbench.start_training();
    scheduler.run_frame();
    assert_eq!(workbench.engine().epoch(), 12);
    workbench.set_reduced_motion(true);
    assert!(workbench.reduced_motion());
    assert_eq!(workbench.training_state(), TrainingState::Running);
    assert_eq!(scheduler.pending(), 1);
    scheduler.run_frame();
    assert_eq!(workbench.engine().epoch(), 15);
}

#[test]
fn rejected_csv_leaves_training_and_dataset_alone() {
    let (mut workbench, scheduler) = workbench(15);
    let before = workbench.engine().dataset().to_vec();
    workbench.start_training();
    let outcome = workbench.import_csv("x,y,label\n,,\nabc,def,1\n");
    assert!(matches!(outcome, ImportOutcome::Empty { .. }));
    assert_eq!(workbench.training_state(), TrainingState::Running);
    assert_eq!(workbench.engine().dataset(), before.as_slice());
    scheduler.run_frame();
    assert!(workbench.engine().epoch() > 0);
}

#[test]
fn accepted_csv_becomes_the_normalized_dataset() {
    let (mut workbench, _scheduler) = workbench(16);
    let outcome = workbench.import_csv("x,y,label\n0.2,0.1,fish\n0.4,0.3,boat\n0.3,0.2,yes\n");
    assert_eq!(outcome.skipped(), 0);
    let engine = workbench.engine();
    assert_eq!(engine.kind(), DatasetKind::Csv);
    let points = engine.dataset();
    assert_eq!(points.len(), 3);
    assert_eq!((points[0].x, points[0].y, points[0].label), (0.0, 0.0, Label::Positive));
    assert!((points[1].x - 1.0).abs() < 1e-6 && (points[1].y - 1.0).abs() < 1e-6);
    assert_eq!(points[1].label, Label::Negative);
}

#[test]
fn draw_canvas_clicks_append_points_with_the_active_label() {
    let (mut workbench, _scheduler) = workbench(17);
    workbench.set_dataset_kind(DatasetKind::Draw);
    workbench.set_draw_label(Label::Negative);
    let first = workbench.click_canvas(0.0, 120.0).unwrap();
    workbench.set_draw_label(Label::Positive);
    let second = workbench.click_canvas(120.0, 0.0).unwrap();
    assert_eq!((first.x, first.y, first.label), (0.0, 0.0, Label::Negative));
    assert_eq!((second.x, second.y, second.label), (1.0, 1.0, Label::Positive));
    assert_eq!(workbench.engine().dataset().len(), 2);
}

#[test]
fn completion_reports_live_accuracy_exactly_once() {
    let (mut workbench, scheduler) = workbench(18);
    let calls = Arc::new(AtomicUsize::new(0));
    let reported = Arc::new(AtomicUsize::new(usize::MAX));
    {
        let calls = calls.clone();
        let reported = reported.clone();
        workbench.on_complete(move |score| {
            calls.fetch_add(1, Ordering::SeqCst);
            reported.store(score as usize, Ordering::SeqCst);
        });
    }
    workbench.start_training();
    for _ in 0..30 {
        scheduler.run_frame();
    }
    let expected = (workbench.engine().metrics().accuracy * 100.0).round() as u8;
    assert_eq!(workbench.complete(), Some(expected));
    assert_eq!(workbench.complete(), None);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(reported.load(Ordering::SeqCst), expected as usize);
    assert_eq!(workbench.completion(), Some(expected));
    assert_eq!(workbench.training_state(), TrainingState::Idle);
}

#[test]
fn saved_model_restores_after_reset() {
    let (mut workbench, scheduler) = workbench(19);
    workbench.start_training();
    for _ in 0..5 {
        scheduler.run_frame();
    }
    let dir = tempdir().unwrap();
    let path = dir.path().join("models").join("ocean.json");
    let saved = workbench.save_model(&path).unwrap();
    assert_eq!(workbench.training_state(), TrainingState::Running);
    workbench.reset_model();
    assert_ne!(workbench.engine().model(), saved.model);
    workbench.start_training();
    let loaded = workbench.load_model(&path).unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(workbench.training_state(), TrainingState::Idle);
    assert_eq!(workbench.engine().model(), saved.model);
    assert_eq!(workbench.engine().epoch(), saved.epoch);
}

#[test]
fn rendered_view_tracks_the_model_and_exports() {
    let (mut workbench, scheduler) = workbench(20);
    let untrained = workbench.render();
    workbench.start_training();
    for _ in 0..20 {
        scheduler.run_frame();
    }
    workbench.pause_training();
    let trained = workbench.render();
    assert_eq!(trained.size, [120, 120]);
    assert_ne!(untrained.pixels, trained.pixels);
    assert_eq!(trained.pixels, workbench.render().pixels);

    let dir = tempdir().unwrap();
    let path = dir.path().join("view.png");
    workbench.export_png(&path).unwrap();
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (120, 120));
}

#[test]
fn overlay_opacity_is_clamped() {
    let (mut workbench, _scheduler) = workbench(21);
    workbench.set_overlay_opacity(2.0);
    assert!((workbench.overlay_opacity() - 0.6).abs() < f32::EPSILON);
    workbench.set_overlay_opacity(-1.0);
    assert_eq!(workbench.overlay_opacity(), 0.0);
}
