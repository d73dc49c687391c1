//! Pages processed concurrently with one engine stay independent

mod common;

use common::{InkPatchReader, Sheet, exam_template};
use omr_engine::{Answer, Engine, EngineConfig, ScanOutcome};

#[test]
fn test_concurrent_pages_do_not_mix() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::with_reader(
        EngineConfig {
            analyzed_image_dir: Some(dir.path().to_path_buf()),
            ..EngineConfig::default()
        },
        InkPatchReader,
    );
    let template = exam_template();

    std::thread::scope(|s| {
        let first = s.spawn(|| {
            (0..8)
                .map(|_| {
                    let mut scan = Sheet::blank().mark(10, 10).mark(10, 40).into_scan(&["first"]);
                    engine.apply_template(&template, &mut scan).unwrap()
                })
                .collect::<Vec<_>>()
        });
        let second = s.spawn(|| {
            (0..8)
                .map(|_| {
                    let mut scan = Sheet::blank().mark(30, 10).mark(10, 70).into_scan(&["second"]);
                    engine.apply_template(&template, &mut scan).unwrap()
                })
                .collect::<Vec<_>>()
        });

        for output in first.join().unwrap() {
            assert_eq!(output.outcome, ScanOutcome::Success);
            assert_eq!(output.parameters, vec!["first"]);
            let ids: Vec<&str> = output.answers().map(Answer::id).collect();
            assert_eq!(ids, vec!["q1a", "r1a"]);
            assert!(output.row_group("r1").is_some());
            assert!(output.row_group("r2").is_none());
        }
        for output in second.join().unwrap() {
            assert_eq!(output.outcome, ScanOutcome::Success);
            assert_eq!(output.parameters, vec!["second"]);
            let ids: Vec<&str> = output.answers().map(Answer::id).collect();
            assert_eq!(ids, vec!["q1b", "r2a"]);
            assert!(output.row_group("r1").is_none());
        }
    });
}
