//! End-to-end page processing against a mock OCR backend.
//!
//! Covers the output layout, stage toggles, orientation gating and failure
//! isolation of `PageProcessor`.

mod helpers;

use helpers::{MockBackend, Orientation, SAMPLE_TEXT, SAMPLE_WORDS, config_in, sample_tokens, write_scan};
use image::DynamicImage;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tempfile::tempdir;
use vellum::types::{OcrToken, OrientationDecision, PageOutcome};
use vellum::{PageProcessor, PipelineConfig};

fn processor(config: PipelineConfig, backend: MockBackend) -> (PageProcessor, Arc<MockBackend>) {
    let backend = Arc::new(backend);
    (PageProcessor::new(config, backend.clone()), backend)
}

#[tokio::test]
async fn test_page_writes_all_outputs() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    write_scan(&config.source_root, "box1/0001.png", 60, 40);
    let (processor, backend) = processor(config.clone(), MockBackend::new(sample_tokens()));

    let outcome = processor.process("box1/0001.png").await;
    let PageOutcome::Success(report) = outcome else {
        panic!("expected success, got {:?}", outcome);
    };

    let out = config.output_root.join("box1");
    assert_eq!(report.page, "box1/0001.png");
    assert_eq!(report.outputs.count(), 4);
    assert_eq!(report.outputs.image.as_deref(), Some(out.join("0001.png").as_path()));
    assert_eq!(report.token_count, Some(sample_tokens().len()));
    assert_eq!(report.keyword_count, Some(4));
    assert_eq!(report.truncated_at, None);
    assert_eq!(
        report.orientation,
        Some(OrientationDecision::Upright { confidence: 10.0 })
    );

    let data = fs::read_to_string(out.join("0001.data.json")).unwrap();
    let tokens: Vec<OcrToken> = serde_json::from_str(&data).unwrap();
    assert_eq!(tokens, sample_tokens());

    assert_eq!(fs::read_to_string(out.join("0001.texts.txt")).unwrap(), SAMPLE_TEXT);
    assert_eq!(fs::read_to_string(out.join("0001.words.txt")).unwrap(), SAMPLE_WORDS);

    let archived = image::open(out.join("0001.png")).unwrap();
    assert!(matches!(archived, DynamicImage::ImageRgb8(_)), "human rendition keeps color");

    assert_eq!(backend.detect_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.extract_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.languages.lock().unwrap().as_slice(), ["eng"]);
    assert_eq!(
        backend.extracted_images.lock().unwrap().as_slice(),
        [out.join("0001.png")]
    );
}

#[tokio::test]
async fn test_missing_source_writes_nothing() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    let (processor, backend) = processor(config.clone(), MockBackend::new(sample_tokens()));

    let outcome = processor.process("box1/missing.png").await;
    match outcome {
        PageOutcome::SourceNotFound { page, path } => {
            assert_eq!(page, "box1/missing.png");
            assert_eq!(path, config.source_root.join("box1").join("missing.png"));
        }
        other => panic!("expected source_not_found, got {:?}", other),
    }
    assert!(!config.output_root.exists());
    assert_eq!(backend.detect_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_extraction_failure_is_isolated() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    write_scan(&config.source_root, "p.png", 30, 20);
    let (processor, _) = processor(config.clone(), MockBackend::new(sample_tokens()).failing_extraction());

    let outcome = processor.process("p.png").await;
    match outcome {
        PageOutcome::Failed { page, kind, reason } => {
            assert_eq!(page, "p.png");
            assert_eq!(kind, "extraction");
            assert!(reason.contains("timed out"), "{reason}");
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(!config.output_root.join("p.data.json").exists());
}

#[tokio::test]
async fn test_unreadable_source_is_enhancement_failure() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    fs::create_dir_all(&config.source_root).unwrap();
    fs::write(config.source_root.join("broken.jpg"), b"not an image").unwrap();
    let (processor, _) = processor(config, MockBackend::new(sample_tokens()));

    let outcome = processor.process("broken.jpg").await;
    assert!(matches!(outcome, PageOutcome::Failed { ref kind, .. } if kind == "enhancement"));
}

#[tokio::test]
async fn test_invalid_page_path_fails_validation() {
    let dir = tempdir().unwrap();
    let (processor, _) = processor(config_in(dir.path()), MockBackend::new(sample_tokens()));

    let outcome = processor.process("../outside.png").await;
    assert!(matches!(outcome, PageOutcome::Failed { ref kind, .. } if kind == "validation"));
}

#[tokio::test]
async fn test_disabling_data_skips_text_and_keywords() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.stages.data = false;
    write_scan(&config.source_root, "p.png", 30, 20);
    let (processor, backend) = processor(config.clone(), MockBackend::new(sample_tokens()));

    let PageOutcome::Success(report) = processor.process("p.png").await else {
        panic!("expected success");
    };

    assert_eq!(report.outputs.count(), 1);
    assert!(config.output_root.join("p.png").is_file());
    assert!(!config.output_root.join("p.data.json").exists());
    assert!(!config.output_root.join("p.texts.txt").exists());
    assert!(!config.output_root.join("p.words.txt").exists());
    assert_eq!(backend.extract_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_individual_stage_toggles() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.stages.text = false;
    config.stages.rotate = false;
    write_scan(&config.source_root, "p.png", 30, 20);
    let (processor, backend) = processor(config.clone(), MockBackend::new(sample_tokens()));

    let PageOutcome::Success(report) = processor.process("p.png").await else {
        panic!("expected success");
    };

    assert!(report.orientation.is_none());
    assert!(report.outputs.text.is_none());
    assert!(report.outputs.keywords.is_some());
    assert_eq!(backend.detect_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_machine_rendition_archived_without_human_output() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.stages.human_readable = false;
    write_scan(&config.source_root, "p.png", 30, 20);
    let (processor, _) = processor(config.clone(), MockBackend::new(sample_tokens()));

    assert!(processor.process("p.png").await.is_success());
    let archived = image::open(config.output_root.join("p.png")).unwrap();
    assert!(matches!(archived, DynamicImage::ImageLuma8(_)));
}

async fn archived_dimensions(orientation: Orientation) -> ((u32, u32), Option<OrientationDecision>) {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    write_scan(&config.source_root, "p.png", 60, 40);
    let (processor, _) = processor(config.clone(), MockBackend::new(sample_tokens()).with_orientation(orientation));

    let PageOutcome::Success(report) = processor.process("p.png").await else {
        panic!("expected success");
    };
    let archived = image::open(config.output_root.join("p.png")).unwrap();
    ((archived.width(), archived.height()), report.orientation)
}

#[tokio::test]
async fn test_orientation_gate_is_strict() {
    let (size, decision) = archived_dimensions(Orientation::Estimate {
        degrees: 90,
        confidence: 0.75,
    })
    .await;
    assert_eq!(size, (60, 40));
    assert!(matches!(decision, Some(OrientationDecision::BelowThreshold { .. })));

    let (size, decision) = archived_dimensions(Orientation::Estimate {
        degrees: 90,
        confidence: 0.751,
    })
    .await;
    assert_eq!(size, (40, 60));
    assert!(decision.unwrap().rotated());
}

#[tokio::test]
async fn test_half_turn_keeps_dimensions() {
    let (size, decision) = archived_dimensions(Orientation::Estimate {
        degrees: 180,
        confidence: 3.2,
    })
    .await;
    assert_eq!(size, (60, 40));
    assert_eq!(
        decision,
        Some(OrientationDecision::Rotated {
            degrees: 180,
            confidence: 3.2
        })
    );
}

#[tokio::test]
async fn test_detection_failure_matches_unrotated_output() {
    let failed_dir = tempdir().unwrap();
    let failed_config = config_in(failed_dir.path());
    write_scan(&failed_config.source_root, "p.png", 48, 32);
    let (failing, _) = processor(
        failed_config.clone(),
        MockBackend::new(sample_tokens()).with_orientation(Orientation::Fail),
    );
    let PageOutcome::Success(report) = failing.process("p.png").await else {
        panic!("detection failure must not fail the page");
    };
    assert!(matches!(
        report.orientation,
        Some(OrientationDecision::DetectionFailed { .. })
    ));

    let plain_dir = tempdir().unwrap();
    let mut plain_config = config_in(plain_dir.path());
    plain_config.stages.rotate = false;
    write_scan(&plain_config.source_root, "p.png", 48, 32);
    let (plain, _) = processor(plain_config.clone(), MockBackend::new(sample_tokens()));
    assert!(plain.process("p.png").await.is_success());

    assert_eq!(
        fs::read(failed_config.output_root.join("p.png")).unwrap(),
        fs::read(plain_config.output_root.join("p.png")).unwrap()
    );
}

#[tokio::test]
async fn test_truncated_stream_still_succeeds() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    write_scan(&config.source_root, "p.png", 30, 20);
    let tokens = vec![
        OcrToken::word("Primera", 0, 0, 0),
        OcrToken::word("Salto", 3, 0, 0),
        OcrToken::word("Perdida", 0, 0, 0),
    ];
    let (processor, _) = processor(config.clone(), MockBackend::new(tokens));

    let PageOutcome::Success(report) = processor.process("p.png").await else {
        panic!("expected success");
    };
    assert_eq!(report.truncated_at, Some(1));
    assert_eq!(fs::read_to_string(config.output_root.join("p.texts.txt")).unwrap(), "Primera");
    assert_eq!(
        fs::read_to_string(config.output_root.join("p.words.txt")).unwrap(),
        "perdida\nprimera\nsalto\n"
    );
}

#[tokio::test]
async fn test_user_words_and_language_passed_to_backend() {
    let dir = tempdir().unwrap();
    let mut config = config_in(dir.path());
    let words = dir.path().join("archive.user-words");
    fs::write(&words, "Expediente\nLegajo\n").unwrap();
    config.ocr.language = "spa".to_string();
    config.ocr.user_words = Some(words);
    write_scan(&config.source_root, "p.png", 30, 20);
    let (processor, backend) = processor(config, MockBackend::new(sample_tokens()));

    assert!(processor.process("p.png").await.is_success());
    assert_eq!(backend.languages.lock().unwrap().as_slice(), ["spa"]);
}

#[test]
fn test_process_page_sync() {
    let dir = tempdir().unwrap();
    let config = config_in(dir.path());
    write_scan(&config.source_root, "p.png", 30, 20);
    let (processor, _) = processor(config, MockBackend::new(sample_tokens()));

    assert!(vellum::process_page_sync(&processor, "p.png").is_success());
}
