use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use futures::future::BoxFuture;
use serde_json::json;
use sivpilot_export::capture::canvas::{is_png_data_url, Canvas};
use sivpilot_export::capture::{
    CaptureSource, Clock, FrameProbe, PlaceholderReason, PreviewSurface, RasterRequest,
    SurfaceLayout, SurfaceRect,
};
use sivpilot_export::error::{AppError, ExportError};
use sivpilot_export::models::{ExportPayload, RawCase, SubmitAck};
use sivpilot_export::services::Submitter;
use sivpilot_export::{Config, ExportFlow};

// ========== 测试替身 ==========

#[derive(Clone, Default)]
struct RecordingClock {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl Clock for RecordingClock {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        self.sleeps.lock().unwrap().push(duration);
        Box::pin(async {})
    }
}

enum Reply {
    Ack(serde_json::Value),
    TransportError,
}

struct RecordingSubmitter {
    reply: Reply,
    payloads: Mutex<Vec<ExportPayload>>,
}

impl RecordingSubmitter {
    fn new(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            payloads: Mutex::new(Vec::new()),
        })
    }

    fn accepting() -> Arc<Self> {
        Self::new(Reply::Ack(json!({"success": true, "path": "exports/1.json"})))
    }

    fn submitted(&self) -> Vec<ExportPayload> {
        self.payloads.lock().unwrap().clone()
    }
}

impl Submitter for RecordingSubmitter {
    fn submit<'a>(&'a self, payload: &'a ExportPayload) -> BoxFuture<'a, Result<SubmitAck>> {
        self.payloads.lock().unwrap().push(payload.clone());
        Box::pin(async move {
            match &self.reply {
                Reply::Ack(value) => Ok(serde_json::from_value(value.clone())?),
                Reply::TransportError => anyhow::bail!("connection refused"),
            }
        })
    }
}

/// 普通元素预览（没有子文档）
struct ElementPreview {
    label: &'static str,
    raster_fails: bool,
}

impl ElementPreview {
    fn ok(label: &'static str) -> Self {
        Self { label, raster_fails: false }
    }

    fn broken(label: &'static str) -> Self {
        Self { label, raster_fails: true }
    }
}

impl PreviewSurface for ElementPreview {
    fn label(&self) -> &str {
        self.label
    }

    fn layout(&self) -> BoxFuture<'_, Result<SurfaceLayout>> {
        Box::pin(async {
            Ok(SurfaceLayout {
                is_frame_host: false,
                bounds: SurfaceRect { x: 0.0, y: 0.0, width: 6.0, height: 4.0 },
                client_left: 0.0,
                client_top: 0.0,
                client_width: 6.0,
                client_height: 4.0,
                scroll_width: 6.0,
                scroll_height: 4.0,
            })
        })
    }

    fn probe_frame(&self) -> BoxFuture<'_, Result<FrameProbe>> {
        Box::pin(async { Ok(FrameProbe::NoFrame) })
    }

    fn frame_document_accessible(&self) -> BoxFuture<'_, Result<bool>> {
        Box::pin(async { Ok(false) })
    }

    fn rasterize(&self, _request: RasterRequest) -> BoxFuture<'_, Result<Vec<u8>>> {
        let fails = self.raster_fails;
        Box::pin(async move {
            if fails {
                anyhow::bail!("rasterizer threw");
            }
            Ok(Canvas::filled(6, 4, [40, 80, 120, 255]).encode_png()?)
        })
    }

    fn read_frame_canvas(&self) -> BoxFuture<'_, Result<Option<Vec<u8>>>> {
        Box::pin(async { Ok(None) })
    }
}

fn flow(config: &Config, submitter: Arc<RecordingSubmitter>) -> (ExportFlow<RecordingClock>, RecordingClock) {
    let clock = RecordingClock::default();
    (ExportFlow::with_clock(config, clock.clone(), submitter), clock)
}

fn case(value: serde_json::Value) -> RawCase {
    serde_json::from_value(value).unwrap()
}

// ========== 测试 ==========

#[tokio::test]
async fn test_manual_evaluation_drives_overall_score() {
    let submitter = RecordingSubmitter::accepting();
    let (flow, clock) = flow(&Config::default(), submitter.clone());
    let case = case(json!({
        "evalId": 42,
        "prompt": "Render a cone",
        "generator": "gen-model",
        "evaluator": "judge-model",
        "manualEvaluation": {
            "functionality": 0.9,
            "visualQuality": 0.8,
            "codeQuality": 0.7,
            "correctionCost": 2
        }
    }));

    let generated = ElementPreview::ok("generated");
    let truth = ElementPreview::ok("truth");
    let report = flow.run(&case, Some(&generated), Some(&truth)).await.unwrap();

    assert_eq!(report.overall_score, 80.0);
    assert_eq!(report.generated.source, CaptureSource::Strategy("element"));

    let payloads = submitter.submitted();
    assert_eq!(payloads.len(), 1);
    let value = serde_json::to_value(&payloads[0]).unwrap();
    assert_eq!(value["evalId"], json!("42"));
    assert_eq!(value["evaluation_id"], json!("42"));
    assert_eq!(value["manual_evaluation"]["total_score"], json!(80));
    assert_eq!(value["overall_score"], json!(80.0));
    assert_eq!(value["llm_evaluation"], serde_json::Value::Null);
    assert_eq!(value["generator_model"], json!("gen-model"));
    assert!(is_png_data_url(value["generatedImage"].as_str().unwrap()));
    assert!(is_png_data_url(value["truthImage"].as_str().unwrap()));

    // 整体等待在前，之后每个预览各一次短暂等待
    let sleeps = clock.sleeps.lock().unwrap().clone();
    assert_eq!(sleeps[0], Duration::from_millis(1000));
    assert_eq!(&sleeps[1..], &[Duration::from_millis(100), Duration::from_millis(100)]);
}

#[tokio::test]
async fn test_judge_text_without_overall_uses_dimension_mean() {
    let submitter = RecordingSubmitter::accepting();
    let (flow, _) = flow(&Config::default(), submitter.clone());
    let case = case(json!({
        "evalId": "7",
        "evaluatorEvaluation": "<Evaluation>\
            <Dimension name=\"visualQuality\"><Score>0.8</Score><Reason>clear</Reason></Dimension>\
            <Dimension name=\"codeQuality\"><Score>0.6</Score></Dimension>\
            <Critique>ok</Critique>\
        </Evaluation>",
        "consoleOutput": [
            {"type": "log", "message": "start"},
            {"type": "error", "message": "boom"},
            {"type": "error", "message": "again"}
        ],
        "automatedExecutable": true
    }));

    let generated = ElementPreview::ok("generated");
    let truth = ElementPreview::ok("truth");
    flow.run(&case, Some(&generated), Some(&truth)).await.unwrap();

    let value = serde_json::to_value(&submitter.submitted()[0]).unwrap();
    assert_eq!(value["llm_evaluation"]["overall_score"], json!(70.0));
    assert_eq!(value["llm_evaluation"]["dimensions"]["visual_quality"]["score"], json!(80.0));
    assert_eq!(value["llm_evaluation"]["dimensions"]["code_quality"]["score"], json!(60.0));
    assert_eq!(value["llm_evaluation"]["critique"], json!("ok"));
    assert_eq!(value["overall_score"], json!(70.0));
    assert_eq!(value["automated_checks"]["executable"], json!(true));
    assert_eq!(value["automated_checks"]["has_output"], serde_json::Value::Null);
    assert_eq!(value["automated_checks"]["error_count"], json!(2));
    assert_eq!(value["console_output"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_missing_preview_fails_before_anything_runs() {
    let submitter = RecordingSubmitter::accepting();
    let (flow, clock) = flow(&Config::default(), submitter.clone());
    let generated = ElementPreview::ok("generated");

    let err = flow.run(&RawCase::default(), Some(&generated), None).await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Export(ExportError::MissingPreview { which: "truth" })
    ));
    assert!(submitter.submitted().is_empty());
    assert!(clock.sleeps.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rejected_submission_is_export_failure() {
    let submitter = RecordingSubmitter::new(Reply::Ack(json!({"success": false, "message": "disk full"})));
    let (flow, _) = flow(&Config::default(), submitter.clone());
    let generated = ElementPreview::ok("generated");
    let truth = ElementPreview::ok("truth");

    let err = flow.run(&RawCase::default(), Some(&generated), Some(&truth)).await.unwrap_err();

    match err {
        AppError::Export(ExportError::Rejected { message }) => assert_eq!(message, "disk full"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(submitter.submitted().len(), 1);
}

#[tokio::test]
async fn test_transport_error_is_submission_failure() {
    let submitter = RecordingSubmitter::new(Reply::TransportError);
    let (flow, _) = flow(&Config::default(), submitter.clone());
    let generated = ElementPreview::ok("generated");
    let truth = ElementPreview::ok("truth");

    let err = flow.run(&RawCase::default(), Some(&generated), Some(&truth)).await.unwrap_err();

    assert!(matches!(err, AppError::Export(ExportError::SubmissionFailed { .. })));
}

#[tokio::test]
async fn test_one_failed_capture_does_not_block_the_other() {
    let submitter = RecordingSubmitter::accepting();
    let (flow, _) = flow(&Config::default(), submitter.clone());
    let generated = ElementPreview::broken("generated");
    let truth = ElementPreview::ok("truth");

    let report = flow.run(&RawCase::default(), Some(&generated), Some(&truth)).await.unwrap();

    assert_eq!(
        report.generated.source,
        CaptureSource::Placeholder(PlaceholderReason::CaptureFailed)
    );
    assert!(report.generated.embedded);
    assert_eq!(report.truth.source, CaptureSource::Strategy("element"));

    let payload = &submitter.submitted()[0];
    assert!(is_png_data_url(payload.generated_image.as_deref().unwrap()));
    assert!(is_png_data_url(payload.truth_image.as_deref().unwrap()));
}

#[tokio::test]
async fn test_placeholder_can_be_replaced_by_null() {
    let submitter = RecordingSubmitter::accepting();
    let config = Config {
        embed_placeholder_on_failure: false,
        ..Config::default()
    };
    let (flow, _) = flow(&config, submitter.clone());
    let generated = ElementPreview::broken("generated");
    let truth = ElementPreview::ok("truth");

    let report = flow.run(&RawCase::default(), Some(&generated), Some(&truth)).await.unwrap();
    assert!(!report.generated.embedded);

    let value = serde_json::to_value(&submitter.submitted()[0]).unwrap();
    assert_eq!(value["generatedImage"], serde_json::Value::Null);
    assert!(value["truthImage"].is_string());
    assert_eq!(value["overall_score"], json!(0.0));
}

#[tokio::test]
async fn test_last_manual_revision_wins_over_llm() {
    let submitter = RecordingSubmitter::accepting();
    let (flow, _) = flow(&Config::default(), submitter.clone());
    let case = case(json!({
        "evaluatorEvaluation": "<Evaluation><OverallScore>0.95</OverallScore></Evaluation>",
        "manualEvaluation": [
            {"functionality": 0.1, "visualQuality": 0.1, "codeQuality": 0.1},
            {"functionality": 0.5, "visualQuality": 0.5, "codeQuality": 0.5},
            {"functionality": 0.6, "visualQuality": 0.6, "codeQuality": 0.6, "correctionCost": 1}
        ]
    }));
    let generated = ElementPreview::ok("generated");
    let truth = ElementPreview::ok("truth");

    let report = flow.run(&case, Some(&generated), Some(&truth)).await.unwrap();

    assert_eq!(report.overall_score, 60.0);
    let value = serde_json::to_value(&submitter.submitted()[0]).unwrap();
    assert_eq!(value["llm_evaluation"]["overall_score"], json!(95.0));
    assert_eq!(value["manual_evaluation"]["functionality"], json!(60.0));
    assert_eq!(value["manual_evaluation"]["total_score"], json!(60));
}
