pub mod case;
pub mod evaluation;
pub mod loaders;
pub mod payload;
pub mod score;

pub use case::{ConsoleEntry, ManualEvaluationEntry, ManualEvaluationField, RawCase};
pub use evaluation::{
    AutomatedChecks, CanonicalEvaluation, DimensionScore, LlmDimension, LlmEvaluation,
    ManualEvaluation, ParsedEvaluation,
};
pub use loaders::load_case_file;
pub use payload::{ExportPayload, PreviewImages, SubmitAck};
pub use score::ScoreValue;
