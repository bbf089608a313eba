//! Search, evaluation and result caching for warden.

pub mod analysis;
pub mod config;
pub mod error;
pub mod eval;
pub mod search;
pub mod time;

pub use analysis::{AnalysisResult, Bound, INF, MATE_SCORE, MATE_THRESHOLD};
pub use config::SearchConfig;
pub use error::EngineError;
pub use eval::{Evaluator, MaterialEvaluator, PstEvaluator};
pub use search::control::StopHandle;
pub use search::job::{Finished, SearchJob};
pub use search::report::{NullReporter, Progress, Reporter, TracingReporter};
pub use search::tree::Variation;
pub use search::tt::CacheStats;
pub use search::{SearchLimits, SearchResult, Searcher};
pub use time::{Clock, limits_from_clock};
