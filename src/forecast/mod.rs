pub mod catalog;
pub mod engine;
pub mod external;
pub mod features;
pub mod noise;
pub mod selection;
pub mod statistical;
pub mod summary;

pub use catalog::{ModelCatalog, RegionModels};
pub use engine::{AttemptFailure, ForecastEngine, PredictorError, UsagePredictor};
pub use external::ExternalPredictor;
pub use noise::{noise_from_config, NoiseSource};
pub use selection::resolve_model;
pub use statistical::StatisticalForecaster;
pub use summary::{Summarizer, SummaryContext, TemplateSummarizer};
