use serde::Serialize;
use std::path::PathBuf;

use crate::domain::ModelKind;

/// Short keys used in artefact file names for regions with long display names.
const REGION_KEYS: &[(&str, &str)] = &[
    ("Dadra & Nagar Haveli (DNH)", "DNH"),
    ("Himachal Pradesh (HP)", "HP"),
    ("Jammu & Kashmir (J&K)", "J&K"),
    ("Madhya Pradesh (MP)", "MP"),
    ("Puducherry (Pondy)", "Pondy"),
    ("Uttar Pradesh (UP)", "UP"),
];

pub fn region_model_key(region: &str) -> &str {
    let region = region.trim();
    REGION_KEYS
        .iter()
        .find(|(name, _)| *name == region)
        .map(|(_, key)| *key)
        .unwrap_or(region)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelAvailability {
    pub model: ModelKind,
    pub artefact: String,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionModels {
    pub region: String,
    pub model_key: String,
    pub models: Vec<ModelAvailability>,
}

impl RegionModels {
    pub fn available(&self) -> Vec<ModelKind> {
        self.models
            .iter()
            .filter(|m| m.available)
            .map(|m| m.model)
            .collect()
    }
}

/// Trained model artefacts on disk, one file per (region, model).
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models_dir: PathBuf,
}

impl ModelCatalog {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    /// `<key>_lstm_model.h5` for LSTM, `<key>_<model>_model.joblib` otherwise.
    pub fn model_path(&self, region: &str, model: ModelKind) -> PathBuf {
        let key = region_model_key(region);
        let file = match model {
            ModelKind::Lstm => format!("{key}_lstm_model.h5"),
            other => format!("{key}_{}_model.joblib", other.to_string().to_lowercase()),
        };
        self.models_dir.join(file)
    }

    pub fn region_models(&self, region: &str) -> RegionModels {
        let models = ModelKind::all()
            .into_iter()
            .map(|model| {
                let path = self.model_path(region, model);
                ModelAvailability {
                    model,
                    artefact: path
                        .file_name()
                        .map(|f| f.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    available: path.is_file(),
                }
            })
            .collect();

        RegionModels {
            region: region.trim().to_string(),
            model_key: region_model_key(region).to_string(),
            models,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("Uttar Pradesh (UP)", "UP")]
    #[case("Jammu & Kashmir (J&K)", "J&K")]
    #[case(" Puducherry (Pondy) ", "Pondy")]
    #[case("Maharashtra", "Maharashtra")]
    fn test_region_model_key(#[case] region: &str, #[case] key: &str) {
        assert_eq!(region_model_key(region), key);
    }

    #[test]
    fn test_model_paths() {
        let catalog = ModelCatalog::new("models");
        assert_eq!(
            catalog.model_path("Himachal Pradesh (HP)", ModelKind::Lstm),
            PathBuf::from("models/HP_lstm_model.h5")
        );
        assert_eq!(
            catalog.model_path("Delhi", ModelKind::XgBoost),
            PathBuf::from("models/Delhi_xgboost_model.joblib")
        );
    }

    #[test]
    fn test_region_models_reports_present_artefacts() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("MP_arima_model.joblib"), b"").unwrap();
        std::fs::write(dir.path().join("MP_lstm_model.h5"), b"").unwrap();

        let catalog = ModelCatalog::new(dir.path());
        let models = catalog.region_models("Madhya Pradesh (MP)");

        assert_eq!(models.model_key, "MP");
        assert_eq!(models.models.len(), 4);
        assert_eq!(models.available(), vec![ModelKind::Arima, ModelKind::Lstm]);
    }
}
