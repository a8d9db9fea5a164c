#![allow(dead_code)]
//! Shared fixtures: a generated usage file, shell-script predictors and a
//! server bound to an ephemeral port.

use chrono::{Duration, Local, NaiveDate};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use demand_forecaster::api;
use demand_forecaster::clock::FixedClock;
use demand_forecaster::config::{Config, JitterMode};
use demand_forecaster::controller::AppState;
use demand_forecaster::repo::{HistoricalStore, Repositories};

pub const HISTORY_DAYS: i64 = 120;

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Two subregions for Maharashtra, one for Delhi, one row each per day.
pub fn usage_csv() -> String {
    let mut out = String::from("States,Regions,latitude,longitude,Dates,Usage\n");
    for i in 1..=HISTORY_DAYS {
        let date = (today() - Duration::days(i)).format("%m/%d/%Y 00:00:00");
        let wobble = (i % 7) as f64;
        writeln!(out, "Maharashtra,WR,19.25,73.16,{date},{:.1}", 150.0 + wobble).unwrap();
        writeln!(out, "Maharashtra,WR,19.30,73.20,{date},{:.1}", 120.0 - wobble).unwrap();
        writeln!(out, "Delhi,NR,28.70,77.10,{date},{:.1}", 95.0 + wobble).unwrap();
    }
    out
}

pub struct Fixture {
    pub dir: TempDir,
    pub cfg: Config,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("usage.csv");
        std::fs::write(&csv_path, usage_csv()).unwrap();

        let mut cfg = Config::default();
        cfg.data.csv_path = csv_path;
        cfg.predictor.interpreter = "sh".to_string();
        cfg.predictor.scripts = vec![];
        cfg.predictor.timeout_secs = 2;
        cfg.predictor.models_dir = dir.path().join("models");
        cfg.forecast.jitter = JitterMode::Off;

        Self { dir, cfg }
    }

    /// Write a predictor script and append it to the candidate list.
    pub fn add_script(&mut self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        self.cfg.predictor.scripts.push(path.clone());
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Start the router on 127.0.0.1 and return its base URL.
    pub async fn serve(&self) -> String {
        let store = Arc::new(HistoricalStore::new(self.cfg.data.csv_path.clone()));
        store.load_once();
        let repos = Arc::new(Repositories::with_store(store));
        let state = AppState::with_parts(self.cfg.clone(), repos, Arc::new(FixedClock(today())));
        let app = api::router(state, &self.cfg);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

pub fn predict_body(region: &str, days_ahead: i64, model: &str) -> serde_json::Value {
    serde_json::json!({
        "state": region,
        "lat": 20.5937,
        "lon": 78.9629,
        "predictionDate": (today() + Duration::days(days_ahead)).format("%Y-%m-%d").to_string(),
        "model": model,
    })
}
