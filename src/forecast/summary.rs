use chrono::NaiveDate;

use crate::domain::{mean, DailyUsage, ModelKind};

/// Relative change under which a series counts as steady.
const STEADY_BAND: f64 = 0.01;

/// Everything a summarizer may mention about a finished forecast.
#[derive(Debug, Clone, Copy)]
pub struct SummaryContext<'a> {
    pub region: &'a str,
    pub predicted_usage: f64,
    pub target_date: NaiveDate,
    pub model: ModelKind,
    pub historical: &'a [DailyUsage],
    pub forecast: &'a [DailyUsage],
}

pub trait Summarizer: Send + Sync {
    fn summarize(&self, ctx: &SummaryContext<'_>) -> String;
}

/// Fixed-template sentence; no external calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSummarizer;

impl Summarizer for TemplateSummarizer {
    fn summarize(&self, ctx: &SummaryContext<'_>) -> String {
        let mut text = format!(
            "The {} model predicts {:.2} units of usage for {} on {}.",
            ctx.model,
            ctx.predicted_usage,
            ctx.region,
            ctx.target_date.format("%B %-d, %Y"),
        );

        let history: Vec<f64> = ctx.historical.iter().map(|p| p.usage).collect();
        let average = mean(&history);
        if average > 0.0 {
            let change = (ctx.predicted_usage - average) / average * 100.0;
            let relation = if change >= 0.0 { "above" } else { "below" };
            text.push_str(&format!(
                " That is {:.1}% {} the recent daily average of {:.2}.",
                change.abs(),
                relation,
                average
            ));
        }

        if let Some(direction) = direction(ctx.forecast) {
            text.push_str(&format!(" Usage is expected to be {direction} over the forecast period."));
        }

        text
    }
}

fn direction(forecast: &[DailyUsage]) -> Option<&'static str> {
    let (first, last) = (forecast.first()?, forecast.last()?);
    if forecast.len() < 2 {
        return None;
    }
    let scale = first.usage.abs().max(f64::EPSILON);
    let change = (last.usage - first.usage) / scale;
    Some(if change > STEADY_BAND {
        "rising"
    } else if change < -STEADY_BAND {
        "falling"
    } else {
        "steady"
    })
}
