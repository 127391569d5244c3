//! Request handlers

use std::sync::Arc;

use axum::{extract::State, response::Html, Json};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::WindError;
use crate::features::{parse_timestamp, RawObservation, FeatureVector};
use crate::inference::{features_for_date, ms_to_kms, Predictor};
use crate::training::MetricsRecord;

use super::error::{Result, ServerError};
use super::state::AppState;

/// Altitude range offered by the form (whole km)
pub const MAX_ALTITUDE_KM: u8 = 22;

fn default_altitude() -> u8 {
    10
}

/// Values entered in the interactive form
#[derive(Debug, Clone, Deserialize)]
pub struct FormInput {
    pub uwnd: f64,
    pub vwnd: f64,
    pub lag_1: f64,
    pub lag_2: f64,
    pub lag_3: f64,
    /// Display only; not a model feature
    #[serde(default = "default_altitude")]
    pub altitude: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendPoint {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormPrediction {
    pub altitude_km: u8,
    pub predicted_ms: f64,
    pub predicted_kms: f64,
    pub day_of_year: u32,
    pub month: u32,
    pub features: Vec<f64>,
    /// 3 days ago, 2 days ago, 1 day ago, prediction
    pub trend: Vec<TrendPoint>,
}

impl FormInput {
    fn validate(&self) -> Result<()> {
        for (name, value) in [("uwnd", self.uwnd), ("vwnd", self.vwnd)] {
            if !value.is_finite() {
                return Err(ServerError::BadRequest(format!("{} must be a finite number", name)));
            }
        }
        for (name, value) in [("lag_1", self.lag_1), ("lag_2", self.lag_2), ("lag_3", self.lag_3)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ServerError::BadRequest(format!(
                    "{} must be a non-negative wind speed",
                    name
                )));
            }
        }
        if self.altitude > MAX_ALTITUDE_KM {
            return Err(ServerError::BadRequest(format!(
                "altitude must be between 0 and {} km",
                MAX_ALTITUDE_KM
            )));
        }
        Ok(())
    }

    fn features(&self, date: NaiveDate) -> FeatureVector {
        features_for_date(self.uwnd, self.vwnd, [self.lag_1, self.lag_2, self.lag_3], date)
    }
}

/// Predict from form values with calendar features taken from `date`
pub fn form_prediction(
    predictor: &Predictor,
    input: &FormInput,
    date: NaiveDate,
) -> Result<FormPrediction> {
    input.validate()?;
    let features = input.features(date);
    let predicted_ms = predictor.predict_vector(&features)?;

    let trend = [
        ("3 Days Ago", input.lag_3),
        ("2 Days Ago", input.lag_2),
        ("1 Day Ago", input.lag_1),
        ("Prediction", predicted_ms),
    ]
    .into_iter()
    .map(|(label, value)| TrendPoint { label: label.to_string(), value })
    .collect();

    Ok(FormPrediction {
        altitude_km: input.altitude,
        predicted_ms,
        predicted_kms: ms_to_kms(predicted_ms),
        day_of_year: features[6] as u32,
        month: features[7] as u32,
        features: features.to_vec(),
        trend,
    })
}

pub async fn predict_form(
    State(state): State<Arc<AppState>>,
    Json(input): Json<FormInput>,
) -> Result<Json<FormPrediction>> {
    let predictor = state.predictor()?;
    let today = Local::now().date_naive();
    let prediction = form_prediction(predictor, &input, today)?;
    info!(
        altitude_km = prediction.altitude_km,
        predicted_ms = prediction.predicted_ms,
        "Form prediction"
    );
    Ok(Json(prediction))
}

#[derive(Debug, Deserialize)]
pub struct VectorRequest {
    pub features: Vec<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VectorResponse {
    pub predicted_ms: f64,
    pub predicted_kms: f64,
}

pub async fn predict_vector(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VectorRequest>,
) -> Result<Json<VectorResponse>> {
    let predicted_ms = state.predictor()?.predict_vector(&request.features)?;
    Ok(Json(VectorResponse {
        predicted_ms,
        predicted_kms: ms_to_kms(predicted_ms),
    }))
}

/// One raw row as posted by clients; components may be null
#[derive(Debug, Deserialize)]
pub struct RawRecord {
    pub time: String,
    pub uwnd: Option<f64>,
    pub vwnd: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub records: Vec<RawRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchPrediction {
    pub time: String,
    pub predicted_wind_speed: f64,
    pub predicted_kms: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    pub predictions: Vec<BatchPrediction>,
    /// Leading records without lag history
    pub skipped: usize,
}

fn to_observations(records: &[RawRecord]) -> std::result::Result<Vec<RawObservation>, WindError> {
    records
        .iter()
        .enumerate()
        .map(|(row, r)| {
            let time = parse_timestamp(&r.time).ok_or_else(|| {
                WindError::SchemaError(format!("row {}: cannot parse `time` value {:?}", row, r.time))
            })?;
            let uwnd = r.uwnd.ok_or_else(|| WindError::MissingFieldError {
                field: "uwnd".to_string(),
                row,
            })?;
            let vwnd = r.vwnd.ok_or_else(|| WindError::MissingFieldError {
                field: "vwnd".to_string(),
                row,
            })?;
            Ok(RawObservation::new(time, uwnd, vwnd))
        })
        .collect()
}

pub async fn predict_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>> {
    let predictor = state.predictor()?;
    let observations = to_observations(&request.records)?;
    let predictions = predictor.predict_batch(&observations)?;
    info!(records = observations.len(), predictions = predictions.len(), "Batch prediction");

    let skipped = observations.len() - predictions.len();
    let predictions = predictions
        .into_iter()
        .map(|p| BatchPrediction {
            time: p.time.to_string(),
            predicted_wind_speed: p.predicted_wind_speed,
            predicted_kms: p.kms(),
        })
        .collect();

    Ok(Json(BatchResponse { predictions, skipped }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub available: bool,
    pub text: String,
    pub metrics: Option<MetricsRecord>,
}

pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    let text = state.metrics_text().to_string();
    let metrics = if state.metrics_available() {
        MetricsRecord::from_text(&text).ok()
    } else {
        None
    };
    Json(MetricsResponse {
        available: state.metrics_available(),
        text,
        metrics,
    })
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let uptime = chrono::Utc::now().signed_duration_since(state.started_at);
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model_loaded": state.model_loaded(),
        "model_error": state.model_error(),
        "uptime_secs": uptime.num_seconds(),
    }))
}

pub async fn serve_index() -> Html<&'static str> {
    Html(EMBEDDED_INDEX_HTML)
}

const EMBEDDED_INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Wind Speed Predictor</title>
    <script defer src="https://cdn.jsdelivr.net/npm/alpinejs@3.x.x/dist/cdn.min.js"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>[x-cloak]{display:none!important}</style>
</head>
<body class="bg-gray-900 text-gray-100 min-h-screen" x-data="app()" x-init="loadMetrics()">
    <header class="bg-gray-800 border-b border-gray-700 px-6 py-6 text-center">
        <h1 class="text-2xl font-bold">Wind Speed Prediction (0-22 km Altitude)</h1>
        <p class="text-sm text-gray-400 mt-1">Predict wind speed from the past 3 days, wind components and time features. Outputs in m/s and km/s.</p>
    </header>

    <main class="grid md:grid-cols-2 gap-6 p-6 max-w-6xl mx-auto">
        <section class="bg-gray-800 rounded-lg p-6 space-y-4">
            <h2 class="text-lg font-semibold">Input Parameters</h2>
            <label class="block text-sm">U-Wind Component (m/s)
                <input type="number" step="any" x-model.number="form.uwnd" class="mt-1 w-full bg-gray-700 rounded px-3 py-2">
            </label>
            <label class="block text-sm">V-Wind Component (m/s)
                <input type="number" step="any" x-model.number="form.vwnd" class="mt-1 w-full bg-gray-700 rounded px-3 py-2">
            </label>
            <label class="block text-sm">Wind Speed - 3 Days Ago (m/s)
                <input type="number" step="any" min="0" x-model.number="form.lag_3" class="mt-1 w-full bg-gray-700 rounded px-3 py-2">
            </label>
            <label class="block text-sm">Wind Speed - 2 Days Ago (m/s)
                <input type="number" step="any" min="0" x-model.number="form.lag_2" class="mt-1 w-full bg-gray-700 rounded px-3 py-2">
            </label>
            <label class="block text-sm">Wind Speed - 1 Day Ago (m/s)
                <input type="number" step="any" min="0" x-model.number="form.lag_1" class="mt-1 w-full bg-gray-700 rounded px-3 py-2">
            </label>
            <label class="block text-sm">Altitude Selection (km): <span x-text="form.altitude"></span>
                <input type="range" min="0" max="22" step="1" x-model.number="form.altitude" class="mt-1 w-full">
            </label>
            <button @click="predict()" :disabled="busy" class="w-full bg-blue-600 hover:bg-blue-500 rounded px-4 py-2 font-medium">Predict Wind Speed</button>

            <div x-show="error" x-cloak class="bg-red-900/60 border border-red-700 rounded p-3 text-sm" x-text="error"></div>

            <div x-show="result" x-cloak class="space-y-4">
                <p class="text-green-400">Predicted Wind Speed at <span x-text="result && result.altitude_km"></span> km:</p>
                <div class="grid grid-cols-2 gap-4">
                    <div class="bg-gray-700 rounded p-4">
                        <div class="text-xs text-gray-400">Speed (m/s)</div>
                        <div class="text-2xl font-bold" x-text="result && result.predicted_ms.toFixed(2)"></div>
                    </div>
                    <div class="bg-gray-700 rounded p-4">
                        <div class="text-xs text-gray-400">Speed (km/s)</div>
                        <div class="text-2xl font-bold" x-text="result && result.predicted_kms.toFixed(5)"></div>
                    </div>
                </div>
                <h3 class="font-semibold">Wind Trend (Past + Prediction)</h3>
                <svg viewBox="0 0 400 220" class="w-full bg-gray-700 rounded">
                    <polyline :points="chartPoints()" fill="none" stroke="#3b82f6" stroke-width="2"></polyline>
                    <template x-for="(p, i) in chart()" :key="i">
                        <g>
                            <circle :cx="p.x" :cy="p.y" r="4" fill="#3b82f6"></circle>
                            <text :x="p.x" :y="p.y - 10" text-anchor="middle" font-size="11" fill="#e5e7eb" x-text="p.value.toFixed(2)"></text>
                            <text :x="p.x" y="212" text-anchor="middle" font-size="10" fill="#9ca3af" x-text="p.label"></text>
                        </g>
                    </template>
                </svg>
            </div>
        </section>

        <section class="bg-gray-800 rounded-lg p-6 space-y-4">
            <h2 class="text-lg font-semibold">Model Accuracy</h2>
            <pre class="bg-gray-900 rounded p-4 text-sm" x-text="metrics"></pre>
            <h3 class="font-semibold">How it Works</h3>
            <ul class="list-disc list-inside text-sm text-gray-300 space-y-1">
                <li>Uses wind components and the past 3 days of wind speed values</li>
                <li>Derives day of year and month from today's date</li>
                <li>Reports the prediction at the selected altitude (0-22 km)</li>
                <li>Model: gradient boosted regression trees</li>
            </ul>
        </section>
    </main>

    <footer class="text-center text-xs text-gray-500 pb-6">Altitude Range: 0-22 km</footer>

    <script>
    function app() {
        return {
            form: { uwnd: 4.0, vwnd: 3.5, lag_3: 6.0, lag_2: 7.2, lag_1: 8.5, altitude: 10 },
            result: null,
            error: '',
            busy: false,
            metrics: 'Metrics not available',
            async loadMetrics() {
                try {
                    const res = await fetch('/api/metrics');
                    const body = await res.json();
                    this.metrics = body.text;
                } catch (e) {}
            },
            async predict() {
                this.busy = true;
                this.error = '';
                this.result = null;
                try {
                    const res = await fetch('/api/predict', {
                        method: 'POST',
                        headers: { 'Content-Type': 'application/json' },
                        body: JSON.stringify(this.form),
                    });
                    const body = await res.json();
                    if (!res.ok) { this.error = body.message || 'Prediction failed'; return; }
                    this.result = body;
                } catch (e) {
                    this.error = 'Request failed: ' + e;
                } finally {
                    this.busy = false;
                }
            },
            chart() {
                if (!this.result) return [];
                const pts = this.result.trend;
                const max = Math.max(...pts.map(p => p.value), 1);
                return pts.map((p, i) => ({
                    label: p.label,
                    value: p.value,
                    x: 50 + i * 100,
                    y: 190 - (p.value / max) * 160,
                }));
            },
            chartPoints() {
                return this.chart().map(p => p.x + ',' + p.y).join(' ');
            },
        };
    }
    </script>
</body>
</html>
"##;
