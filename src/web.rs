//! HTTP surface: the single page and the analyze endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Multipart, State},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::{gemini, intake};

pub struct AppState {
    pub config: Config,
    pub http: reqwest::Client,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
    pub model: String,
    pub processing_time_ms: u128,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze_upload))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn analyze_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let start = Instant::now();

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Unexpected(e.to_string()))?
    {
        if field.name() == Some("image") {
            let file_name = field.file_name().map(str::to_owned);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Unexpected(e.to_string()))?;
            upload = Some((file_name, bytes));
            break;
        }
    }

    let (file_name, bytes) = upload.ok_or(AppError::MissingFile)?;
    let payload = intake::validate_and_package(file_name.as_deref(), bytes.to_vec())?;
    info!(
        mime = payload.mime,
        width = payload.width,
        height = payload.height,
        size = payload.bytes.len(),
        "accepted upload"
    );

    let analysis = gemini::analyze(&state.http, &state.config, &payload)
        .await
        .map_err(|err| {
            warn!(%err, "model call failed");
            err
        })?;

    Ok(Json(AnalyzeResponse {
        analysis,
        model: state.config.model.clone(),
        processing_time_ms: start.elapsed().as_millis(),
    }))
}

async fn index() -> Html<&'static str> {
    Html(PAGE)
}

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>AI Nutritionist App</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: 'Segoe UI', system-ui, -apple-system, sans-serif;
            background: #f4f7f3;
            min-height: 100vh;
            display: flex;
            justify-content: center;
            padding: 40px 20px;
        }

        .card {
            background: white;
            border: 1px solid #dde5da;
            border-radius: 12px;
            max-width: 720px;
            width: 100%;
            padding: 32px;
            height: fit-content;
        }

        h1 { color: #2f4a2c; font-size: 1.8em; margin-bottom: 6px; }

        .subheader { color: #6b7c68; margin-bottom: 24px; }

        .picker {
            border: 2px dashed #9db897;
            border-radius: 8px;
            padding: 28px;
            text-align: center;
            cursor: pointer;
            color: #4d6349;
            background: #fafcf9;
        }

        .picker:hover { background: #eef4ec; }

        input[type="file"] { display: none; }

        .banner {
            border-radius: 8px;
            padding: 12px 16px;
            margin-top: 16px;
            display: none;
        }

        .banner.warning { background: #fff7e0; border: 1px solid #e8d89a; color: #7a6615; }
        .banner.error   { background: #fdecec; border: 1px solid #eebbbb; color: #a33030; }
        .banner.success { background: #eaf6e8; border: 1px solid #b5d8af; color: #2f5c29; }

        .preview {
            max-width: 100%;
            border-radius: 8px;
            margin-top: 20px;
            display: none;
        }

        button {
            margin-top: 20px;
            width: 100%;
            padding: 14px;
            border: none;
            border-radius: 8px;
            background: #3e6b38;
            color: white;
            font-size: 1em;
            font-weight: 600;
            cursor: pointer;
        }

        button:hover { background: #325a2d; }
        button:disabled { background: #a9b8a6; cursor: wait; }

        .result-block { margin-top: 24px; display: none; }

        .result-block label {
            display: block;
            color: #2f4a2c;
            font-weight: 600;
            margin-bottom: 8px;
        }

        textarea {
            width: 100%;
            min-height: 220px;
            padding: 14px;
            border: 1px solid #cdd9ca;
            border-radius: 8px;
            font-family: inherit;
            font-size: 0.95em;
            line-height: 1.5;
            resize: vertical;
            background: #fafcf9;
        }
    </style>
</head>
<body>
    <div class="card">
        <h1>AI Nutritionist App</h1>
        <p class="subheader">Upload an image of your meal, and let AI analyze the calories!</p>

        <div class="picker" id="picker">
            Click to choose a meal photo (JPG, JPEG, PNG)
            <input type="file" id="fileInput" accept=".jpg,.jpeg,.png">
        </div>

        <div class="banner warning" id="warning">Please upload an image file.</div>
        <div class="banner error" id="error"></div>
        <div class="banner success" id="success">AI Analysis Complete!</div>

        <img class="preview" id="preview" alt="Uploaded image">

        <button id="analyzeBtn" disabled>Tell me the total calories</button>

        <div class="result-block" id="resultBlock">
            <label for="analysis">Nutrition Analysis</label>
            <textarea id="analysis" readonly></textarea>
        </div>
    </div>

    <script>
        const picker = document.getElementById('picker');
        const fileInput = document.getElementById('fileInput');
        const warning = document.getElementById('warning');
        const errorBanner = document.getElementById('error');
        const successBanner = document.getElementById('success');
        const preview = document.getElementById('preview');
        const analyzeBtn = document.getElementById('analyzeBtn');
        const resultBlock = document.getElementById('resultBlock');
        const analysis = document.getElementById('analysis');

        let selectedFile = null;

        warning.style.display = 'block';

        picker.addEventListener('click', () => fileInput.click());

        fileInput.addEventListener('change', () => {
            const file = fileInput.files[0];
            if (!file) return;
            selectedFile = file;

            warning.style.display = 'none';
            errorBanner.style.display = 'none';
            successBanner.style.display = 'none';
            resultBlock.style.display = 'none';
            analyzeBtn.disabled = true;

            const reader = new FileReader();
            reader.onload = (e) => {
                preview.src = e.target.result;
            };
            reader.readAsDataURL(file);
        });

        // The preview decoding the file is what enables submit; a file
        // the browser cannot decode fails here, before any request.
        preview.addEventListener('load', () => {
            preview.style.display = 'block';
            analyzeBtn.disabled = false;
        });

        preview.addEventListener('error', () => {
            selectedFile = null;
            preview.removeAttribute('src');
            preview.style.display = 'none';
            analyzeBtn.disabled = true;
            errorBanner.textContent = 'Error: unrecognized or corrupt image data';
            errorBanner.style.display = 'block';
        });

        analyzeBtn.addEventListener('click', async () => {
            if (!selectedFile) {
                warning.style.display = 'block';
                return;
            }

            analyzeBtn.disabled = true;
            analyzeBtn.textContent = 'Analyzing...';
            errorBanner.style.display = 'none';
            successBanner.style.display = 'none';
            resultBlock.style.display = 'none';

            const formData = new FormData();
            formData.append('image', selectedFile);

            try {
                const response = await fetch('/analyze', { method: 'POST', body: formData });
                const body = await response.json();

                if (!response.ok) {
                    throw new Error(body.error || 'request failed');
                }

                analysis.value = body.analysis;
                resultBlock.style.display = 'block';
                successBanner.style.display = 'block';
            } catch (err) {
                // Keep the preview visible; only the result is withheld.
                errorBanner.textContent = 'Error: ' + err.message;
                errorBanner.style.display = 'block';
            } finally {
                analyzeBtn.disabled = false;
                analyzeBtn.textContent = 'Tell me the total calories';
            }
        });
    </script>
</body>
</html>
"#;
