#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

mod page;

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Form, Router};
use multilens_core::form::{Mode, Upload};
use multilens_service::{AnalysisError, AnalysisOutput, Analyzer};
use serde::Deserialize;
use tokio::sync::watch;

use crate::page::{render_page, Outcome, PageView};

const DEFAULT_WEB_ADDR: &str = "localhost:48770";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;
const PANICKED_JOB_MESSAGE: &str = "Something went wrong. Please try again later.";

struct AppState {
    analyzer: Arc<Analyzer>,
    shutdown_tx: watch::Sender<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct PageQuery {
    mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslateForm {
    #[serde(default)]
    source: String,
    #[serde(default)]
    target: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Default, Deserialize)]
struct TextForm {
    #[serde(default)]
    text: String,
}

fn read_env_trim(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_addr(raw: &str) -> Option<String> {
    let mut value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(rest) = value.strip_prefix("http://") {
        value = rest;
    }
    if let Some(rest) = value.strip_prefix("https://") {
        value = rest;
    }
    value = value.split('/').next().unwrap_or(value);
    if value.is_empty() {
        return None;
    }
    if value.contains(':') {
        return Some(value.to_string());
    }
    Some(format!("localhost:{value}"))
}

/// Port of a `localhost:<port>` address, matched without slicing inside a character.
fn localhost_port(addr: &str) -> Option<&str> {
    const PREFIX: &str = "localhost:";
    let prefix = addr.get(..PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(PREFIX) {
        return None;
    }
    let port = &addr[PREFIX.len()..];
    (!port.is_empty()).then_some(port)
}

fn resolve_web_addr() -> String {
    read_env_trim("MULTILENS_WEB_ADDR")
        .and_then(|v| normalize_addr(&v))
        .unwrap_or_else(|| DEFAULT_WEB_ADDR.to_string())
}

fn resolve_max_upload_bytes() -> usize {
    read_env_trim("MULTILENS_WEB_MAX_UPLOAD_BYTES")
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
}

fn to_outcome(result: Result<AnalysisOutput, AnalysisError>) -> Outcome {
    match result {
        Ok(output) => Outcome::Success(output.to_string()),
        Err(err) => Outcome::Error(err.to_string()),
    }
}

/// The dispatcher blocks (including its retry sleeps), so each submission
/// runs on the blocking pool.
async fn run_analysis<F>(state: &AppState, mode: Mode, job: F) -> Outcome
where
    F: FnOnce(&Analyzer) -> Result<AnalysisOutput, AnalysisError> + Send + 'static,
{
    let analyzer = state.analyzer.clone();
    match tokio::task::spawn_blocking(move || job(&analyzer)).await {
        Ok(result) => to_outcome(result),
        Err(err) => {
            log::error!("event=analysis_job_failed mode={} err={}", mode.slug(), err);
            Outcome::Error(PANICKED_JOB_MESSAGE.to_string())
        }
    }
}

async fn read_upload(mut multipart: Multipart) -> Result<Option<Upload>, String> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| format!("Could not read the upload: {err}"))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| format!("Could not read the upload: {err}"))?;
        upload = Some(Upload::new(file_name, bytes.to_vec()));
    }
    Ok(upload)
}

async fn show_page(Query(query): Query<PageQuery>) -> Html<String> {
    let mode = query
        .mode
        .as_deref()
        .and_then(Mode::from_slug)
        .unwrap_or(Mode::Translation);
    Html(render_page(&PageView::new(mode)))
}

async fn translate(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TranslateForm>,
) -> Html<String> {
    let mut view = PageView::new(Mode::Translation);
    if !form.source.trim().is_empty() {
        view.source = form.source.clone();
    }
    if !form.target.trim().is_empty() {
        view.target = form.target.clone();
    }
    view.text = form.text.clone();
    let outcome = run_analysis(&state, Mode::Translation, move |analyzer| {
        analyzer.translate_named(&form.source, &form.target, &form.text)
    })
    .await;
    Html(render_page(&view.with_outcome(outcome)))
}

async fn sentiment(State(state): State<Arc<AppState>>, Form(form): Form<TextForm>) -> Html<String> {
    let mut view = PageView::new(Mode::Sentiment);
    view.text = form.text.clone();
    let outcome = run_analysis(&state, Mode::Sentiment, move |analyzer| {
        analyzer.analyze_sentiment(&form.text)
    })
    .await;
    Html(render_page(&view.with_outcome(outcome)))
}

async fn upload_mode(state: &AppState, mode: Mode, multipart: Multipart) -> Html<String> {
    let outcome = match read_upload(multipart).await {
        Ok(upload) => {
            run_analysis(state, mode, move |analyzer| match mode {
                Mode::ImageOcr => analyzer.extract_image_text(upload.as_ref()),
                _ => analyzer.transcribe_audio(upload.as_ref()),
            })
            .await
        }
        Err(message) => {
            log::warn!("event=upload_rejected mode={} err={}", mode.slug(), message);
            Outcome::Error(message)
        }
    };
    Html(render_page(&PageView::new(mode).with_outcome(outcome)))
}

async fn ocr(State(state): State<Arc<AppState>>, multipart: Multipart) -> Html<String> {
    upload_mode(&state, Mode::ImageOcr, multipart).await
}

async fn transcribe(State(state): State<Arc<AppState>>, multipart: Multipart) -> Html<String> {
    upload_mode(&state, Mode::AudioToText, multipart).await
}

async fn quit(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let _ = state.shutdown_tx.send(true);
    Html("<html><body>OK</body></html>")
}

fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(show_page))
        .route("/translate", post(translate))
        .route("/sentiment", post(sentiment))
        .route("/ocr", post(ocr))
        .route("/transcribe", post(transcribe))
        .route("/__quit", get(quit))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn serve_on_listener(
    listener: tokio::net::TcpListener,
    app: Router,
    mut shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            while !*shutdown_rx.borrow() {
                if shutdown_rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await
}

async fn run_web_server(
    addr: &str,
    app: Router,
    shutdown_rx: watch::Receiver<bool>,
) -> std::io::Result<()> {
    // localhost may resolve to a single stack; listen on both loopbacks when possible.
    let trimmed = addr.trim();
    if let Some(port) = localhost_port(trimmed) {
        let v4 = tokio::net::TcpListener::bind(format!("127.0.0.1:{port}")).await;
        let v6 = tokio::net::TcpListener::bind(format!("[::1]:{port}")).await;
        return match (v4, v6) {
            (Ok(v4_listener), Ok(v6_listener)) => {
                let v4_task = serve_on_listener(v4_listener, app.clone(), shutdown_rx.clone());
                let v6_task = serve_on_listener(v6_listener, app, shutdown_rx);
                let (v4_result, v6_result) = tokio::join!(v4_task, v6_task);
                v4_result.and(v6_result)
            }
            (Ok(listener), Err(_)) | (Err(_), Ok(listener)) => {
                serve_on_listener(listener, app, shutdown_rx).await
            }
            (Err(err), Err(_)) => Err(err),
        };
    }

    let listener = tokio::net::TcpListener::bind(trimmed).await?;
    serve_on_listener(listener, app, shutdown_rx).await
}

fn main() {
    multilens_service::portable::bootstrap_current_process();

    // The blocking HTTP client is created and dropped outside the async runtime.
    let analyzer = Arc::new(Analyzer::from_env());
    let web_addr = resolve_web_addr();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = Arc::new(AppState {
        analyzer: analyzer.clone(),
        shutdown_tx,
    });
    let app = build_router(state, resolve_max_upload_bytes());

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("web runtime failed: {err}");
            std::process::exit(1);
        }
    };

    log::info!(
        "event=web_listening addr={} inference_base={}",
        web_addr,
        analyzer.dispatcher().base_url()
    );
    println!("multilens-web listening on {web_addr}");

    if read_env_trim("MULTILENS_WEB_NO_OPEN").is_none() {
        let _ = webbrowser::open(&format!("http://{}", web_addr.trim()));
    }

    let result = runtime.block_on(run_web_server(&web_addr, app, shutdown_rx));
    drop(runtime);
    if let Err(err) = result {
        eprintln!("web stopped: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;
    use multilens_core::ModelRoutes;
    use multilens_service::{DispatchConfig, Dispatcher};

    /// Built and dropped outside any runtime, like `main` does.
    fn offline_state() -> Arc<AppState> {
        let (shutdown_tx, _) = watch::channel(false);
        Arc::new(AppState {
            analyzer: Arc::new(Analyzer::new(
                Dispatcher::new(DispatchConfig::default(), None),
                ModelRoutes::default(),
            )),
            shutdown_tx,
        })
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("test runtime")
            .block_on(future)
    }

    #[test]
    fn panicking_job_becomes_generic_error() {
        let state = offline_state();
        let outcome = block_on(run_analysis(
            &state,
            Mode::Sentiment,
            |_: &Analyzer| -> Result<AnalysisOutput, AnalysisError> { panic!("job exploded") },
        ));
        assert_eq!(outcome, Outcome::Error(PANICKED_JOB_MESSAGE.to_string()));
    }

    #[test]
    fn empty_file_part_renders_missing_image_inline() {
        let state = offline_state();
        let boundary = "multilens-form-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"\"\r\nContent-Type: application/octet-stream\r\n\r\n\r\n--{boundary}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/ocr")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("multipart request");

        let Html(html) = block_on(async {
            let multipart = Multipart::from_request(request, &())
                .await
                .expect("multipart extractor");
            upload_mode(&state, Mode::ImageOcr, multipart).await
        });
        assert!(html.contains("<div class=\"result error\">Please upload an image.</div>"));
        assert!(html.contains("action=\"/ocr\""));
    }

    #[test]
    fn localhost_prefix_match_is_char_boundary_safe() {
        assert_eq!(localhost_port("localhost:48770"), Some("48770"));
        assert_eq!(localhost_port("LocalHost:80"), Some("80"));
        assert_eq!(localhost_port("localhost:"), None);
        assert_eq!(localhost_port("localhostéx:80"), None);
        assert_eq!(localhost_port("127.0.0.1:80"), None);
        assert_eq!(localhost_port("é"), None);
    }

    #[test]
    fn normalize_addr_accepts_ports_and_urls() {
        assert_eq!(normalize_addr("9000").as_deref(), Some("localhost:9000"));
        assert_eq!(
            normalize_addr("http://0.0.0.0:8080/ui").as_deref(),
            Some("0.0.0.0:8080")
        );
        assert_eq!(normalize_addr("  "), None);
        assert_eq!(normalize_addr("https:///"), None);
    }

    #[test]
    fn analysis_results_map_to_inline_outcomes() {
        let ok = to_outcome(Ok(AnalysisOutput {
            mode: Mode::Sentiment,
            model: "m".to_string(),
            headline: "Detected Emotion".to_string(),
            text: "joy".to_string(),
        }));
        assert_eq!(ok, Outcome::Success("Detected Emotion: joy".to_string()));

        let err = to_outcome(Err(AnalysisError::Unavailable {
            mode: Mode::Translation,
        }));
        assert_eq!(
            err,
            Outcome::Error("Translation service is unavailable. Please try again later.".to_string())
        );
    }
}
