use std::sync::Arc;

use axum::extract::{Form, FromRequest, Multipart, Request, State};
use axum::http::header;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{info, warn};
use tower_http::services::ServeDir;

use crate::Envelope;
use crate::pipeline::Pipeline;

const INDEX_HTML: &str = include_str!("../templates/index.html");

/// Build the router. Generated files are served read-only under `/static/downloads`.
pub fn create_router(pipeline: Arc<Pipeline>) -> Router {
    let downloads = ServeDir::new(pipeline.store().root());

    Router::new()
        .route("/", get(index))
        .route("/process", post(process))
        .route("/health", get(health_check))
        .nest_service("/static/downloads", downloads)
        .with_state(pipeline)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Always answers 200; callers read `status` from the body
async fn process(State(pipeline): State<Arc<Pipeline>>, request: Request) -> Json<Envelope> {
    let fields = read_form(request).await;
    let envelope = pipeline
        .process(first_value(&fields, "video_url"), first_value(&fields, "api_key"))
        .await;
    info!("Request finished: {:?} {}", envelope.status, envelope.message);
    Json(envelope)
}

/// Collect text fields from a urlencoded or multipart body.
///
/// An unreadable body yields no fields, so the pipeline reports the missing URL.
async fn read_form(request: Request) -> Vec<(String, String)> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if is_multipart {
        match Multipart::from_request(request, &()).await {
            Ok(multipart) => read_multipart(multipart).await,
            Err(e) => {
                warn!("Unreadable multipart body: {e}");
                Vec::new()
            }
        }
    } else {
        match Form::<Vec<(String, String)>>::from_request(request, &()).await {
            Ok(Form(fields)) => fields,
            Err(e) => {
                warn!("Unreadable form body: {e}");
                Vec::new()
            }
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart field: {e}");
                break;
            }
        };
        // File uploads are not form values
        let Some(name) = field.name().filter(|_| field.file_name().is_none()).map(str::to_string) else {
            continue;
        };
        match field.text().await {
            Ok(value) => fields.push((name, value)),
            Err(e) => {
                warn!("Unreadable multipart field {name}: {e}");
                break;
            }
        }
    }
    fields
}

/// Repeated keys resolve to their first occurrence
fn first_value<'a>(fields: &'a [(String, String)], key: &str) -> Option<&'a str> {
    fields.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}
