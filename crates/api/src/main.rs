use anyhow::Context;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tothezip_core::config::Settings;
use tothezip_core::domain::contract::{RankExplainRequest, RankExplainResponse};
use tothezip_core::llm::gms::GmsExplainer;
use tothezip_core::llm::{DisabledExplainer, Explainer};
use tothezip_core::service::RankExplainService;

const DEFAULT_PORT: u16 = 8000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let explainer = build_explainer(&settings);
    tracing::info!(provider = explainer.provider(), "explainer configured");

    let state = AppState {
        service: RankExplainService::new(explainer, settings.explainer_timeout()),
    };

    let app = router(state)
        .layer(cors_layer(&settings.cors_allowed_origins)?)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
struct AppState {
    service: RankExplainService,
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/reco/rank-explain", post(rank_explain))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct ApiError {
    detail: String,
}

async fn rank_explain(
    State(state): State<AppState>,
    Json(req): Json<RankExplainRequest>,
) -> Result<Json<RankExplainResponse>, (StatusCode, Json<ApiError>)> {
    if let Err(e) = req.validate() {
        tracing::warn!(error = %e, "rejecting rank-explain request");
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ApiError {
                detail: e.to_string(),
            }),
        ));
    }

    Ok(Json(state.service.rank_explain(&req).await))
}

fn build_explainer(settings: &Settings) -> Arc<dyn Explainer> {
    if settings.gms_key.is_none() {
        tracing::warn!("GMS_KEY missing; explanations will use fallback text");
        return Arc::new(DisabledExplainer::new("GMS_KEY not set"));
    }

    match GmsExplainer::from_settings(settings) {
        Ok(explainer) => Arc::new(explainer),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "explainer setup failed; starting API in degraded mode");
            Arc::new(DisabledExplainer::new(format!("{e:#}")))
        }
    }
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin: {o:?}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    // Credentials rule out wildcards, so methods and headers are mirrored instead.
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tothezip_core::llm::{ExplainInput, ExplainerOutput, Explanations, RawExplanation};
    use tower::ServiceExt;

    struct CannedExplainer;

    #[async_trait::async_trait]
    impl Explainer for CannedExplainer {
        fn provider(&self) -> &'static str {
            "canned"
        }

        async fn explain(&self, input: &ExplainInput<'_>) -> anyhow::Result<ExplainerOutput> {
            let results = input
                .candidates
                .iter()
                .map(|c| RawExplanation {
                    property_id: json!(c.property_id),
                    summary: json!(format!("{}번 매물 설명", c.property_id)),
                    reasons: json!(["a", "b", "c", "d", "e"]),
                    ..RawExplanation::default()
                })
                .collect();
            Ok(ExplainerOutput::Enabled(Explanations {
                model: "canned-v1".into(),
                results,
            }))
        }
    }

    fn app(explainer: Arc<dyn Explainer>) -> Router {
        router(AppState {
            service: RankExplainService::new(explainer, Duration::from_secs(5)),
        })
    }

    fn disabled_app() -> Router {
        app(Arc::new(DisabledExplainer::new("GMS_KEY not set")))
    }

    async fn post_json(app: Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/reco/rank-explain")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn sample_request() -> Value {
        json!({
            "base": {"propertyId": 100, "dealType": "월세", "price": "50", "deposit": "1,000",
                     "area": 84.0, "rating": 4.0, "trend": "UP"},
            "candidates": [
                {"propertyId": 2, "price": "50", "deposit": "2,000", "area": 59.0,
                 "distM": 500.0, "trend": "FLAT"},
                {"propertyId": 1, "aptName": "래미안", "price": "55", "deposit": "1,000",
                 "area": 84.0, "rating": 5.0, "distM": 0.0, "trend": "UP"},
            ],
            "topK": 5,
            "maxReasons": 2,
        })
    }

    #[tokio::test]
    async fn healthz_ok() {
        let response = disabled_app()
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_candidates_return_empty_ok() {
        let (status, body) =
            post_json(disabled_app(), json!({"base": {"propertyId": 1}, "candidates": []})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "ok", "model": null, "results": [], "error": null})
        );
    }

    #[tokio::test]
    async fn out_of_range_top_k_is_rejected() {
        let mut req = sample_request();
        req["topK"] = json!(31);
        let (status, body) = post_json(disabled_app(), req).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("topK"));
    }

    #[tokio::test]
    async fn disabled_explainer_returns_fallback_results() {
        let (status, body) = post_json(disabled_app(), sample_request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"], Value::Null);
        assert_eq!(body["error"], "GMS_KEY not set");

        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["propertyId"], 1);
        assert_eq!(results[0]["score"], 94.45);
        assert_eq!(results[0]["judgeCode"], "STRONG_RECO");
        assert_eq!(results[0]["reasons"].as_array().unwrap().len(), 2);
        assert_eq!(
            results[0]["breakdown"].as_object().unwrap().len(),
            5,
            "breakdown must carry all five dimensions"
        );
        assert!(body.get("raw").is_none());
    }

    #[tokio::test]
    async fn explainer_output_is_merged() {
        let (status, body) = post_json(app(Arc::new(CannedExplainer)), sample_request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"], "canned-v1");
        assert_eq!(body["error"], Value::Null);

        let results = body["results"].as_array().unwrap();
        assert_eq!(results[0]["summary"], "1번 매물 설명");
        assert_eq!(results[0]["reasons"], json!(["a", "b"]));
        assert_eq!(results[1]["summary"], "2번 매물 설명");
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let app = disabled_app().layer(cors_layer(&["http://localhost:5173".to_string()]).unwrap());
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/reco/rank-explain")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
    }

    #[test]
    fn cors_rejects_invalid_origin() {
        assert!(cors_layer(&["bad\norigin".to_string()]).is_err());
    }
}
