mod auth;
mod error;
pub mod v1;

use error::DacroqApiError;

use actix_extensible_rate_limit::backend::memory::InMemoryBackend;
use actix_web::http::StatusCode;
use actix_web::web::ServiceConfig;
use actix_web::{web, HttpResponse};
use http_api_problem::ApiError;
use serde::Serialize;

pub fn configure(
    api: &mut ServiceConfig,
    rate_limit_backend: &InMemoryBackend,
    upload_limit: usize,
) {
    extractor_errors(api);
    api.app_data(web::PayloadConfig::new(upload_limit));
    api.configure(|api| v1::configure(api, rate_limit_backend));
    api.service(api_resource("").route(web::get().to(index)));
}

/// Rejected paths, queries and bodies are answered with problem documents.
fn extractor_errors(api: &mut ServiceConfig) {
    api.app_data(
        actix_web::web::PathConfig::default().error_handler(|e, _| DacroqApiError::from(e).into()),
    );
    api.app_data(
        actix_web_validator::QueryConfig::default()
            .error_handler(|e, _| DacroqApiError::from(e).into()),
    );
    api.app_data(
        actix_web_validator::JsonConfig::default()
            .error_handler(|e, _| DacroqApiError::from(e).into()),
    );
}

pub trait JsonResponse {
    fn json_response(self) -> HttpResponse;
}

impl<T: Serialize> JsonResponse for T {
    fn json_response(self) -> HttpResponse {
        HttpResponse::Ok().json(self)
    }
}

fn api_scope(path: &str) -> actix_web::Scope {
    web::scope(path).default_service(web::route().to(|| async {
        ApiError::builder(StatusCode::NOT_FOUND)
            .finish()
            .into_actix_web_response()
    }))
}

fn api_resource(path: &str) -> actix_web::Resource {
    web::resource(path).default_service(web::route().to(|| async {
        ApiError::builder(StatusCode::METHOD_NOT_ALLOWED)
            .finish()
            .into_actix_web_response()
    }))
}

async fn index() -> String {
    format!("Dacroq API {}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use dacroq_model::api_v1::PinPostRequest;

    async fn echo_pin(json: actix_web_validator::Json<PinPostRequest>) -> HttpResponse {
        json.into_inner().json_response()
    }

    #[actix_web::test]
    async fn malformed_pin_body_is_a_problem_document() {
        let app = test::init_service(App::new().configure(|api| {
            extractor_errors(api);
            api.route("/pin", web::post().to(echo_pin));
        }))
        .await;
        let request = test::TestRequest::post()
            .uri("/pin")
            .insert_header(("content-type", "application/json"))
            .set_payload(r#"{"pinned":"yes"}"#)
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let content_type = response.headers().get("content-type").unwrap();
        assert!(content_type.to_str().unwrap().contains("problem+json"));
    }

    #[actix_web::test]
    async fn well_formed_pin_body_is_accepted() {
        let app = test::init_service(App::new().configure(|api| {
            extractor_errors(api);
            api.route("/pin", web::post().to(echo_pin));
        }))
        .await;
        let request = test::TestRequest::post()
            .uri("/pin")
            .set_json(&serde_json::json!({ "pinned": true }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["pinned"], true);
    }
}
