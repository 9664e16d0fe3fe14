use crate::api::auth::{authenticator, Auth};
use crate::api::{api_resource, JsonResponse};
use crate::state::AppState;
use actix_web::web::{Data, ServiceConfig};
use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use dacroq_model::api_v1::WaitChangesRequest;
use std::time::Duration;

pub fn configure(v1: &mut ServiceConfig) {
    v1.service(
        api_resource("changes")
            .route(web::get().to(wait))
            .wrap(HttpAuthentication::with_fn(authenticator)),
    );
}

/// Long poll: answers as soon as a matching change happens, or with an empty
/// list once the timeout passes. Clients pass the previous cursor as `since`
/// to pick up changes made between polls.
async fn wait(
    _auth: Auth,
    query: actix_web_validator::Query<WaitChangesRequest>,
    state: Data<AppState>,
) -> HttpResponse {
    state
        .changes
        .wait(
            query.since,
            query.collection,
            Duration::from_secs(query.timeout_secs),
        )
        .await
        .json_response()
}
