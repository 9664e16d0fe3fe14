use crate::api::auth::{authenticator, Auth};
use crate::api::{api_resource, JsonResponse};
use crate::state::AppState;
use actix_web::web::{Data, ServiceConfig};
use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn configure(v1: &mut ServiceConfig) {
    v1.service(
        api_resource("monitor")
            .route(web::get().to(snapshot))
            .wrap(HttpAuthentication::with_fn(authenticator)),
    );
}

async fn snapshot(_auth: Auth, state: Data<AppState>) -> HttpResponse {
    state.monitor.snapshot().await.json_response()
}
