use crate::api::auth::{authenticator, Auth};
use crate::api::error::DacroqApiError;
use crate::api::v1::check_slug;
use crate::api::{api_resource, api_scope, JsonResponse};
use crate::state::AppState;
use actix_web::web::{Data, Path, ServiceConfig};
use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;

pub fn configure(v1: &mut ServiceConfig) {
    v1.service(
        api_scope("hardware")
            .wrap(HttpAuthentication::with_fn(authenticator))
            .service(api_resource("status").route(web::get().to(status)))
            .service(api_resource("reset/{device}").route(web::post().to(reset))),
    );
}

async fn status(_auth: Auth, state: Data<AppState>) -> Result<HttpResponse, DacroqApiError> {
    Ok(state.remote.hardware_status().await?.json_response())
}

async fn reset(
    auth: Auth,
    device: Path<String>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    auth.require_admin()?;
    check_slug(&device)?;
    log::warn!("Hardware reset of {} requested by user {}", device, auth.user.id);
    Ok(state.remote.reset_hardware(&device).await?.json_response())
}
