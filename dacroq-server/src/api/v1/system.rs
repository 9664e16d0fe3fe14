use crate::api::auth::{authenticator, Auth};
use crate::api::error::DacroqApiError;
use crate::api::v1::check_slug;
use crate::api::{api_resource, api_scope, JsonResponse};
use crate::database::{
    Connection, SystemFlag, SystemFlagRepository, SystemFlagRepositoryImpl, MAINTENANCE_FLAG,
};
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::web::{Data, Path, ServiceConfig};
use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use chrono::Utc;
use dacroq_model::api_v1::{ChangeKind, Collection, SetSystemFlagRequest, SystemFlagSummary};
use http_api_problem::ApiError;

pub fn configure(v1: &mut ServiceConfig) {
    v1.service(
        api_scope("system")
            .wrap(HttpAuthentication::with_fn(authenticator))
            .service(api_resource("").route(web::get().to(list)))
            .service(api_resource("{name}").route(web::put().to(set))),
    );
}

/// Rejects work that starts hardware runs while maintenance mode is on.
/// Admins are let through so they can verify the system.
pub fn check_maintenance(database: &Connection, auth: &Auth) -> Result<(), DacroqApiError> {
    if auth.role().is_admin() {
        return Ok(());
    }
    let repository = SystemFlagRepositoryImpl::new(database);
    match repository.find_by_id(MAINTENANCE_FLAG)? {
        Some(flag) if flag.enabled => Err(ApiError::builder(StatusCode::SERVICE_UNAVAILABLE)
            .title("Maintenance")
            .message(
                flag.message
                    .unwrap_or_else(|| "The system is undergoing maintenance".to_owned()),
            )
            .finish()
            .into()),
        _ => Ok(()),
    }
}

async fn list(_auth: Auth, state: Data<AppState>) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = SystemFlagRepositoryImpl::new(&database);
        let flags: Vec<SystemFlagSummary> = repository
            .find_all_ordered()?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(flags)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn set(
    auth: Auth,
    name: Path<String>,
    json: actix_web_validator::Json<SetSystemFlagRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    auth.require_admin()?;
    check_slug(&name)?;
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = SystemFlagRepositoryImpl::new(&database);
        let json = json.into_inner();
        let flag = repository.upsert(&SystemFlag {
            name: name.into_inner(),
            enabled: json.enabled,
            message: json.message,
            updated: Utc::now(),
        })?;
        log::info!(
            "System flag {} set to {} by user {}",
            flag.name,
            flag.enabled,
            auth.user.id
        );
        state
            .changes
            .publish(Collection::System, &flag.name, ChangeKind::Updated);
        Ok(SystemFlagSummary::from(flag))
    })
    .await?
    .map(JsonResponse::json_response)
}
