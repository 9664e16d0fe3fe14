use crate::api::auth::{authenticator, Auth};
use crate::api::error::DacroqApiError;
use crate::api::{api_resource, api_scope, JsonResponse};
use crate::database::{
    FeedbackRepository, FeedbackRepositoryImpl, NewFeedbackEntry, FEEDBACK_STATUS_NEW,
};
use crate::state::AppState;
use actix_web::web::{Data, ServiceConfig};
use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use dacroq_model::api_v1::{FeedbackSummary, SubmitFeedbackRequest};

/// Submitting needs no account, reading is for admins.
pub fn configure(v1: &mut ServiceConfig) {
    v1.service(
        api_scope("feedback")
            .service(api_resource("").route(web::post().to(submit)))
            .service(
                api_resource("all")
                    .route(web::get().to(list))
                    .wrap(HttpAuthentication::with_fn(authenticator)),
            ),
    );
}

async fn submit(
    json: actix_web_validator::Json<SubmitFeedbackRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let json = json.into_inner();
        let entry = FeedbackRepositoryImpl::new(&database).insert(&NewFeedbackEntry {
            kind: json.kind,
            description: json.description,
            email: json.email.map(|e| e.to_ascii_lowercase()),
            status: FEEDBACK_STATUS_NEW.to_owned(),
        })?;
        log::info!("Feedback {} received ({})", entry.id, entry.kind);
        Ok(FeedbackSummary::from(entry))
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn list(auth: Auth, state: Data<AppState>) -> Result<HttpResponse, DacroqApiError> {
    auth.require_admin()?;
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let entries: Vec<FeedbackSummary> = FeedbackRepositoryImpl::new(&database)
            .find_newest()?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(entries)
    })
    .await?
    .map(JsonResponse::json_response)
}
