use crate::api::auth::{authenticator, Auth};
use crate::api::error::{not_found, DacroqApiError};
use crate::api::v1::converters::notification_summary;
use crate::api::{api_resource, api_scope, JsonResponse};
use crate::database::{
    NewNotification, Notification, NotificationRepository, NotificationRepositoryImpl,
};
use crate::state::AppState;
use actix_web::web::{Data, Path, ServiceConfig};
use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use dacroq_model::api_v1::{ChangeKind, Collection, CreateNotificationRequest};

pub fn configure(v1: &mut ServiceConfig) {
    v1.service(
        api_scope("notifications")
            .wrap(HttpAuthentication::with_fn(authenticator))
            .service(
                api_resource("")
                    .route(web::get().to(list))
                    .route(web::post().to(create)),
            )
            .service(api_resource("{notification_id}").route(web::delete().to(delete)))
            .service(api_resource("{notification_id}/read").route(web::post().to(mark_read))),
    );
}

/// Soft deleted notifications and ones addressed to other users look the
/// same as ones that never existed.
fn retrieve_visible(
    repository: &NotificationRepositoryImpl,
    notification_id: i32,
    user_id: i32,
) -> Result<Notification, DacroqApiError> {
    repository
        .find_by_id(notification_id)?
        .filter(|n| n.visible_to(user_id))
        .ok_or_else(|| not_found("Notification id not found"))
}

async fn list(auth: Auth, state: Data<AppState>) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = NotificationRepositoryImpl::new(&database);
        let notifications = repository
            .find_visible_to(auth.user.id)?
            .into_iter()
            .map(|n| notification_summary(n, auth.user.id))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notifications)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn create(
    auth: Auth,
    json: actix_web_validator::Json<CreateNotificationRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    auth.require_admin()?;
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = NotificationRepositoryImpl::new(&database);
        let json = json.into_inner();
        let notification = repository.insert(&NewNotification {
            title: json.title,
            message: json.message,
            kind: serde_plain::to_string(&json.kind)?,
            global: json.recipients.is_empty(),
            recipients: json.recipients,
        })?;
        log::info!(
            "Notification {} sent by user {} ({} recipients)",
            notification.id,
            auth.user.id,
            if notification.global {
                "all".to_owned()
            } else {
                notification.recipients.len().to_string()
            }
        );
        state.changes.publish(
            Collection::Notifications,
            notification.id,
            ChangeKind::Created,
        );
        notification_summary(notification, auth.user.id)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn mark_read(
    auth: Auth,
    notification_id: Path<i32>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = NotificationRepositoryImpl::new(&database);
        let mut notification = retrieve_visible(&repository, *notification_id, auth.user.id)?;
        if repository.mark_read(&notification, auth.user.id)? > 0 {
            notification.read_by.push(auth.user.id);
        }
        notification_summary(notification, auth.user.id)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn delete(
    auth: Auth,
    notification_id: Path<i32>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    auth.require_admin()?;
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = NotificationRepositoryImpl::new(&database);
        let notification = repository
            .find_by_id(*notification_id)?
            .filter(|n| !n.deleted)
            .ok_or_else(|| not_found("Notification id not found"))?;
        repository.soft_delete(&notification)?;
        state.changes.publish(
            Collection::Notifications,
            notification.id,
            ChangeKind::Deleted,
        );
        Ok(())
    })
    .await?
    .map(JsonResponse::json_response)
}
