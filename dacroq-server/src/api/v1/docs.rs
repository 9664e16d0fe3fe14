use crate::api::auth::{authenticator, Auth};
use crate::api::error::{not_found, DacroqApiError};
use crate::api::v1::check_slug;
use crate::api::{api_resource, api_scope, JsonResponse};
use crate::database::{Doc, DocRepository, DocRepositoryImpl};
use crate::state::AppState;
use actix_web::web::{Data, Path, ServiceConfig};
use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use chrono::Utc;
use dacroq_model::api_v1::{ChangeKind, Collection, DocSummary, PutDocRequest};

pub fn configure(v1: &mut ServiceConfig) {
    v1.service(
        api_scope("docs")
            .wrap(HttpAuthentication::with_fn(authenticator))
            .service(api_resource("").route(web::get().to(list)))
            .service(
                api_resource("{section_id}")
                    .route(web::get().to(get))
                    .route(web::put().to(put))
                    .route(web::delete().to(delete)),
            ),
    );
}

async fn list(_auth: Auth, state: Data<AppState>) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let docs: Vec<DocSummary> = DocRepositoryImpl::new(&database)
            .find_all_ordered()?
            .into_iter()
            .map(Into::into)
            .collect();
        Ok(docs)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn get(
    _auth: Auth,
    section_id: Path<String>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let doc = DocRepositoryImpl::new(&database)
            .find_by_id(&section_id)?
            .ok_or_else(|| not_found("Doc section not found"))?;
        Ok(DocSummary::from(doc))
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn put(
    auth: Auth,
    section_id: Path<String>,
    json: actix_web_validator::Json<PutDocRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    auth.require_admin()?;
    check_slug(&section_id)?;
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let json = json.into_inner();
        let doc = DocRepositoryImpl::new(&database).upsert(&Doc {
            section_id: section_id.into_inner(),
            title: json.title,
            content: json.content,
            updated: Utc::now(),
        })?;
        state
            .changes
            .publish(Collection::Docs, &doc.section_id, ChangeKind::Updated);
        Ok(DocSummary::from(doc))
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn delete(
    auth: Auth,
    section_id: Path<String>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    auth.require_admin()?;
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = DocRepositoryImpl::new(&database);
        let doc = repository
            .find_by_id(&section_id)?
            .ok_or_else(|| not_found("Doc section not found"))?;
        repository.delete(&doc)?;
        state
            .changes
            .publish(Collection::Docs, &doc.section_id, ChangeKind::Deleted);
        Ok(())
    })
    .await?
    .map(JsonResponse::json_response)
}
