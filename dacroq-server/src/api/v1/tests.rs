use crate::api::auth::{authenticator, Auth};
use crate::api::error::{not_found, DacroqApiError};
use crate::api::v1::system::check_maintenance;
use crate::api::{api_resource, api_scope, JsonResponse};
use crate::database::{NewTest, Test, TestRepository, TestRepositoryImpl};
use crate::state::AppState;
use actix_web::web::{Data, Path, ServiceConfig};
use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use chrono::Utc;
use dacroq_model::api_v1::{
    ChangeKind, Collection, CreateTestRequest, ListTestsRequest, ListTestsResponse, TestSummary,
    UpdateTestRequest,
};
use dacroq_model::tests::TestStatus;
use std::convert::TryFrom;

pub fn configure(v1: &mut ServiceConfig) {
    v1.service(
        api_scope("tests")
            .wrap(HttpAuthentication::with_fn(authenticator))
            .service(
                api_resource("")
                    .route(web::get().to(list))
                    .route(web::post().to(create)),
            )
            .service(
                api_resource("{test_id}")
                    .route(web::get().to(get))
                    .route(web::put().to(update))
                    .route(web::delete().to(delete)),
            )
            .service(api_resource("{test_id}/rerun").route(web::post().to(rerun))),
    );
}

fn retrieve_test(repository: &TestRepositoryImpl, test_id: i32) -> Result<Test, DacroqApiError> {
    repository
        .find_by_id(test_id)?
        .ok_or_else(|| not_found("Test id not found"))
}

async fn list(
    _auth: Auth,
    query: actix_web_validator::Query<ListTestsRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = TestRepositoryImpl::new(&database);
        let page = repository.find_page(query.limit, query.offset, query.status, query.chip_type)?;
        Ok(ListTestsResponse {
            items: page
                .results
                .into_iter()
                .map(TestSummary::try_from)
                .collect::<Result<_, _>>()?,
            total: page.count,
        })
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn create(
    auth: Auth,
    json: actix_web_validator::Json<CreateTestRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        check_maintenance(&database, &auth)?;
        let repository = TestRepositoryImpl::new(&database);
        let json = json.into_inner();
        let test = repository.insert(&NewTest {
            name: json.name,
            chip_type: json.chip_type.to_string(),
            status: TestStatus::Queued.to_string(),
            results: json.results,
            created_by: Some(auth.user.id),
            creator: serde_json::to_value(auth.user.snapshot())?,
        })?;
        log::info!("Test {} ({}) queued by user {}", test.id, test.chip_type, auth.user.id);
        state
            .changes
            .publish(Collection::Tests, test.id, ChangeKind::Created);
        TestSummary::try_from(test)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn get(
    _auth: Auth,
    test_id: Path<i32>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = TestRepositoryImpl::new(&database);
        TestSummary::try_from(retrieve_test(&repository, *test_id)?)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn update(
    _auth: Auth,
    test_id: Path<i32>,
    json: actix_web_validator::Json<UpdateTestRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = TestRepositoryImpl::new(&database);
        let mut test = retrieve_test(&repository, *test_id)?;
        let json = json.into_inner();
        if let Some(name) = json.name {
            test.name = name;
        }
        if let Some(status) = json.status {
            test.set_status(status, Utc::now());
        }
        if let Some(results) = json.results {
            test.results = Some(results);
        }
        repository.update(&test)?;
        state
            .changes
            .publish(Collection::Tests, test.id, ChangeKind::Updated);
        TestSummary::try_from(test)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn delete(
    auth: Auth,
    test_id: Path<i32>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = TestRepositoryImpl::new(&database);
        let test = retrieve_test(&repository, *test_id)?;
        repository.delete(&test)?;
        log::info!("Test {} deleted by user {}", test.id, auth.user.id);
        state
            .changes
            .publish(Collection::Tests, test.id, ChangeKind::Deleted);
        Ok(())
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn rerun(
    auth: Auth,
    test_id: Path<i32>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        check_maintenance(&database, &auth)?;
        let repository = TestRepositoryImpl::new(&database);
        let mut test = retrieve_test(&repository, *test_id)?;
        test.rerun();
        repository.update(&test)?;
        log::info!("Test {} re-queued by user {}", test.id, auth.user.id);
        state
            .changes
            .publish(Collection::Tests, test.id, ChangeKind::Updated);
        TestSummary::try_from(test)
    })
    .await?
    .map(JsonResponse::json_response)
}
