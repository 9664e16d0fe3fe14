use crate::api::auth::{authenticator, Auth};
use crate::api::error::{bad_request, internal_server_error, DacroqApiError};
use crate::api::v1::system::check_maintenance;
use crate::api::{api_resource, api_scope, JsonResponse};
use crate::database::{SatResultRepository, SatResultRepositoryImpl};
use crate::solver::{self, BatchOptions};
use crate::state::AppState;
use actix_web::web::{Bytes, Data, ServiceConfig};
use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use dacroq_model::api_v1::{ChangeKind, Collection};
use dacroq_model::sat::{ListSatResultsRequest, ListSatResultsResponse, SolveUploadQuery};

pub fn configure(v1: &mut ServiceConfig) {
    v1.service(
        api_scope("sat")
            .wrap(HttpAuthentication::with_fn(authenticator))
            .service(api_resource("solve").route(web::post().to(solve)))
            .service(api_resource("results").route(web::get().to(results))),
    );
}

/// Body is the raw `.cnf` or `.zip` file.
async fn solve(
    auth: Auth,
    query: actix_web_validator::Query<SolveUploadQuery>,
    body: Bytes,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    let maintenance_state = state.clone();
    let user_id = auth.user.id;
    web::block(move || -> Result<_, DacroqApiError> {
        let database = maintenance_state.database()?;
        check_maintenance(&database, &auth)
    })
    .await??;

    let query = query.into_inner();
    let options = BatchOptions {
        solver: query.solver,
        parallel: query.parallel,
        member_limit: state.upload_limit as u64,
    };
    let batch = solver::solve_batch(&state.remote, &query.filename, &body, options, Some(user_id))
        .await
        .map_err(|e| bad_request(e.to_string()))?;

    solver::insert_results(state.pool(), batch.rows)
        .await
        .map_err(|e| internal_server_error("SatResultInsert", format!("{:#}", e)))?;
    state.changes.publish(
        Collection::SatResults,
        &batch.response.batch_id,
        ChangeKind::Created,
    );
    Ok(batch.response.json_response())
}

async fn results(
    _auth: Auth,
    query: actix_web_validator::Query<ListSatResultsRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = SatResultRepositoryImpl::new(&database);
        let page = repository.find_page(query.limit, query.offset, query.batch_id.as_deref())?;
        Ok(ListSatResultsResponse {
            items: page.results.into_iter().map(Into::into).collect(),
            total: page.count,
        })
    })
    .await?
    .map(JsonResponse::json_response)
}
