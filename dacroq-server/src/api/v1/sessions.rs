use crate::api::auth::{self, authenticator, Auth};
use crate::api::error::DacroqApiError;
use crate::api::v1::converters::user_summary;
use crate::api::{api_resource, api_scope, JsonResponse};
use crate::database::{
    NewSession, SessionRepository, SessionRepositoryImpl, UserRepository, UserRepositoryImpl,
};
use crate::state::AppState;
use actix_extensible_rate_limit::backend::memory::InMemoryBackend;
use actix_extensible_rate_limit::backend::SimpleInputFunctionBuilder;
use actix_extensible_rate_limit::RateLimiter;
use actix_web::http::StatusCode;
use actix_web::web::{Data, Path, ServiceConfig};
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use chrono::Utc;
use dacroq_model::api_v1::{LoginRequest, LoginResponse, SessionSummary};
use http_api_problem::ApiError;
use std::time::Duration;

pub fn configure(v1: &mut ServiceConfig, rate_limit_backend: &InMemoryBackend) {
    let auth = HttpAuthentication::with_fn(authenticator);
    // 5 login attempts per minute per client address
    let login_limit = SimpleInputFunctionBuilder::new(Duration::from_secs(60), 5)
        .real_ip_key()
        .build();
    v1.service(
        api_scope("sessions")
            .service(
                api_resource("login")
                    .route(web::post().to(login))
                    .wrap(
                        RateLimiter::builder(rate_limit_backend.clone(), login_limit)
                            .add_headers()
                            .build(),
                    ),
            )
            .service(
                api_resource("logout")
                    .route(web::delete().to(logout))
                    .wrap(auth.clone()),
            )
            .service(
                api_resource("")
                    .route(web::get().to(list))
                    .wrap(auth.clone()),
            )
            .service(
                api_resource("{session_id}")
                    .route(web::delete().to(delete))
                    .wrap(auth),
            ),
    );
}

fn login_failed() -> DacroqApiError {
    ApiError::builder(StatusCode::UNAUTHORIZED)
        .message("Incorrect email or password")
        .finish()
        .into()
}

async fn login(
    json: actix_web_validator::Json<LoginRequest>,
    state: Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, DacroqApiError> {
    let ip_addr = auth::get_ip_address(&req.connection_info())?;
    let user_agent = auth::get_user_agent(req.headers())?;
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let user_repository = UserRepositoryImpl::new(&database);
        let user = user_repository
            .find_by_email(&json.email)?
            .ok_or_else(login_failed)?;
        if !bcrypt::verify(&json.password, &user.password_hash)? {
            return Err(login_failed());
        }
        if !user.enabled {
            return Err(ApiError::builder(StatusCode::FORBIDDEN)
                .message("This account has been disabled")
                .finish()
                .into());
        }
        let session_repository = SessionRepositoryImpl::new(&database);
        let ip_bin = auth::encode_ip_address(&ip_addr)?;
        let existing_session = session_repository.find_belonging_to_user_by_ip_and_agent(
            &user,
            &ip_bin,
            &user_agent,
        )?;
        let session = match existing_session {
            Some(mut existing_session) => {
                existing_session.last_used = Utc::now();
                session_repository.update(&existing_session)?;
                existing_session
            }
            None => session_repository.insert(&NewSession {
                user_id: user.id,
                token: auth::generate_token(&user),
                last_ip: ip_bin,
                user_agent,
            })?,
        };
        let now = Utc::now();
        user_repository.touch_last_online(&user, now)?;
        let test_count = user_repository.count_tests(&user)?;
        let mut user = user;
        user.last_online = Some(now);
        log::info!("User {} logged in", user.id);
        Ok(LoginResponse {
            user: user_summary(user, test_count),
            token: session.token.clone(),
            session: session.into(),
        })
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn logout(auth: Auth, state: Data<AppState>) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let session_repository = SessionRepositoryImpl::new(&database);
        session_repository.delete(&auth.session)?;
        Ok(())
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn list(auth: Auth, state: Data<AppState>) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let session_repository = SessionRepositoryImpl::new(&database);
        let sessions: Vec<SessionSummary> = session_repository
            .find_all_belonging_to_user(&auth.user)?
            .into_iter()
            .map(|s| s.into())
            .collect();
        Ok(sessions)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn delete(
    auth: Auth,
    session_id: Path<i32>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let session_repository = SessionRepositoryImpl::new(&database);
        if !session_repository.delete_by_id_and_user(*session_id, &auth.user)? {
            return Err(ApiError::new(StatusCode::NOT_FOUND).into());
        }
        Ok(())
    })
    .await?
    .map(JsonResponse::json_response)
}
