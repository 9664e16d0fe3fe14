use crate::api::auth::{authenticator, Auth};
use crate::api::error::{forbidden, not_found, DacroqApiError, MapDieselUniqueViolation};
use crate::api::v1::converters::user_summary;
use crate::api::{api_resource, api_scope, JsonResponse};
use crate::database::{
    NewUser, SessionRepository, SessionRepositoryImpl, User, UserRepository, UserRepositoryImpl,
};
use crate::state::AppState;
use actix_web::http::StatusCode;
use actix_web::web::{Data, Path, ServiceConfig};
use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use dacroq_model::api_v1::{
    ChangeKind, Collection, CreateUserRequest, ListUsersRequest, ListUsersResponse,
    UpdateUserRequest,
};
use diesel::Connection;
use http_api_problem::ApiError;

pub fn configure(v1: &mut ServiceConfig) {
    v1.service(
        api_scope("users")
            .wrap(HttpAuthentication::with_fn(authenticator))
            .service(
                api_resource("")
                    .route(web::get().to(list))
                    .route(web::post().to(create)),
            )
            .service(
                api_resource("{user_id}")
                    .route(web::get().to(get))
                    .route(web::put().to(update))
                    .route(web::delete().to(delete)),
            ),
    );
}

fn email_taken(_: &dyn diesel::result::DatabaseErrorInformation) -> ApiError {
    ApiError::builder(StatusCode::CONFLICT)
        .title("Email Taken")
        .message("This email is already in use by another user")
        .finish()
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
}

fn retrieve_user(user_repository: &UserRepositoryImpl, user_id: i32) -> Result<User, DacroqApiError> {
    user_repository
        .find_by_id(user_id)?
        .ok_or_else(|| not_found("User id not found"))
}

async fn list(
    auth: Auth,
    query: actix_web_validator::Query<ListUsersRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    auth.require_admin()?;
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let user_repository = UserRepositoryImpl::new(&database);
        let page = user_repository.find_page(query.limit, query.offset, query.search.as_deref())?;
        Ok(ListUsersResponse {
            items: page
                .results
                .into_iter()
                .map(|(user, tests)| user_summary(user, tests))
                .collect(),
            total: page.count,
        })
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn create(
    auth: Auth,
    json: actix_web_validator::Json<CreateUserRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    auth.require_admin()?;
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let user_repository = UserRepositoryImpl::new(&database);
        let user = user_repository
            .insert(&NewUser {
                name: json.name.clone(),
                email: json.email.to_ascii_lowercase(),
                password_hash: hash_password(&json.password)?,
                role: json.role.to_string(),
                enabled: true,
            })
            .map_unique_violation(email_taken)?;
        log::info!("User {} created by {}", user.id, auth.user.id);
        state
            .changes
            .publish(Collection::Users, user.id, ChangeKind::Created);
        Ok(user_summary(user, 0))
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn get(
    auth: Auth,
    user_id: Path<i32>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    if *user_id != auth.user.id {
        auth.require_admin()?;
    }
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let user_repository = UserRepositoryImpl::new(&database);
        let user = retrieve_user(&user_repository, *user_id)?;
        let tests = user_repository.count_tests(&user)?;
        Ok(user_summary(user, tests))
    })
    .await?
    .map(JsonResponse::json_response)
}

/// Everyone may edit their own name, email and password. Only admins may
/// edit other users, and only admins may change roles or enable flags.
fn check_update_allowed(
    auth: &Auth,
    user_id: i32,
    request: &UpdateUserRequest,
) -> Result<(), DacroqApiError> {
    if auth.role().is_admin() {
        return Ok(());
    }
    if user_id != auth.user.id {
        return Err(forbidden("You may only edit your own account"));
    }
    if request.role.is_some() || request.enabled.is_some() {
        return Err(forbidden("Only administrators may change roles or disable accounts"));
    }
    Ok(())
}

async fn update(
    auth: Auth,
    user_id: Path<i32>,
    json: actix_web_validator::Json<UpdateUserRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    check_update_allowed(&auth, *user_id, &json)?;
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let user_repository = UserRepositoryImpl::new(&database);
        let mut user = retrieve_user(&user_repository, *user_id)?;
        if let Some(name) = &json.name {
            user.name = name.clone();
        }
        if let Some(email) = &json.email {
            user.email = email.to_ascii_lowercase();
        }
        if let Some(password) = &json.password {
            user.password_hash = hash_password(password)?;
        }
        if let Some(role) = json.role {
            user.role = role.to_string();
        }
        if let Some(enabled) = json.enabled {
            user.enabled = enabled;
        }
        user_repository
            .update(&user)
            .map_unique_violation(email_taken)?;
        if json.password.is_some() || json.enabled == Some(false) {
            // Force every other session to log in again
            let session_repository = SessionRepositoryImpl::new(&database);
            for session in session_repository.find_all_belonging_to_user(&user)? {
                if session.id != auth.session.id {
                    session_repository.delete(&session)?;
                }
            }
        }
        state
            .changes
            .publish(Collection::Users, user.id, ChangeKind::Updated);
        let tests = user_repository.count_tests(&user)?;
        Ok(user_summary(user, tests))
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn delete(
    auth: Auth,
    user_id: Path<i32>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    auth.require_admin()?;
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let user_repository = UserRepositoryImpl::new(&database);
        let session_repository = SessionRepositoryImpl::new(&database);
        let user = retrieve_user(&user_repository, *user_id)?;
        database.transaction(|| -> diesel::QueryResult<()> {
            session_repository.delete_all_belonging_to(&user)?;
            user_repository.delete(&user)?;
            Ok(())
        })?;
        log::info!("User {} deleted by {}", user.id, auth.user.id);
        state
            .changes
            .publish(Collection::Users, user.id, ChangeKind::Deleted);
        Ok(())
    })
    .await?
    .map(JsonResponse::json_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Session;
    use chrono::Utc;
    use dacroq_model::tests::Role;

    fn auth(id: i32, role: Role) -> Auth {
        Auth {
            session: Session {
                id: 1,
                user_id: id,
                token: "token".into(),
                created: Utc::now(),
                last_used: Utc::now(),
                last_ip: vec![],
                user_agent: "test".into(),
            },
            user: User {
                id,
                name: "Tester".into(),
                email: "tester@example.com".into(),
                password_hash: String::new(),
                role: role.to_string(),
                enabled: true,
                created: Utc::now(),
                last_online: None,
            },
        }
    }

    #[test]
    fn users_edit_own_profile_only() {
        let request = UpdateUserRequest {
            name: Some("New name".into()),
            ..Default::default()
        };
        assert!(check_update_allowed(&auth(3, Role::User), 3, &request).is_ok());
        assert!(check_update_allowed(&auth(3, Role::Moderator), 4, &request).is_err());
    }

    #[test]
    fn only_admins_change_roles() {
        let request = UpdateUserRequest {
            role: Some(Role::Admin),
            ..Default::default()
        };
        assert!(check_update_allowed(&auth(3, Role::User), 3, &request).is_err());
        assert!(check_update_allowed(&auth(1, Role::Admin), 3, &request).is_ok());
    }
}
