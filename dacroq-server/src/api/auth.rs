use crate::api::error::{forbidden, internal_server_error, DacroqApiError};
use crate::database::{
    Session, SessionRepository, SessionRepositoryImpl, User, UserRepository, UserRepositoryImpl,
};
use crate::state::AppState;
use actix_web::dev::{Payload, ServiceRequest};
use actix_web::http::header::{HeaderMap, USER_AGENT};
use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{web, FromRequest, HttpMessage, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use chrono::Utc;
use dacroq_model::tests::Role;
use futures::future::{err, ok, Ready};
use http_api_problem::ApiError;
use rand::RngCore;
use std::net::IpAddr;

pub struct Auth {
    pub session: Session,
    pub user: User,
}

impl Auth {
    pub fn role(&self) -> Role {
        self.user.role()
    }

    pub fn require_admin(&self) -> Result<(), DacroqApiError> {
        if self.role().is_admin() {
            Ok(())
        } else {
            Err(forbidden("Only administrators may do this"))
        }
    }

    pub fn require_moderator(&self) -> Result<(), DacroqApiError> {
        if self.role().is_moderator() {
            Ok(())
        } else {
            Err(forbidden("Only moderators may do this"))
        }
    }

    /// Authors may always change their own content, moderators may change anyone's.
    pub fn require_owner_or_moderator(&self, owner: Option<i32>) -> Result<(), DacroqApiError> {
        if owner == Some(self.user.id) || self.role().is_moderator() {
            Ok(())
        } else {
            Err(forbidden("Only the author or a moderator may do this"))
        }
    }
}

pub fn get_user_agent(map: &HeaderMap) -> Result<String, ApiError> {
    map.get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|u| {
            let mut u = u.to_owned();
            u.truncate(512);
            u
        })
        .ok_or_else(|| {
            ApiError::builder(StatusCode::BAD_REQUEST)
                .title("Bad Agent")
                .message("A valid user agent header is required")
                .finish()
        })
}

/// Best effort client address, honouring forwarding headers.
pub fn get_ip_address(info: &actix_web::dev::ConnectionInfo) -> Result<IpAddr, ApiError> {
    info.realip_remote_addr()
        .and_then(|addr| {
            addr.parse::<IpAddr>().ok().or_else(|| {
                addr.parse::<std::net::SocketAddr>()
                    .ok()
                    .map(|socket| socket.ip())
            })
        })
        .ok_or_else(|| {
            ApiError::builder(StatusCode::BAD_REQUEST)
                .message("Unable to determine client address")
                .finish()
        })
}

pub fn encode_ip_address(ip: &IpAddr) -> Result<Vec<u8>, DacroqApiError> {
    bincode::serialize(ip).map_err(|e| internal_server_error("IpEncoding", e))
}

pub fn generate_token(user: &User) -> String {
    const TOKEN_LENGTH_BYTES: usize = 32;
    let mut buf = [0u8; TOKEN_LENGTH_BYTES];
    rand::thread_rng().fill_bytes(&mut buf);
    format!("{}_{}", user.id, base64::encode_config(&buf, base64::URL_SAFE_NO_PAD))
}

pub async fn authenticator(
    req: ServiceRequest,
    auth: BearerAuth,
) -> Result<ServiceRequest, actix_web::Error> {
    let state = req
        .app_data::<Data<AppState>>()
        .ok_or_else(|| internal_server_error("Auth", "AppState missing"))?
        .clone();
    let ip_addr = get_ip_address(&req.connection_info()).map_err(DacroqApiError::from)?;
    let user_agent = get_user_agent(req.headers()).map_err(DacroqApiError::from)?;
    let token = auth.token().to_owned();
    let result = web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let session_repository = SessionRepositoryImpl::new(&database);
        let user_repository = UserRepositoryImpl::new(&database);
        let (mut session, mut user) =
            session_repository.find_by_token(&token)?.ok_or_else(|| {
                ApiError::builder(StatusCode::UNAUTHORIZED)
                    .message("Invalid session token")
                    .finish()
            })?;
        if !user.enabled {
            return Err(ApiError::builder(StatusCode::UNAUTHORIZED)
                .message("This account has been disabled")
                .finish()
                .into());
        }
        let now = Utc::now();
        session.last_ip = encode_ip_address(&ip_addr)?;
        session.user_agent = user_agent;
        session.last_used = now;
        session_repository.update(&session)?;
        user_repository.touch_last_online(&user, now)?;
        user.last_online = Some(now);
        Ok(Auth { session, user })
    })
    .await
    .map_err(DacroqApiError::from)?;
    result
        .map(|auth| {
            req.extensions_mut().insert(auth);
            req
        })
        .map_err(|e| e.into())
}

impl FromRequest for Auth {
    type Error = DacroqApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions_mut().remove::<Auth>() {
            ok(user)
        } else {
            err(internal_server_error("Auth", "Missing Auth Data"))
        }
    }
}
