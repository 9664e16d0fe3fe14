use crate::api::auth::{authenticator, Auth};
use crate::api::error::{not_found, DacroqApiError};
use crate::api::{api_resource, api_scope, JsonResponse};
use crate::database::{
    NewPost, NewReply, Post, PostEdit, PostRepository, PostRepositoryImpl, ReplyRepository,
    ReplyRepositoryImpl,
};
use crate::state::AppState;
use actix_web::web::{Data, Path, ServiceConfig};
use actix_web::{web, HttpResponse};
use actix_web_httpauth::middleware::HttpAuthentication;
use dacroq_model::api_v1::{
    ChangeKind, Collection, CreatePostRequest, CreateReplyRequest, ListPostsRequest,
    ListPostsResponse, PinPostRequest, PostSummary, ReplySummary, UpdatePostRequest,
};
use std::convert::TryFrom;

pub fn configure(v1: &mut ServiceConfig) {
    v1.service(
        api_scope("posts")
            .wrap(HttpAuthentication::with_fn(authenticator))
            .service(
                api_resource("")
                    .route(web::get().to(list))
                    .route(web::post().to(create)),
            )
            .service(
                api_resource("{post_id}")
                    .route(web::get().to(get))
                    .route(web::put().to(update))
                    .route(web::delete().to(delete)),
            )
            .service(api_resource("{post_id}/pin").route(web::put().to(pin)))
            .service(
                api_resource("{post_id}/replies")
                    .route(web::get().to(list_replies))
                    .route(web::post().to(create_reply)),
            )
            .service(
                api_resource("{post_id}/replies/{reply_id}")
                    .route(web::delete().to(delete_reply)),
            ),
    );
}

fn retrieve_post(repository: &PostRepositoryImpl, post_id: i32) -> Result<Post, DacroqApiError> {
    repository
        .find_by_id(post_id)?
        .ok_or_else(|| not_found("Post id not found"))
}

async fn list(
    _auth: Auth,
    query: actix_web_validator::Query<ListPostsRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = PostRepositoryImpl::new(&database);
        let page = repository.find_page(query.limit, query.offset)?;
        Ok(ListPostsResponse {
            items: page
                .results
                .into_iter()
                .map(PostSummary::try_from)
                .collect::<Result<_, _>>()?,
            total: page.count,
        })
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn create(
    auth: Auth,
    json: actix_web_validator::Json<CreatePostRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = PostRepositoryImpl::new(&database);
        let json = json.into_inner();
        let post = repository.insert(&NewPost {
            title: json.title,
            content: json.content,
            author_id: Some(auth.user.id),
            author: serde_json::to_value(auth.user.snapshot())?,
        })?;
        state
            .changes
            .publish(Collection::Posts, post.id, ChangeKind::Created);
        PostSummary::try_from(post)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn get(
    _auth: Auth,
    post_id: Path<i32>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = PostRepositoryImpl::new(&database);
        let post = repository
            .record_view(*post_id)?
            .ok_or_else(|| not_found("Post id not found"))?;
        PostSummary::try_from(post)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn update(
    auth: Auth,
    post_id: Path<i32>,
    json: actix_web_validator::Json<UpdatePostRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = PostRepositoryImpl::new(&database);
        let post = retrieve_post(&repository, *post_id)?;
        auth.require_owner_or_moderator(post.author_id)?;
        let json = json.into_inner();
        let edit = PostEdit {
            title: json.title,
            content: json.content,
            answered: json.answered,
        };
        let post = repository.apply_edit(&post, &edit)?;
        state
            .changes
            .publish(Collection::Posts, post.id, ChangeKind::Updated);
        PostSummary::try_from(post)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn delete(
    auth: Auth,
    post_id: Path<i32>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = PostRepositoryImpl::new(&database);
        let post = retrieve_post(&repository, *post_id)?;
        auth.require_owner_or_moderator(post.author_id)?;
        repository.delete_with_replies(&post)?;
        log::info!("Post {} deleted by user {}", post.id, auth.user.id);
        state
            .changes
            .publish(Collection::Posts, post.id, ChangeKind::Deleted);
        Ok(())
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn pin(
    auth: Auth,
    post_id: Path<i32>,
    json: actix_web_validator::Json<PinPostRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    auth.require_moderator()?;
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let repository = PostRepositoryImpl::new(&database);
        let post = retrieve_post(&repository, *post_id)?;
        let post = repository.set_pinned(&post, json.pinned)?;
        state
            .changes
            .publish(Collection::Posts, post.id, ChangeKind::Updated);
        PostSummary::try_from(post)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn list_replies(
    _auth: Auth,
    post_id: Path<i32>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let post = retrieve_post(&PostRepositoryImpl::new(&database), *post_id)?;
        let replies = ReplyRepositoryImpl::new(&database)
            .find_all_belonging_to(&post)?
            .into_iter()
            .map(ReplySummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(replies)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn create_reply(
    auth: Auth,
    post_id: Path<i32>,
    json: actix_web_validator::Json<CreateReplyRequest>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let post = retrieve_post(&PostRepositoryImpl::new(&database), *post_id)?;
        let reply = ReplyRepositoryImpl::new(&database).insert_counted(
            &post,
            &NewReply {
                post_id: post.id,
                content: json.into_inner().content,
                author_id: Some(auth.user.id),
                author: serde_json::to_value(auth.user.snapshot())?,
            },
        )?;
        state
            .changes
            .publish(Collection::Posts, post.id, ChangeKind::Updated);
        ReplySummary::try_from(reply)
    })
    .await?
    .map(JsonResponse::json_response)
}

async fn delete_reply(
    auth: Auth,
    path: Path<(i32, i32)>,
    state: Data<AppState>,
) -> Result<HttpResponse, DacroqApiError> {
    let (post_id, reply_id) = path.into_inner();
    web::block(move || -> Result<_, DacroqApiError> {
        let database = state.database()?;
        let post = retrieve_post(&PostRepositoryImpl::new(&database), post_id)?;
        let repository = ReplyRepositoryImpl::new(&database);
        let reply = repository
            .find_belonging_to(&post, reply_id)?
            .ok_or_else(|| not_found("Reply id not found"))?;
        auth.require_owner_or_moderator(reply.author_id)?;
        repository.delete_counted(&post, &reply)?;
        state
            .changes
            .publish(Collection::Posts, post.id, ChangeKind::Updated);
        Ok(())
    })
    .await?
    .map(JsonResponse::json_response)
}
