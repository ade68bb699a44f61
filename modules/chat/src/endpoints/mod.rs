
use crate::{
    model::{ChatMessage, ChatRoom, SweepSummary},
    service::ChatService,
};
use actix_web::{get, patch, post, web, HttpResponse, Responder};
use atende_common::db::Database;
use atende_entity::room_status::RoomStatus;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Sweeps default to this when the request does not say otherwise.
const DEFAULT_INACTIVE_MINUTES: u64 = 30;

/// Mount the chat API.
///
/// The fixed-segment routes must be registered ahead of the `{room_id}`
/// routes: actix-web resolves routes in registration order, and
/// `/chat/rooms/waiting` must never bind `room_id = "waiting"`.
pub fn configure(config: &mut utoipa_actix_web::service_config::ServiceConfig, db: Database) {
    let service = ChatService::new();
    config
        .app_data(web::Data::new(service))
        .app_data(web::Data::new(db))
        .service(open_room)
        .service(post_message)
        .service(waiting_rooms)
        .service(filter_rooms)
        .service(all_rooms)
        .service(clean_inactive)
        .service(room_messages)
        .service(reopen_room)
        .service(update_room_status);
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenRoomRequest {
    pub customer_id: String,
}

#[utoipa::path(
    tag = "chat",
    operation_id = "openRoom",
    request_body = OpenRoomRequest,
    responses(
        (status = 200, description = "The already open, or newly created, room", body = ChatRoom),
    ),
)]
#[post("/chat/rooms")]
/// Open a room for a customer, or return the one already open
pub async fn open_room(
    service: web::Data<ChatService>,
    db: web::Data<Database>,
    web::Json(request): web::Json<OpenRoomRequest>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(service.open_room(&request.customer_id, db.get_ref()).await?))
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequest {
    pub room_id: Uuid,
    pub sender_id: String,
    pub content: String,
}

#[utoipa::path(
    tag = "chat",
    operation_id = "postMessage",
    request_body = PostMessageRequest,
    responses(
        (status = 200, description = "The stored message", body = ChatMessage),
        (status = 400, description = "Empty message content"),
        (status = 404, description = "Matching room not found"),
    ),
)]
#[post("/chat/messages")]
/// Post a message into an open room
pub async fn post_message(
    service: web::Data<ChatService>,
    db: web::Data<Database>,
    web::Json(request): web::Json<PostMessageRequest>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(
        service
            .post_message(
                request.room_id,
                &request.sender_id,
                &request.content,
                db.get_ref(),
            )
            .await?,
    ))
}

#[utoipa::path(
    tag = "chat",
    operation_id = "listWaitingRooms",
    responses(
        (status = 200, description = "Rooms waiting for or receiving support", body = [ChatRoom]),
    ),
)]
#[get("/chat/rooms/waiting")]
/// List rooms waiting for or receiving support
pub async fn waiting_rooms(
    service: web::Data<ChatService>,
    db: web::Data<Database>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(service.fetch_open_rooms(db.get_ref()).await?))
}

#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RoomFilterQuery {
    /// Constrain to a single lifecycle state
    pub status: Option<RoomStatus>,
    /// Constrain to rooms handled by this admin
    pub admin_id: Option<String>,
}

#[utoipa::path(
    tag = "chat",
    operation_id = "filterRooms",
    params(RoomFilterQuery),
    responses(
        (status = 200, description = "Matching rooms", body = [ChatRoom]),
    ),
)]
#[get("/chat/rooms/filter")]
/// List rooms by status and/or assigned admin
pub async fn filter_rooms(
    service: web::Data<ChatService>,
    db: web::Data<Database>,
    web::Query(filter): web::Query<RoomFilterQuery>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(
        service
            .fetch_rooms(filter.status, filter.admin_id.as_deref(), db.get_ref())
            .await?,
    ))
}

#[utoipa::path(
    tag = "chat",
    operation_id = "listAllRooms",
    responses(
        (status = 200, description = "All rooms", body = [ChatRoom]),
    ),
)]
#[get("/chat/rooms/all")]
/// List every room, regardless of state
pub async fn all_rooms(
    service: web::Data<ChatService>,
    db: web::Data<Database>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(service.fetch_all_rooms(db.get_ref()).await?))
}

#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanInactiveRequest {
    /// Inactivity threshold in minutes, 30 when absent
    #[serde(default)]
    pub inactive_minutes: Option<u64>,
}

#[utoipa::path(
    tag = "chat",
    operation_id = "cleanInactiveRooms",
    request_body = CleanInactiveRequest,
    responses(
        (status = 200, description = "Summary of the sweep", body = SweepSummary),
    ),
)]
#[post("/chat/rooms/clean-inactive")]
/// Close open rooms without recent activity
pub async fn clean_inactive(
    service: web::Data<ChatService>,
    db: web::Data<Database>,
    request: Option<web::Json<CleanInactiveRequest>>,
) -> actix_web::Result<impl Responder> {
    let inactive_minutes = request
        .and_then(|request| request.inactive_minutes)
        .unwrap_or(DEFAULT_INACTIVE_MINUTES);

    Ok(HttpResponse::Ok().json(
        service
            .clean_inactive_rooms(inactive_minutes, db.get_ref())
            .await?,
    ))
}

#[utoipa::path(
    tag = "chat",
    operation_id = "listRoomMessages",
    params(
        ("room_id", Path, description = "Opaque ID of the room")
    ),
    responses(
        (status = 200, description = "Message history, oldest first", body = [ChatMessage]),
    ),
)]
#[get("/chat/rooms/{room_id}/messages")]
/// The message history of a room; empty for an unknown room
pub async fn room_messages(
    service: web::Data<ChatService>,
    db: web::Data<Database>,
    room_id: web::Path<Uuid>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(service.fetch_messages(*room_id, db.get_ref()).await?))
}

#[utoipa::path(
    tag = "chat",
    operation_id = "reopenRoom",
    params(
        ("room_id", Path, description = "Opaque ID of the room")
    ),
    responses(
        (status = 200, description = "The reopened room", body = ChatRoom),
        (status = 404, description = "Matching room not found"),
    ),
)]
#[patch("/chat/rooms/{room_id}/reopen")]
/// Put a room back into the waiting state
pub async fn reopen_room(
    service: web::Data<ChatService>,
    db: web::Data<Database>,
    room_id: web::Path<Uuid>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(service.reopen_room(*room_id, db.get_ref()).await?))
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoomStatusRequest {
    /// The target state, `active` or `closed`
    pub status: RoomStatus,
    /// The admin performing the transition
    pub admin_id: String,
}

#[utoipa::path(
    tag = "chat",
    operation_id = "updateRoomStatus",
    params(
        ("room_id", Path, description = "Opaque ID of the room")
    ),
    request_body = UpdateRoomStatusRequest,
    responses(
        (status = 200, description = "The transitioned room", body = ChatRoom),
        (status = 400, description = "`waiting` is not a valid target state"),
        (status = 404, description = "Matching room not found"),
    ),
)]
#[patch("/chat/rooms/{room_id}/status")]
/// Transition a room to `active` or `closed`
pub async fn update_room_status(
    service: web::Data<ChatService>,
    db: web::Data<Database>,
    room_id: web::Path<Uuid>,
    web::Json(request): web::Json<UpdateRoomStatusRequest>,
) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(
        service
            .update_room_status(*room_id, request.status, &request.admin_id, db.get_ref())
            .await?,
    ))
}
