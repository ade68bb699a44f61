use super::{ChatService, REOPENED_MESSAGE, WELCOME_MESSAGE};
use crate::error::Error;
use atende_entity::{
    chat_message::{self, SYSTEM_SENDER},
    chat_room,
    room_status::RoomStatus,
};
use atende_test_context::AtendeContext;
use sea_orm::{ActiveModelTrait, Set};
use test_context::test_context;
use test_log::test;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Insert a room directly, bypassing the service, so `created_at` can lie in
/// the past.
async fn seed_room(
    ctx: &AtendeContext,
    customer_id: &str,
    status: RoomStatus,
    age: Duration,
) -> Result<chat_room::Model, anyhow::Error> {
    Ok(chat_room::ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_id: Set(customer_id.to_string()),
        admin_id: Set(None),
        status: Set(status),
        created_at: Set(OffsetDateTime::now_utc() - age),
    }
    .insert(&ctx.db)
    .await?)
}

/// Insert a message directly, with a backdated timestamp.
async fn seed_message(
    ctx: &AtendeContext,
    room_id: Uuid,
    content: &str,
    age: Duration,
) -> Result<chat_message::Model, anyhow::Error> {
    Ok(chat_message::ActiveModel {
        id: Set(Uuid::new_v4()),
        room_id: Set(room_id),
        sender_id: Set("customer".to_string()),
        content: Set(content.to_string()),
        created_at: Set(OffsetDateTime::now_utc() - age),
    }
    .insert(&ctx.db)
    .await?)
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn open_room_creates_room_and_welcome(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let room = service.open_room("alice", &ctx.db).await?;
    assert_eq!(room.status, RoomStatus::Waiting);
    assert_eq!(room.admin_id, None);

    let messages = service.fetch_messages(room.id, &ctx.db).await?;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender_id, SYSTEM_SENDER);
    assert_eq!(messages[0].content, WELCOME_MESSAGE);

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn open_room_returns_existing_open_room(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let first = service.open_room("alice", &ctx.db).await?;
    let second = service.open_room("alice", &ctx.db).await?;
    assert_eq!(first.id, second.id);

    // no second room, no second welcome message
    assert_eq!(service.fetch_all_rooms(&ctx.db).await?.len(), 1);
    assert_eq!(service.fetch_messages(first.id, &ctx.db).await?.len(), 1);

    // an active room also counts as open
    service
        .update_room_status(first.id, RoomStatus::Active, "bob", &ctx.db)
        .await?;
    let third = service.open_room("alice", &ctx.db).await?;
    assert_eq!(first.id, third.id);

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn open_room_after_close_creates_a_new_one(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let first = service.open_room("alice", &ctx.db).await?;
    service
        .update_room_status(first.id, RoomStatus::Closed, "bob", &ctx.db)
        .await?;

    let second = service.open_room("alice", &ctx.db).await?;
    assert_ne!(first.id, second.id);
    assert_eq!(second.status, RoomStatus::Waiting);
    assert_eq!(service.fetch_all_rooms(&ctx.db).await?.len(), 2);

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn open_room_picks_most_recent_open_room(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let older = seed_room(ctx, "alice", RoomStatus::Waiting, Duration::minutes(10)).await?;
    let newer = seed_room(ctx, "alice", RoomStatus::Active, Duration::minutes(5)).await?;

    let room = service.open_room("alice", &ctx.db).await?;
    assert_eq!(room.id, newer.id);
    assert_ne!(room.id, older.id);

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn post_message_appends_in_order(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let room = service.open_room("alice", &ctx.db).await?;
    service
        .post_message(room.id, "alice", "hello?", &ctx.db)
        .await?;
    service
        .post_message(room.id, "alice", "anyone there?", &ctx.db)
        .await?;

    let messages = service.fetch_messages(room.id, &ctx.db).await?;
    let contents = messages
        .iter()
        .map(|message| message.content.as_str())
        .collect::<Vec<_>>();
    assert_eq!(contents, [WELCOME_MESSAGE, "hello?", "anyone there?"]);

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn post_message_rejects_unknown_room(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let result = service
        .post_message(Uuid::new_v4(), "alice", "hello?", &ctx.db)
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn post_message_rejects_closed_room(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let room = service.open_room("alice", &ctx.db).await?;
    service
        .update_room_status(room.id, RoomStatus::Closed, "bob", &ctx.db)
        .await?;

    let result = service
        .post_message(room.id, "alice", "too late?", &ctx.db)
        .await;
    assert!(matches!(result, Err(Error::RoomClosed(_))));

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn post_message_rejects_blank_content(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let room = service.open_room("alice", &ctx.db).await?;
    let result = service.post_message(room.id, "alice", "   ", &ctx.db).await;
    assert!(matches!(result, Err(Error::BadRequest(_))));

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn fetch_messages_is_permissive_for_unknown_rooms(
    ctx: &AtendeContext,
) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let messages = service.fetch_messages(Uuid::new_v4(), &ctx.db).await?;
    assert!(messages.is_empty());

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn activation_announces_admin_once(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let room = service.open_room("alice", &ctx.db).await?;

    let room = service
        .update_room_status(room.id, RoomStatus::Active, "bob", &ctx.db)
        .await?;
    assert_eq!(room.status, RoomStatus::Active);
    assert_eq!(room.admin_id.as_deref(), Some("bob"));

    let messages = service.fetch_messages(room.id, &ctx.db).await?;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].sender_id, SYSTEM_SENDER);
    assert_eq!(messages[1].content, "bob entrou na conversa");

    // active -> active says nothing
    service
        .update_room_status(room.id, RoomStatus::Active, "bob", &ctx.db)
        .await?;
    assert_eq!(service.fetch_messages(room.id, &ctx.db).await?.len(), 2);

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn closing_announces_and_records_the_closer(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let room = service.open_room("alice", &ctx.db).await?;
    service
        .update_room_status(room.id, RoomStatus::Active, "bob", &ctx.db)
        .await?;

    // the closer overwrites the previously assigned admin
    let room = service
        .update_room_status(room.id, RoomStatus::Closed, "carol", &ctx.db)
        .await?;
    assert_eq!(room.status, RoomStatus::Closed);
    assert_eq!(room.admin_id.as_deref(), Some("carol"));

    let messages = service.fetch_messages(room.id, &ctx.db).await?;
    assert_eq!(
        messages.last().map(|message| message.content.as_str()),
        Some("O atendimento foi encerrado por carol. Obrigado pelo contato!")
    );

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn closing_straight_from_waiting(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let room = service.open_room("alice", &ctx.db).await?;
    let room = service
        .update_room_status(room.id, RoomStatus::Closed, "bob", &ctx.db)
        .await?;
    assert_eq!(room.status, RoomStatus::Closed);

    // welcome plus closure, no join message
    let messages = service.fetch_messages(room.id, &ctx.db).await?;
    assert_eq!(messages.len(), 2);
    assert!(messages[1].content.starts_with("O atendimento foi encerrado"));

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn waiting_is_not_a_valid_target_state(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let room = service.open_room("alice", &ctx.db).await?;
    let result = service
        .update_room_status(room.id, RoomStatus::Waiting, "bob", &ctx.db)
        .await;
    assert!(matches!(result, Err(Error::BadRequest(_))));

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn transition_on_unknown_room_fails(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let result = service
        .update_room_status(Uuid::new_v4(), RoomStatus::Active, "bob", &ctx.db)
        .await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    let result = service.reopen_room(Uuid::new_v4(), &ctx.db).await;
    assert!(matches!(result, Err(Error::NotFound(_))));

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn reopen_resets_room(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let room = service.open_room("alice", &ctx.db).await?;
    service
        .update_room_status(room.id, RoomStatus::Active, "bob", &ctx.db)
        .await?;
    service
        .update_room_status(room.id, RoomStatus::Closed, "bob", &ctx.db)
        .await?;

    let room = service.reopen_room(room.id, &ctx.db).await?;
    assert_eq!(room.status, RoomStatus::Waiting);
    assert_eq!(room.admin_id, None);

    let messages = service.fetch_messages(room.id, &ctx.db).await?;
    assert_eq!(
        messages.last().map(|message| message.content.as_str()),
        Some(REOPENED_MESSAGE)
    );

    // reopening a waiting room only adds another system message
    let before = messages.len();
    let room = service.reopen_room(room.id, &ctx.db).await?;
    assert_eq!(room.status, RoomStatus::Waiting);
    assert_eq!(
        service.fetch_messages(room.id, &ctx.db).await?.len(),
        before + 1
    );

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn room_listings_filter_and_order(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let waiting = seed_room(ctx, "alice", RoomStatus::Waiting, Duration::minutes(3)).await?;
    let active = seed_room(ctx, "carla", RoomStatus::Active, Duration::minutes(2)).await?;
    let closed = seed_room(ctx, "dave", RoomStatus::Closed, Duration::minutes(1)).await?;

    service
        .update_room_status(active.id, RoomStatus::Active, "bob", &ctx.db)
        .await?;

    let open = service.fetch_open_rooms(&ctx.db).await?;
    assert_eq!(
        open.iter().map(|room| room.id).collect::<Vec<_>>(),
        [active.id, waiting.id]
    );

    let all = service.fetch_all_rooms(&ctx.db).await?;
    assert_eq!(
        all.iter().map(|room| room.id).collect::<Vec<_>>(),
        [closed.id, active.id, waiting.id]
    );

    let by_status = service
        .fetch_rooms(Some(RoomStatus::Waiting), None, &ctx.db)
        .await?;
    assert_eq!(
        by_status.iter().map(|room| room.id).collect::<Vec<_>>(),
        [waiting.id]
    );

    let by_admin = service.fetch_rooms(None, Some("bob"), &ctx.db).await?;
    assert_eq!(
        by_admin.iter().map(|room| room.id).collect::<Vec<_>>(),
        [active.id]
    );

    let by_both = service
        .fetch_rooms(Some(RoomStatus::Closed), Some("bob"), &ctx.db)
        .await?;
    assert!(by_both.is_empty());

    let unconstrained = service.fetch_rooms(None, None, &ctx.db).await?;
    assert_eq!(unconstrained.len(), 3);

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn sweep_closes_only_truly_idle_rooms(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    // old room, old last message: swept
    let idle = seed_room(ctx, "idle", RoomStatus::Waiting, Duration::minutes(40)).await?;
    seed_message(ctx, idle.id, "anyone?", Duration::minutes(35)).await?;

    // old room, recent message: kept
    let lively = seed_room(ctx, "lively", RoomStatus::Active, Duration::minutes(40)).await?;
    seed_message(ctx, lively.id, "still here", Duration::minutes(2)).await?;

    // young room, no messages at all: not even a candidate
    let young = seed_room(ctx, "young", RoomStatus::Waiting, Duration::minutes(10)).await?;

    // old room without any message: swept
    let silent = seed_room(ctx, "silent", RoomStatus::Active, Duration::minutes(45)).await?;

    // closed rooms are never touched
    let closed = seed_room(ctx, "closed", RoomStatus::Closed, Duration::minutes(90)).await?;

    let summary = service.clean_inactive_rooms(30, &ctx.db).await?;
    assert_eq!(summary.cleaned, 2);

    let mut swept = summary
        .rooms
        .iter()
        .map(|room| room.id)
        .collect::<Vec<_>>();
    swept.sort();
    let mut expected = vec![idle.id, silent.id];
    expected.sort();
    assert_eq!(swept, expected);

    for room in &summary.rooms {
        assert_eq!(room.status, RoomStatus::Closed);
        // reclamation does not pretend an admin closed the room
        assert_eq!(room.admin_id, None);
    }

    let open = service.fetch_open_rooms(&ctx.db).await?;
    let mut open = open.iter().map(|room| room.id).collect::<Vec<_>>();
    open.sort();
    let mut expected = vec![lively.id, young.id];
    expected.sort();
    assert_eq!(open, expected);

    // the closed room is still closed, not "re-closed" into the summary
    assert!(!summary.rooms.iter().any(|room| room.id == closed.id));

    Ok(())
}

#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn sweep_on_quiet_database_is_a_noop(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    let summary = service.clean_inactive_rooms(30, &ctx.db).await?;
    assert_eq!(summary.cleaned, 0);
    assert!(summary.rooms.is_empty());

    Ok(())
}

/// The full customer/admin interplay, end to end.
#[test_context(AtendeContext)]
#[test(actix_web::test)]
async fn full_support_conversation(ctx: &AtendeContext) -> Result<(), anyhow::Error> {
    let service = ChatService::new();

    // alice asks for support
    let room = service.open_room("alice", &ctx.db).await?;
    assert_eq!(room.status, RoomStatus::Waiting);
    assert_eq!(service.fetch_messages(room.id, &ctx.db).await?.len(), 1);

    // bob picks the room up
    let room = service
        .update_room_status(room.id, RoomStatus::Active, "bob", &ctx.db)
        .await?;
    let messages = service.fetch_messages(room.id, &ctx.db).await?;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].content, "bob entrou na conversa");

    // alice says hello
    service
        .post_message(room.id, "alice", "hello", &ctx.db)
        .await?;
    let messages = service.fetch_messages(room.id, &ctx.db).await?;
    assert_eq!(
        messages
            .iter()
            .map(|message| message.content.as_str())
            .collect::<Vec<_>>(),
        [WELCOME_MESSAGE, "bob entrou na conversa", "hello"]
    );

    // bob wraps up
    let room = service
        .update_room_status(room.id, RoomStatus::Closed, "bob", &ctx.db)
        .await?;
    let messages = service.fetch_messages(room.id, &ctx.db).await?;
    assert_eq!(messages.len(), 4);
    assert!(messages[3].content.starts_with("O atendimento foi encerrado"));

    let result = service
        .post_message(room.id, "alice", "wait!", &ctx.db)
        .await;
    assert!(matches!(result, Err(Error::RoomClosed(_))));

    // and alice gets another chance
    let room = service.reopen_room(room.id, &ctx.db).await?;
    assert_eq!(room.status, RoomStatus::Waiting);
    assert_eq!(room.admin_id, None);
    assert_eq!(service.fetch_messages(room.id, &ctx.db).await?.len(), 5);

    service
        .post_message(room.id, "alice", "are you back?", &ctx.db)
        .await?;
    assert_eq!(service.fetch_messages(room.id, &ctx.db).await?.len(), 6);

    Ok(())
}
