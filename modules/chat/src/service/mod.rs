use crate::{
    model::{ChatMessage, ChatRoom, SweepSummary},
    Error,
};
use atende_entity::{
    chat_message::{self, SYSTEM_SENDER},
    chat_room,
    room_status::RoomStatus,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use time::{Duration, OffsetDateTime};
use tracing::instrument;
use uuid::Uuid;

/// Posted into every freshly created room.
pub const WELCOME_MESSAGE: &str = "Em alguns momentos um administrador entrará em contato.";

/// Posted when a room is reopened.
pub const REOPENED_MESSAGE: &str = "Conversa reaberta. Aguardando atendimento...";

fn admin_joined_message(admin_id: &str) -> String {
    format!("{admin_id} entrou na conversa")
}

fn closed_message(admin_id: &str) -> String {
    format!("O atendimento foi encerrado por {admin_id}. Obrigado pelo contato!")
}

#[derive(Clone, Debug, Default)]
pub struct ChatService {}

impl ChatService {
    pub fn new() -> Self {
        Self {}
    }

    /// Return the most recently created open room of the customer, or create
    /// a new one together with its welcome message.
    #[instrument(skip(self, connection), err)]
    pub async fn open_room<C: ConnectionTrait>(
        &self,
        customer_id: &str,
        connection: &C,
    ) -> Result<ChatRoom, Error> {
        if let Some(room) = chat_room::Entity::find()
            .filter(chat_room::Column::CustomerId.eq(customer_id))
            .filter(chat_room::Column::Status.is_in([RoomStatus::Waiting, RoomStatus::Active]))
            .order_by_desc(chat_room::Column::CreatedAt)
            .one(connection)
            .await?
        {
            return Ok(room.into());
        }

        let room = chat_room::ActiveModel {
            id: Set(Uuid::new_v4()),
            customer_id: Set(customer_id.to_string()),
            admin_id: Set(None),
            status: Set(RoomStatus::Waiting),
            created_at: Set(OffsetDateTime::now_utc()),
        }
        .insert(connection)
        .await?;

        tracing::info!(room = %room.id, customer = customer_id, "opened chat room");

        self.append_system_message(room.id, WELCOME_MESSAGE, connection)
            .await?;

        Ok(room.into())
    }

    /// Post a message into an open room.
    ///
    /// The room must exist and must not be closed. There is no automatic
    /// status change when an admin posts a first reply.
    #[instrument(skip(self, connection, content), err)]
    pub async fn post_message<C: ConnectionTrait>(
        &self,
        room_id: Uuid,
        sender_id: &str,
        content: &str,
        connection: &C,
    ) -> Result<ChatMessage, Error> {
        if content.trim().is_empty() {
            return Err(Error::BadRequest(
                "message content must not be empty".into(),
            ));
        }

        let room = chat_room::Entity::find_by_id(room_id)
            .one(connection)
            .await?
            .ok_or(Error::NotFound(room_id))?;

        if room.status == RoomStatus::Closed {
            return Err(Error::RoomClosed(room_id));
        }

        let message = chat_message::ActiveModel {
            id: Set(Uuid::new_v4()),
            room_id: Set(room_id),
            sender_id: Set(sender_id.to_string()),
            content: Set(content.to_string()),
            created_at: Set(OffsetDateTime::now_utc()),
        }
        .insert(connection)
        .await?;

        Ok(message.into())
    }

    /// The message history of a room, oldest first.
    ///
    /// A room that does not (or no longer) exist simply has no history; this
    /// is deliberately not an error.
    pub async fn fetch_messages<C: ConnectionTrait>(
        &self,
        room_id: Uuid,
        connection: &C,
    ) -> Result<Vec<ChatMessage>, Error> {
        Ok(chat_message::Entity::find()
            .filter(chat_message::Column::RoomId.eq(room_id))
            .order_by_asc(chat_message::Column::CreatedAt)
            .all(connection)
            .await?
            .into_iter()
            .map(ChatMessage::from)
            .collect())
    }

    /// All rooms waiting for or receiving support, newest first.
    pub async fn fetch_open_rooms<C: ConnectionTrait>(
        &self,
        connection: &C,
    ) -> Result<Vec<ChatRoom>, Error> {
        Ok(chat_room::Entity::find()
            .filter(chat_room::Column::Status.is_in([RoomStatus::Waiting, RoomStatus::Active]))
            .order_by_desc(chat_room::Column::CreatedAt)
            .all(connection)
            .await?
            .into_iter()
            .map(ChatRoom::from)
            .collect())
    }

    /// Rooms matching the given filters, newest first. An absent filter does
    /// not constrain.
    pub async fn fetch_rooms<C: ConnectionTrait>(
        &self,
        status: Option<RoomStatus>,
        admin_id: Option<&str>,
        connection: &C,
    ) -> Result<Vec<ChatRoom>, Error> {
        let mut query = chat_room::Entity::find();

        if let Some(status) = status {
            query = query.filter(chat_room::Column::Status.eq(status));
        }

        if let Some(admin_id) = admin_id {
            query = query.filter(chat_room::Column::AdminId.eq(admin_id));
        }

        Ok(query
            .order_by_desc(chat_room::Column::CreatedAt)
            .all(connection)
            .await?
            .into_iter()
            .map(ChatRoom::from)
            .collect())
    }

    /// Every room, regardless of state, newest first.
    pub async fn fetch_all_rooms<C: ConnectionTrait>(
        &self,
        connection: &C,
    ) -> Result<Vec<ChatRoom>, Error> {
        Ok(chat_room::Entity::find()
            .order_by_desc(chat_room::Column::CreatedAt)
            .all(connection)
            .await?
            .into_iter()
            .map(ChatRoom::from)
            .collect())
    }

    /// Transition a room to `active` or `closed`, recording the acting admin.
    ///
    /// Entering `active` from `waiting` announces the admin in the room;
    /// entering `closed` from any state announces the closure. The acting
    /// admin overwrites any previously recorded one, also on close.
    #[instrument(skip(self, connection), err)]
    pub async fn update_room_status<C: ConnectionTrait + TransactionTrait>(
        &self,
        room_id: Uuid,
        status: RoomStatus,
        admin_id: &str,
        connection: &C,
    ) -> Result<ChatRoom, Error> {
        if status == RoomStatus::Waiting {
            return Err(Error::BadRequest(
                "a room can only be set to active or closed".into(),
            ));
        }

        let tx = connection.begin().await?;

        // the row lock keeps a concurrent transition from deciding on a stale
        // previous status
        let room = chat_room::Entity::find_by_id(room_id)
            .lock_exclusive()
            .one(&tx)
            .await?
            .ok_or(Error::NotFound(room_id))?;

        let previous = room.status;

        tracing::info!(room = %room_id, %previous, next = %status, admin = admin_id, "room status transition");

        if previous == RoomStatus::Waiting && status == RoomStatus::Active {
            self.append_system_message(room_id, &admin_joined_message(admin_id), &tx)
                .await?;
        }

        if status == RoomStatus::Closed {
            self.append_system_message(room_id, &closed_message(admin_id), &tx)
                .await?;
        }

        let mut update: chat_room::ActiveModel = room.into();
        update.status = Set(status);
        update.admin_id = Set(Some(admin_id.to_string()));
        let room = update.update(&tx).await?;

        tx.commit().await?;

        Ok(room.into())
    }

    /// Put a room back into `waiting`, clearing the assigned admin.
    ///
    /// Works from any prior state; reopening an already waiting room only
    /// adds another system message.
    #[instrument(skip(self, connection), err)]
    pub async fn reopen_room<C: ConnectionTrait + TransactionTrait>(
        &self,
        room_id: Uuid,
        connection: &C,
    ) -> Result<ChatRoom, Error> {
        let tx = connection.begin().await?;

        let room = chat_room::Entity::find_by_id(room_id)
            .lock_exclusive()
            .one(&tx)
            .await?
            .ok_or(Error::NotFound(room_id))?;

        tracing::info!(room = %room_id, previous = %room.status, "reopening room");

        self.append_system_message(room_id, REOPENED_MESSAGE, &tx)
            .await?;

        let mut update: chat_room::ActiveModel = room.into();
        update.status = Set(RoomStatus::Waiting);
        update.admin_id = Set(None);
        let room = update.update(&tx).await?;

        tx.commit().await?;

        Ok(room.into())
    }

    /// Close open rooms which have seen no activity for the given number of
    /// minutes.
    ///
    /// Candidates are open rooms *created* before the cutoff; of those, only
    /// rooms whose latest message is also older than the cutoff (or which
    /// have none at all) are closed. A recent message keeps an old room
    /// alive, and a freshly created silent room is not a candidate yet.
    #[instrument(skip(self, connection), err)]
    pub async fn clean_inactive_rooms<C: ConnectionTrait + TransactionTrait>(
        &self,
        inactive_minutes: u64,
        connection: &C,
    ) -> Result<SweepSummary, Error> {
        let cutoff = OffsetDateTime::now_utc() - Duration::minutes(inactive_minutes as i64);

        let candidates = chat_room::Entity::find()
            .filter(chat_room::Column::Status.is_in([RoomStatus::Waiting, RoomStatus::Active]))
            .filter(chat_room::Column::CreatedAt.lt(cutoff))
            .all(connection)
            .await?;

        let scanned = candidates.len();
        let mut stale = Vec::new();

        for room in candidates {
            let last_message = chat_message::Entity::find()
                .filter(chat_message::Column::RoomId.eq(room.id))
                .order_by_desc(chat_message::Column::CreatedAt)
                .one(connection)
                .await?;

            match last_message {
                Some(message) if message.created_at >= cutoff => {}
                _ => stale.push(room),
            }
        }

        tracing::info!(scanned, stale = stale.len(), "idle room sweep");

        // one transaction, but each room remains an independent row update
        let tx = connection.begin().await?;
        let mut rooms = Vec::with_capacity(stale.len());
        for room in stale {
            let mut update: chat_room::ActiveModel = room.into();
            update.status = Set(RoomStatus::Closed);
            rooms.push(ChatRoom::from(update.update(&tx).await?));
        }
        tx.commit().await?;

        Ok(SweepSummary {
            cleaned: rooms.len(),
            rooms,
        })
    }

    async fn append_system_message<C: ConnectionTrait>(
        &self,
        room_id: Uuid,
        content: &str,
        connection: &C,
    ) -> Result<chat_message::Model, Error> {
        Ok(chat_message::ActiveModel {
            id: Set(Uuid::new_v4()),
            room_id: Set(room_id),
            sender_id: Set(SYSTEM_SENDER.to_string()),
            content: Set(content.to_string()),
            created_at: Set(OffsetDateTime::now_utc()),
        }
        .insert(connection)
        .await?)
    }
}

#[cfg(test)]
mod test;
