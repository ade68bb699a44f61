use atende_entity::{chat_message, chat_room, room_status::RoomStatus};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Wire shape of a chat room.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRoom {
    pub id: Uuid,
    /// The party which requested support; not necessarily a registered account
    pub customer_id: String,
    /// The admin handling the room, once one engaged
    pub admin_id: Option<String>,
    pub status: RoomStatus,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

impl From<chat_room::Model> for ChatRoom {
    fn from(room: chat_room::Model) -> Self {
        Self {
            id: room.id,
            customer_id: room.customer_id,
            admin_id: room.admin_id,
            status: room.status,
            created_at: room.created_at,
        }
    }
}

/// Wire shape of a chat message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub room_id: Uuid,
    /// A real actor identifier, or `"system"` for automated entries
    pub sender_id: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
}

impl From<chat_message::Model> for ChatMessage {
    fn from(message: chat_message::Model) -> Self {
        Self {
            id: message.id,
            room_id: message.room_id,
            sender_id: message.sender_id,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

/// Outcome of an idle-room reclamation sweep.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    /// Number of rooms flipped to `closed`
    pub cleaned: usize,
    /// The rooms which were closed, in scan order
    pub rooms: Vec<ChatRoom>,
}
