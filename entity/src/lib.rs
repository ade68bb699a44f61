pub mod chat_message;
pub mod chat_room;
pub mod room_status;
