use actix_web::body::BoxBody;
use actix_web::{HttpResponse, ResponseError};
use atende_common::error::ErrorInformation;
use sea_orm::DbErr;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Database(anyhow::Error),
    #[error("chat room {0} not found")]
    NotFound(Uuid),
    #[error("chat room {0} is closed")]
    RoomClosed(Uuid),
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Any(#[from] anyhow::Error),
}

impl From<DbErr> for Error {
    fn from(value: DbErr) -> Self {
        Self::Database(value.into())
    }
}

impl ResponseError for Error {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        match self {
            Self::NotFound(_) => {
                HttpResponse::NotFound().json(ErrorInformation::new("NotFound", self))
            }
            // posting into a closed room is a terminal failure for the request,
            // not a client error with a dedicated status
            Self::RoomClosed(_) => {
                HttpResponse::InternalServerError().json(ErrorInformation::new("RoomClosed", self))
            }
            Self::BadRequest(msg) => {
                HttpResponse::BadRequest().json(ErrorInformation::new("Bad request", msg))
            }
            Self::Database(err) => HttpResponse::InternalServerError()
                .json(ErrorInformation::new("Database error", err)),
            Self::Any(err) => HttpResponse::InternalServerError()
                .json(ErrorInformation::new("System unknown", err)),
        }
    }
}
