use actix_http::Request;
use actix_web::{
    dev::{Service, ServiceResponse},
    App, Error,
};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::future::Future;
use utoipa_actix_web::AppExt;

/// A trait wrapping an `impl Service` in a way that we can pass it as a reference.
pub trait CallService {
    fn call_service(&self, s: Request) -> impl Future<Output = ServiceResponse>;
    fn call_and_read_body(&self, r: Request) -> impl Future<Output = Bytes>;
    fn call_and_read_body_json<T: DeserializeOwned>(&self, r: Request) -> impl Future<Output = T>;
}

impl<S> CallService for S
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    async fn call_service(&self, r: Request) -> ServiceResponse {
        actix_web::test::call_service(self, r).await
    }

    async fn call_and_read_body(&self, r: Request) -> Bytes {
        actix_web::test::call_and_read_body(self, r).await
    }

    async fn call_and_read_body_json<T: DeserializeOwned>(&self, r: Request) -> T {
        actix_web::test::call_and_read_body_json(self, r).await
    }
}

/// Initialize an in-process application from the provided endpoints.
pub async fn caller<F>(configure: F) -> anyhow::Result<impl CallService>
where
    F: FnOnce(&mut utoipa_actix_web::service_config::ServiceConfig),
{
    Ok(actix_web::test::init_service(
        App::new().into_utoipa_app().configure(configure).into_app(),
    )
    .await)
}
