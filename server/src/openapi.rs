use utoipa::OpenApi;

/// Base document; the endpoint paths and schemas are collected at mount time.
#[derive(OpenApi)]
#[openapi(info(
    title = "Atende API",
    description = "Customer support chat for the storefront",
))]
pub struct ApiDoc;
