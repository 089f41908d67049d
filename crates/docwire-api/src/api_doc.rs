//! OpenAPI document definition.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::send_pdf::send_pdf,
        crate::handlers::download::download_document,
        crate::handlers::health::health_check,
    ),
    components(schemas(
        docwire_core::models::DeliveryReceipt,
        crate::error::ErrorResponse,
        crate::handlers::health::HealthResponse,
    )),
    tags(
        (name = "delivery", description = "PDF upload, WhatsApp dispatch, and grant-based downloads"),
        (name = "health", description = "Service health"),
    ),
    info(
        title = "docwire API",
        description = "Upload a PDF and deliver it to a WhatsApp number via the Exotel gateway."
    )
)]
pub struct ApiDoc;
