//! services/site/src/web/doc.rs
//!
//! The master definition for the OpenAPI specification of the JSON endpoints.

use utoipa::OpenApi;

use crate::web::inventory::{self, VehicleJson};

#[derive(OpenApi)]
#[openapi(
    paths(
        inventory::inventory_json,
    ),
    components(
        schemas(VehicleJson)
    ),
    tags(
        (name = "Inventory", description = "Inventory data used by the vehicle management page.")
    )
)]
pub struct ApiDoc;
