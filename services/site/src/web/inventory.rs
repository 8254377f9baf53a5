//! services/site/src/web/inventory.rs
//!
//! Public vehicle listings and the staff inventory management handlers.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
    Form,
};
use dealership_core::domain::{Vehicle, VehicleDraft};
use dealership_core::ports::PortError;
use dealership_core::rules;
use dealership_core::validation::{ErrorSet, FormInput};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::web::context::{path_id, RequestContext};
use crate::web::error::AppError;
use crate::web::flash::Notice;
use crate::web::gate::{self, Checked};
use crate::web::state::AppState;
use crate::web::view::View;

pub const MANAGEMENT: &str = "/inv/";

//=========================================================================================
// JSON Payloads
//=========================================================================================

/// A vehicle as returned by the inventory JSON endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct VehicleJson {
    pub inv_id: i32,
    pub inv_make: String,
    pub inv_model: String,
    pub inv_year: i32,
    pub inv_description: String,
    pub inv_image: String,
    pub inv_thumbnail: String,
    pub inv_price: f64,
    pub inv_miles: i32,
    pub inv_color: String,
    pub classification_id: i32,
    pub classification_name: String,
}

impl From<Vehicle> for VehicleJson {
    fn from(v: Vehicle) -> Self {
        Self {
            inv_id: v.inv_id,
            inv_make: v.make,
            inv_model: v.model,
            inv_year: v.year,
            inv_description: v.description,
            inv_image: v.image,
            inv_thumbnail: v.thumbnail,
            inv_price: v.price,
            inv_miles: v.miles,
            inv_color: v.color,
            classification_id: v.classification_id,
            classification_name: v.classification_name,
        }
    }
}

//=========================================================================================
// Form Helpers
//=========================================================================================

/// Builds the writable vehicle fields from a validated form.
fn draft_from(input: &FormInput) -> Result<VehicleDraft, AppError> {
    let field = |name: &str| AppError::Internal(format!("validated field {} did not parse", name));
    Ok(VehicleDraft {
        classification_id: input
            .parse("classification_id")
            .ok_or_else(|| field("classification_id"))?,
        make: input.get("inv_make").to_string(),
        model: input.get("inv_model").to_string(),
        year: input.parse("inv_year").ok_or_else(|| field("inv_year"))?,
        description: input.get("inv_description").to_string(),
        image: input.get("inv_image").to_string(),
        thumbnail: input.get("inv_thumbnail").to_string(),
        price: input.parse("inv_price").ok_or_else(|| field("inv_price"))?,
        // Miles may be submitted with a fraction.
        miles: input
            .parse::<f64>("inv_miles")
            .map(f64::round)
            .filter(|miles| (0.0..=f64::from(i32::MAX)).contains(miles))
            .map(|miles| miles as i32)
            .ok_or_else(|| field("inv_miles"))?,
        color: input.get("inv_color").to_string(),
    })
}

fn vehicle_form(v: &Vehicle) -> FormInput {
    FormInput::new()
        .with("inv_id", v.inv_id.to_string())
        .with("classification_id", v.classification_id.to_string())
        .with("inv_make", &v.make)
        .with("inv_model", &v.model)
        .with("inv_year", v.year.to_string())
        .with("inv_description", &v.description)
        .with("inv_image", &v.image)
        .with("inv_thumbnail", &v.thumbnail)
        .with("inv_price", v.price.to_string())
        .with("inv_miles", v.miles.to_string())
        .with("inv_color", &v.color)
}

/// A vehicle form view with the classification select options.
async fn vehicle_view(
    state: &AppState,
    template: &'static str,
    title: impl Into<String>,
) -> Result<View, AppError> {
    let classifications = state.db.list_classifications().await?;
    Ok(View::new(template, title).data(json!({ "classifications": classifications })))
}

fn edit_title(input: &FormInput) -> String {
    format!("Edit {} {}", input.get("inv_make"), input.get("inv_model"))
}

async fn find_vehicle(state: &AppState, inv_id: i32) -> Result<Vehicle, AppError> {
    state
        .db
        .get_vehicle(inv_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("vehicle {}", inv_id)))
}

/// Re-renders a vehicle form whose classification no longer exists.
fn unknown_classification(view: View, input: &FormInput) -> View {
    let mut errors = ErrorSet::default();
    errors.push("classification_id", "Please select a class.");
    view.status(StatusCode::UNPROCESSABLE_ENTITY)
        .errors(errors)
        .form(input.echo())
}

fn added(what: &str) -> Response {
    (Notice::new(format!("Successfully added {}.", what)), Redirect::to(MANAGEMENT)).into_response()
}

//=========================================================================================
// Public Views
//=========================================================================================

pub async fn by_classification(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Response, AppError> {
    let classification_id = path_id(path)?;
    let classification = state
        .db
        .get_classification(classification_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("classification {}", classification_id)))?;
    let vehicles = state.db.vehicles_by_classification(classification_id).await?;

    let view = View::new(
        "inventory/classification",
        format!("{} vehicles", classification.classification_name),
    )
    .data(json!({ "classification": classification, "vehicles": vehicles }));
    Ok(state.page(&ctx, view))
}

pub async fn vehicle_detail(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Response, AppError> {
    let vehicle = find_vehicle(&state, path_id(path)?).await?;
    let title = format!("{} {}", vehicle.year, vehicle.display_name());
    let view = View::new("inventory/detail", title).data(json!({ "vehicle": vehicle }));
    Ok(state.page(&ctx, view))
}

//=========================================================================================
// Management
//=========================================================================================

pub async fn management(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Response, AppError> {
    let view = vehicle_view(&state, "inventory/management", "Vehicle Management").await?;
    Ok(state.page(&ctx, view))
}

/// List the vehicles of one classification.
#[utoipa::path(
    get,
    path = "/inv/getInventory/{classification_id}",
    params(
        ("classification_id" = i32, Path, description = "The classification to list.")
    ),
    responses(
        (status = 200, description = "Vehicles in the classification", body = [VehicleJson]),
        (status = 303, description = "Caller is not signed in as an employee or admin"),
        (status = 404, description = "Unknown classification")
    ),
    tag = "Inventory"
)]
pub async fn inventory_json(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<VehicleJson>>, AppError> {
    let classification_id = path_id(path)?;
    if state.db.get_classification(classification_id).await?.is_none() {
        return Err(AppError::NotFound(format!("classification {}", classification_id)));
    }
    let vehicles = state.db.vehicles_by_classification(classification_id).await?;
    Ok(Json(vehicles.into_iter().map(VehicleJson::from).collect()))
}

pub async fn add_classification_form(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Response {
    state.page(&ctx, View::new("inventory/add-classification", "Add Classification"))
}

pub async fn add_classification(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    let view = || View::new("inventory/add-classification", "Add Classification");
    let input = match gate::check(&state, rules::classification(), input).await? {
        Checked::Valid(input) => input,
        Checked::Invalid(rejected) => return Ok(state.page(&ctx, rejected.into_view(view()))),
    };
    let name = input.get("classification_name");

    match state.db.add_classification(name).await {
        Ok(classification) => {
            info!(
                classification_id = classification.classification_id,
                "Added classification"
            );
            Ok(added(&classification.classification_name))
        }
        Err(PortError::Conflict(_)) => {
            let mut errors = ErrorSet::default();
            errors.push(
                "classification_name",
                format!("Classification {} already exists.", name),
            );
            let page = view()
                .status(StatusCode::UNPROCESSABLE_ENTITY)
                .errors(errors)
                .form(input.echo());
            Ok(state.page(&ctx, page))
        }
        Err(e) => {
            error!("Failed to add classification: {}", e);
            let page = view()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .notice("Sorry, the class creation failed.")
                .form(input.echo());
            Ok(state.page(&ctx, page))
        }
    }
}

pub async fn add_inventory_form(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
) -> Result<Response, AppError> {
    let view = vehicle_view(&state, "inventory/add-inventory", "Add Vehicle").await?;
    Ok(state.page(&ctx, view))
}

pub async fn add_inventory(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    let view = vehicle_view(&state, "inventory/add-inventory", "Add Vehicle").await?;
    let input = match gate::check(&state, rules::new_vehicle(), input).await? {
        Checked::Valid(input) => input,
        Checked::Invalid(rejected) => return Ok(state.page(&ctx, rejected.into_view(view))),
    };

    match state.db.add_vehicle(draft_from(&input)?).await {
        Ok(vehicle) => {
            info!(inv_id = vehicle.inv_id, "Added vehicle");
            Ok(added(&vehicle.display_name()))
        }
        Err(PortError::UnknownReference(e)) => {
            info!("Vehicle named a missing classification: {}", e);
            Ok(state.page(&ctx, unknown_classification(view, &input)))
        }
        Err(e) => {
            error!("Failed to add vehicle: {}", e);
            let page = view
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .notice("Sorry, the vehicle creation failed.")
                .form(input.echo());
            Ok(state.page(&ctx, page))
        }
    }
}

pub async fn edit_inventory_form(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Response, AppError> {
    let vehicle = find_vehicle(&state, path_id(path)?).await?;
    let title = format!("Edit {}", vehicle.display_name());
    let view = vehicle_view(&state, "inventory/edit-inventory", title)
        .await?
        .form(vehicle_form(&vehicle));
    Ok(state.page(&ctx, view))
}

pub async fn update_inventory(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    let view = vehicle_view(&state, "inventory/edit-inventory", edit_title(&input)).await?;
    let input = match gate::check(&state, rules::vehicle_update(), input).await? {
        Checked::Valid(input) => input,
        Checked::Invalid(rejected) => return Ok(state.page(&ctx, rejected.into_view(view))),
    };
    let inv_id: i32 = input
        .parse("inv_id")
        .ok_or_else(|| AppError::Internal("validated inv_id did not parse".to_string()))?;
    find_vehicle(&state, inv_id).await?;

    match state.db.update_vehicle(inv_id, draft_from(&input)?).await {
        Ok(vehicle) => {
            info!(inv_id, "Updated vehicle");
            let notice = format!("Successfully updated {}.", vehicle.display_name());
            Ok((Notice::new(notice), Redirect::to(MANAGEMENT)).into_response())
        }
        Err(PortError::UnknownReference(e)) => {
            info!(inv_id, "Vehicle update named a missing classification: {}", e);
            Ok(state.page(&ctx, unknown_classification(view, &input)))
        }
        Err(PortError::NotFound(what)) => Err(AppError::NotFound(what)),
        Err(e) => {
            error!("Failed to update vehicle {}: {}", inv_id, e);
            let page = view
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .notice("Sorry, the update failed.")
                .form(input.echo());
            Ok(state.page(&ctx, page))
        }
    }
}

fn delete_view(vehicle: &Vehicle) -> View {
    View::new(
        "inventory/delete-confirm",
        format!("Delete {}", vehicle.display_name()),
    )
    .form(
        FormInput::new()
            .with("inv_id", vehicle.inv_id.to_string())
            .with("inv_make", &vehicle.make)
            .with("inv_model", &vehicle.model)
            .with("inv_year", vehicle.year.to_string())
            .with("inv_price", vehicle.price.to_string()),
    )
}

pub async fn delete_confirm(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Response, AppError> {
    let vehicle = find_vehicle(&state, path_id(path)?).await?;
    Ok(state.page(&ctx, delete_view(&vehicle)))
}

pub async fn remove_inventory(
    State(state): State<Arc<AppState>>,
    ctx: RequestContext,
    Form(input): Form<FormInput>,
) -> Result<Response, AppError> {
    let inv_id: i32 = input
        .parse("inv_id")
        .ok_or_else(|| AppError::NotFound(format!("vehicle {}", input.get("inv_id"))))?;
    let vehicle = find_vehicle(&state, inv_id).await?;

    match state.db.delete_vehicle(inv_id).await {
        Ok(()) => {
            info!(inv_id, "Deleted vehicle");
            let notice = format!("Successfully deleted {}.", vehicle.display_name());
            Ok((Notice::new(notice), Redirect::to(MANAGEMENT)).into_response())
        }
        Err(e) => {
            error!("Failed to delete vehicle {}: {}", inv_id, e);
            let page = delete_view(&vehicle)
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .notice("Sorry, the deletion failed.");
            Ok(state.page(&ctx, page))
        }
    }
}
