use axum::{ extract::{ Path, State }, http::StatusCode, Json };

use crate::alert_checker::{ BatchReport, CheckResult };
use crate::db::Alert;
use crate::error::Result;
use crate::services::price_alert_service::{ CreateAlertRequest, UpdateAlertRequest };

use super::AppState;

pub async fn list_alerts(State(state): State<AppState>) -> Result<Json<Vec<Alert>>> {
    let alerts = state.alert_service.list_alerts().await?;

    Ok(Json(alerts))
}

pub async fn create_alert(
    State(state): State<AppState>,
    Json(request): Json<CreateAlertRequest>
) -> Result<(StatusCode, Json<Alert>)> {
    let alert = state.alert_service.create_alert(request).await?;

    Ok((StatusCode::CREATED, Json(alert)))
}

pub async fn get_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<String>
) -> Result<Json<Alert>> {
    let alert = state.alert_service.get_alert(&alert_id).await?;

    Ok(Json(alert))
}

pub async fn update_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<String>,
    Json(request): Json<UpdateAlertRequest>
) -> Result<Json<Alert>> {
    let alert = state.alert_service.update_alert(&alert_id, request).await?;

    Ok(Json(alert))
}

pub async fn delete_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<String>
) -> Result<StatusCode> {
    state.alert_service.delete_alert(&alert_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Run one evaluation pass over every active alert.
pub async fn process_alerts(State(state): State<AppState>) -> Result<Json<BatchReport>> {
    let report = state.alert_checker.check_alerts().await?;

    Ok(Json(report))
}

pub async fn check_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<String>
) -> Result<Json<CheckResult>> {
    let result = state.alert_checker.check_alert(&alert_id).await?;

    Ok(Json(result))
}
