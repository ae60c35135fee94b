use axum::extract::{Multipart, Query, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use regdesk_core::document::sniff_content_type;
use regdesk_core::export::{export_filename, registrations_csv, CSV_CONTENT_TYPE};
use regdesk_core::{DocumentKind, RegistrationForm, RegistrationSummary};

use crate::auth::middleware::AdminUser;
use crate::db::InsertOutcome;
use crate::dto::{ImageQuery, RegistrationCreated};
use crate::error::AppError;
use crate::state::AppState;

fn parse_error(e: axum::extract::multipart::MultipartError) -> AppError {
    tracing::warn!("Registration form parse error: {e}");
    AppError::BadRequest("Error parsing form data.".to_string())
}

pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<RegistrationCreated>), AppError> {
    let max_file = state.config.max_file_size_bytes();
    let mut form = RegistrationForm::new();

    while let Some(mut field) = multipart.next_field().await.map_err(parse_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if RegistrationForm::is_document_field(&name) {
            let mut data = Vec::new();
            while let Some(chunk) = field.chunk().await.map_err(parse_error)? {
                if data.len() + chunk.len() > max_file {
                    return Err(AppError::BadRequest(format!(
                        "File size too large. Maximum {}MB per file.",
                        state.config.upload.max_file_size_mb
                    )));
                }
                data.extend_from_slice(&chunk);
            }
            form.set_document(&name, data);
        } else {
            let value = field.text().await.map_err(parse_error)?;
            form.set_field(&name, value);
        }
    }

    let registration = form.finish()?;

    match state.store.insert(&registration).await? {
        InsertOutcome::Created(id) => {
            tracing::info!("Registration {id} created for {}", registration.event);
            Ok((
                StatusCode::CREATED,
                Json(RegistrationCreated {
                    message: "Registration successful!".to_string(),
                    registration_id: id,
                    event_name: registration.event,
                }),
            ))
        }
        InsertOutcome::Duplicate => Err(AppError::Conflict("Duplicate registration.".to_string())),
    }
}

pub async fn list(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RegistrationSummary>>, AppError> {
    Ok(Json(state.store.list().await?))
}

pub async fn export(
    admin: AdminUser,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let records = state.store.list_for_export().await?;
    let csv = registrations_csv(&records)?;
    let filename = export_filename(chrono::Utc::now().date_naive());
    tracing::info!(
        "{} exported {} registrations",
        admin.subject,
        records.len()
    );

    Ok((
        [
            (CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    ))
}

pub async fn image(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ImageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(id), Some(kind)) = (query.id, query.kind) else {
        return Err(AppError::BadRequest(
            "Missing id or type parameter. Use ?id=1&type=cnic or ?id=1&type=payment".to_string(),
        ));
    };
    let kind: DocumentKind = kind.parse()?;
    let id: i64 = id
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid id parameter.".to_string()))?;

    let data = state
        .store
        .document(id, kind)
        .await?
        .ok_or_else(|| AppError::NotFound("Registration not found.".to_string()))?
        .ok_or_else(|| AppError::NotFound("Image not found for this registration.".to_string()))?;

    Ok((
        [
            (CONTENT_TYPE, sniff_content_type(&data)),
            (CACHE_CONTROL, "private, max-age=3600"),
        ],
        data,
    ))
}
