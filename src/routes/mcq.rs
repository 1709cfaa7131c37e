use crate::{
    dto::mcq_dto::{
        ExportQuestionsPayload, GenerateMcqPayload, GenerateMcqResponse, PageQuestionsPayload,
    },
    error::{Error, Result},
    services::{export_service::ExportService, pagination_service::paginate},
    utils::time,
    AppState,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use validator::Validate;

#[axum::debug_handler]
pub async fn generate_mcqs(
    State(state): State<AppState>,
    payload: std::result::Result<Json<GenerateMcqPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    let page_size = payload.page_size.unwrap_or(state.page_size).max(1);

    let generation = state.generation_service.generate(&payload.topics);
    let questions = match tokio::time::timeout(state.generation_timeout, generation).await {
        Ok(result) => result?,
        Err(_) => {
            tracing::warn!(
                timeout_secs = state.generation_timeout.as_secs(),
                "MCQ generation timed out"
            );
            return Err(Error::Timeout(format!(
                "Generation did not finish within {} seconds",
                state.generation_timeout.as_secs()
            )));
        }
    };

    tracing::info!(total = questions.len(), "Total questions generated");
    let body = GenerateMcqResponse {
        questions: &questions,
        total: questions.len(),
        page: paginate(&questions, 1, page_size),
    };
    Ok((StatusCode::OK, Json(serde_json::to_value(&body)?)))
}

#[axum::debug_handler]
pub async fn page_questions(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PageQuestionsPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    payload.validate()?;
    let page_size = payload.page_size.unwrap_or(state.page_size);
    let page = paginate(&payload.questions, payload.page, page_size);
    Ok(Json(serde_json::to_value(&page)?))
}

/// Export the given questions as an XLSX download
#[axum::debug_handler]
pub async fn export_questions(
    payload: std::result::Result<Json<ExportQuestionsPayload>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(payload) = payload?;
    let buffer = ExportService::generate_questions_xlsx(&payload.questions)?;
    let filename = format!("MCQ_Questions_{}.xlsx", time::file_stamp(time::now()));
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
