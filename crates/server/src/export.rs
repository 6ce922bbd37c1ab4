use api_types::export::ExportQuery;
use axum::{
    Extension,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;

use crate::{ServerError, auth::Identity, pdf, server::ServerState};

/// `GET /export/pdf?start_date=&end_date=`
pub async fn report_pdf(
    Extension(identity): Extension<Identity>,
    State(state): State<ServerState>,
    WithRejection(Query(query), _): WithRejection<Query<ExportQuery>, ServerError>,
) -> Result<impl IntoResponse, ServerError> {
    let today = chrono::Local::now().date_naive();
    let report = state
        .engine
        .export_report(identity.user_id, query.start_date, query.end_date, today)
        .await?;

    let filename = format!("report_{}_to_{}.pdf", report.start, report.end);
    let bytes = tokio::task::spawn_blocking(move || {
        pdf::render(&report).map_err(|err| err.to_string())
    })
    .await
    .map_err(|err| ServerError::Internal(format!("blocking task failed: {err}")))?
    .map_err(|err| ServerError::Internal(format!("pdf rendering failed: {err}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        bytes,
    ))
}
