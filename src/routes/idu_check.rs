use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::Serialize;

use crate::extract::{DateExtractor, ScheduleExtractor};
use crate::fetcher::FetchError;
use crate::pipeline::{Pipeline, PipelineError, RunReport};
use crate::routes::error_chain_fmt;

/// Triggered by the external scheduler: checks the published IDU date.
#[tracing::instrument(name = "Checking the IDU registration date", skip(pipeline))]
pub async fn check_idu_date(
    pipeline: web::Data<Pipeline<DateExtractor>>,
) -> Result<HttpResponse, CheckError> {
    let report = pipeline.run().await?;

    Ok(respond(report, "No date found"))
}

/// Triggered by the external scheduler: checks the monthly IDU schedule.
#[tracing::instrument(name = "Checking the IDU schedule", skip(pipeline))]
pub async fn check_idu_schedule(
    pipeline: web::Data<Pipeline<ScheduleExtractor>>,
) -> Result<HttpResponse, CheckError> {
    let report = pipeline.run().await?;

    Ok(respond(report, "No schedule found"))
}

fn respond<O: Serialize>(report: RunReport<O>, nothing_found: &'static str) -> HttpResponse {
    match report {
        RunReport::NothingFound => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(nothing_found),
        RunReport::Completed(summary) => {
            let status = if summary.notifications.has_failures() {
                StatusCode::MULTI_STATUS
            } else {
                StatusCode::OK
            };

            HttpResponse::build(status).json(summary)
        }
    }
}

#[derive(thiserror::Error)]
pub enum CheckError {
    #[error(transparent)]
    Upstream(FetchError),
    #[error("Internal error")]
    Unexpected(#[source] PipelineError),
}

impl From<PipelineError> for CheckError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Fetch(err) => CheckError::Upstream(err),
            other => CheckError::Unexpected(other),
        }
    }
}

impl std::fmt::Debug for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for CheckError {
    fn status_code(&self) -> StatusCode {
        match self {
            CheckError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CheckError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(self.to_string())
    }
}
