use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::domain::subscriber_email::SubscriberEmail;
use crate::submission_store::{SubmissionStore, SubmissionStoreError};

#[derive(Deserialize, Debug)]
pub struct UnsubscribeParameters {
    pub email: String,
    pub message: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum UnsubscribeError {
    #[error("{0}")]
    InvalidEmail(String),
    #[error("Failed to unsubscribe.")]
    Store(#[from] SubmissionStoreError),
}

/// Target of the link included in every notification.
#[tracing::instrument(
    name = "Unsubscribe from the unsubscribe link",
    skip(store, parameters),
    fields(subscriber_email = %parameters.email)
)]
pub async fn handle_unsubscribe_link(
    parameters: web::Query<UnsubscribeParameters>,
    store: web::Data<dyn SubmissionStore>,
) -> HttpResponse {
    match unsubscribe(store.get_ref(), parameters.into_inner()).await {
        Ok(_) => HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body("Listo, ya no vas a recibir más actualizaciones sobre IDUs."),
        Err(err) => error_response(err),
    }
}

#[tracing::instrument(
    name = "Unsubscribe handler",
    skip(store, body),
    fields(subscriber_email = %body.email)
)]
pub async fn handle_unsubscribe(
    body: web::Json<UnsubscribeParameters>,
    store: web::Data<dyn SubmissionStore>,
) -> HttpResponse {
    match unsubscribe(store.get_ref(), body.into_inner()).await {
        Ok(affected) => HttpResponse::Ok().json(serde_json::json!({ "unsubscribed": affected })),
        Err(err) => error_response(err),
    }
}

async fn unsubscribe(
    store: &dyn SubmissionStore,
    parameters: UnsubscribeParameters,
) -> Result<u64, UnsubscribeError> {
    let email = SubscriberEmail::parse(parameters.email).map_err(UnsubscribeError::InvalidEmail)?;

    Ok(store
        .unsubscribe(&email, parameters.message.as_deref())
        .await?)
}

fn error_response(err: UnsubscribeError) -> HttpResponse {
    match err {
        UnsubscribeError::InvalidEmail(err) => {
            tracing::error!("Validation error: {:?}", err);
            HttpResponse::BadRequest().finish()
        }
        UnsubscribeError::Store(err) => {
            tracing::error!("Failed to unsubscribe: {:?}", err);
            HttpResponse::InternalServerError().finish()
        }
    }
}
