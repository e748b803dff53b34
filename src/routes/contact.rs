use actix_web::{web, HttpResponse, Responder};

use crate::domain::contact_submission::{ContactSubmission, ContactSubmissionBody};
use crate::submission_store::SubmissionStore;

#[tracing::instrument(
    name = "Saving a contact form submission",
    skip(body, store),
    fields(contact_email = %body.email)
)]
pub async fn handle_contact_submission(
    body: web::Json<ContactSubmissionBody>,
    store: web::Data<dyn SubmissionStore>,
) -> impl Responder {
    let submission: ContactSubmission = match body.into_inner().try_into() {
        Ok(submission) => submission,
        Err(err) => {
            tracing::error!("Validation error: {:?}", err);
            return HttpResponse::BadRequest().finish();
        }
    };

    match store.save_contact_submission(&submission).await {
        Ok(id) => HttpResponse::Created().json(serde_json::json!({ "id": id })),
        Err(err) => {
            tracing::error!("Failed to save contact submission: {:?}", err);
            HttpResponse::InternalServerError().finish()
        }
    }
}
