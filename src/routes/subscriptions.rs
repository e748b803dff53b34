use actix_web::{web, HttpResponse, Responder};

use crate::domain::idu_submission::{IduSubmission, IduSubmissionBody};
use crate::submission_store::SubmissionStore;

#[tracing::instrument(
    name = "Creating a new IDU subscriber handler",
    skip(body, store),
    fields(
        subscriber_email = %body.email,
        subscriber_name = %body.name
    )
)]
pub async fn handle_create_subscription(
    body: web::Json<IduSubmissionBody>,
    store: web::Data<dyn SubmissionStore>,
) -> impl Responder {
    let submission: IduSubmission = match body.into_inner().try_into() {
        Ok(submission) => submission,
        Err(err) => {
            tracing::error!("Validation error: {:?}", err);
            return HttpResponse::BadRequest().finish();
        }
    };

    match store.save_idu_submission(&submission).await {
        Ok(id) => HttpResponse::Created().json(serde_json::json!({ "id": id })),
        Err(err) => {
            tracing::error!("Failed to insert new subscriber: {:?}", err);
            HttpResponse::InternalServerError().finish()
        }
    }
}
