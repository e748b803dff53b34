use actix_web::HttpResponse;

/// Liveness probe for the hosting platform.
#[tracing::instrument(name = "Health Check handler")]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().finish()
}
