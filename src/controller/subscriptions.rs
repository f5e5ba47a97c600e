use actix_web::{get, post, web, HttpResponse, Responder};

use serde::Serialize;

use crate::error::Result;
use crate::service::{SubscribeRequest, SubscriptionService};

#[derive(Debug, Serialize)]
struct SubscribeResponse {
    success: bool,
}

#[derive(Debug, Serialize)]
struct ConfirmResponse {
    confirmed: bool,
}

#[derive(Debug, Serialize)]
struct UnsubscribeResponse {
    unsubscribed: bool,
}

/// Create endpoint for new subscriptions
#[tracing::instrument(name = "Create a new subscriber", skip(service, body))]
#[post("/subscribe")]
async fn subscribe(
    service: web::Data<SubscriptionService>,
    body: web::Json<SubscribeRequest>,
) -> Result<impl Responder> {
    service.subscribe(body.into_inner()).await?;

    Ok(HttpResponse::Ok().json(SubscribeResponse { success: true }))
}

/// Subscription confirmation endpoint
#[tracing::instrument(name = "Confirm a subscription by token", skip(service, path))]
#[get("/confirm/{token}")]
async fn confirm(
    service: web::Data<SubscriptionService>,
    path: web::Path<(String,)>,
) -> Result<impl Responder> {
    let (token,) = path.into_inner();
    service.confirm(&token).await?;

    Ok(HttpResponse::Ok().json(ConfirmResponse { confirmed: true }))
}

/// Unsubscribe endpoint, linked from every update email
#[tracing::instrument(name = "Unsubscribe by token", skip(service, path))]
#[get("/unsubscribe/{token}")]
async fn unsubscribe(
    service: web::Data<SubscriptionService>,
    path: web::Path<(String,)>,
) -> Result<impl Responder> {
    let (token,) = path.into_inner();
    service.unsubscribe(&token).await?;

    Ok(HttpResponse::Ok().json(UnsubscribeResponse { unsubscribed: true }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(subscribe)
        .service(confirm)
        .service(unsubscribe);
}
