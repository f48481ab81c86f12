//----------------------------------------------   STK callback  ----------------------------------------------------
use actix_web::{
    dev::Service,
    web,
    web::{Bytes, ServiceConfig},
    HttpRequest,
    HttpResponse,
};
use daraja_tools::StkCallbackEnvelope;
use futures::{future::ok, FutureExt};
use log::*;
use rent_payment_engine::{
    traits::{PaymentGatewayDatabase, PushGateway},
    CallbackOutcome,
    PaymentFlowApi,
};
use serde_json::Value;

use crate::{
    config::CallbackPeerPolicy,
    data_objects::CallbackAck,
    errors::ServerError,
    helpers::{get_remote_ip, is_whitelisted},
    integrations::daraja::notification_from_callback,
    route,
};

pub const STK_CALLBACK_PATH: &str = "/api/mpesa/stk-callback";

/// Registers the STK callback route. Callbacks from peers outside the policy's whitelist are refused with a 403
/// before they reach the handler.
pub fn configure_stk_callback<B, G>(cfg: &mut ServiceConfig, policy: CallbackPeerPolicy)
where
    B: PaymentGatewayDatabase + 'static,
    G: PushGateway + 'static,
{
    let scope = web::scope(STK_CALLBACK_PATH)
        .wrap_fn(move |req, srv| {
            let peer_ip = get_remote_ip(req.request(), policy.use_x_forwarded_for, policy.use_forwarded);
            if is_whitelisted(peer_ip, policy.whitelist.as_deref()) {
                srv.call(req)
            } else {
                warn!("💸️ Refusing M-Pesa callback from {peer_ip:?}. The peer is not on the whitelist.");
                let peer = peer_ip.map(|ip| ip.to_string()).unwrap_or_else(|| "unknown peer".into());
                ok(req.error_response(ServerError::ForbiddenPeer(peer))).boxed_local()
            }
        })
        .service(StkCallbackRoute::<B, G>::new());
    cfg.service(scope);
}

route!(stk_callback => Post "" impl PaymentGatewayDatabase, PushGateway);
/// Receives the outcome of an STK push from Daraja.
///
/// The gateway only cares whether we received the callback, so every callback that is valid JSON is acknowledged
/// with `ResultCode: 0`, whatever we make of it. A body that is not JSON at all gets a 400 and `ResultCode: 1`.
pub async fn stk_callback<B, G>(
    req: HttpRequest,
    body: Bytes,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> HttpResponse
where
    B: PaymentGatewayDatabase,
    G: PushGateway,
{
    trace!("💸️ Received STK callback: {}", req.uri());
    let value = match serde_json::from_slice::<Value>(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!("💸️ STK callback body is not JSON. {e}");
            return HttpResponse::BadRequest().json(CallbackAck::rejected(format!("Invalid JSON payload. {e}")));
        },
    };
    let callback = match serde_json::from_value::<StkCallbackEnvelope>(value.clone()) {
        Ok(envelope) => envelope.into_callback(),
        Err(e) => {
            warn!("💸️ STK callback has an unexpected structure. {e}");
            None
        },
    };
    let Some(callback) = callback else {
        warn!("💸️ Malformed STK callback. Nothing will be processed.");
        debug!("💸️ Callback body: {value}");
        return HttpResponse::Ok().json(CallbackAck::accepted("Callback received"));
    };
    let notification = notification_from_callback(callback);
    let desc = match api.process_notification(notification).await {
        Ok(outcome) => {
            if let CallbackOutcome::Malformed(reason) = &outcome {
                debug!("💸️ Callback body ({reason}): {value}");
            }
            outcome.ack_description()
        },
        Err(e) => {
            error!("💸️ Could not process STK callback. {e}");
            debug!("💸️ Callback body: {value}");
            "Callback received"
        },
    };
    HttpResponse::Ok().json(CallbackAck::accepted(desc))
}
