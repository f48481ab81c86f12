use std::fmt::Debug;

use chrono::Duration;
use log::*;
use rpg_common::{
    phone::{normalize_phone, phone_variants},
    Money,
};

use crate::{
    db_types::{NewPayment, NewPaymentRequest, Payment, PaymentRequest, TenantBalance},
    events::{EventProducers, PaymentRequestFailedEvent, PaymentSettledEvent},
    rpe_api::{
        errors::PaymentFlowError,
        notification::{CallbackOutcome, ConfirmedTransfer, NotificationOutcome, PaymentNotification},
    },
    traits::{
        PaymentGatewayDatabase,
        PaymentGatewayError,
        PushGateway,
        PushRequest,
        SettlementRequest,
        SettlementResult,
    },
};

pub const DEFAULT_COUNTRY_CODE: &str = "254";

/// `PaymentFlowApi` is the primary API for issuing payment requests and for reconciling the gateway's asynchronous
/// notifications against them.
pub struct PaymentFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    country_code: String,
}

impl<B, G> Debug for PaymentFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi (+{})", self.country_code)
    }
}

impl<B, G> PaymentFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers, country_code: DEFAULT_COUNTRY_CODE.to_string() }
    }

    /// Sets the country code used to normalise local phone numbers.
    pub fn with_country_code<S: Into<String>>(mut self, country_code: S) -> Self {
        self.country_code = country_code.into();
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> PaymentFlowApi<B, G>
where
    B: PaymentGatewayDatabase,
    G: PushGateway,
{
    /// Prompts `phone` to pay `amount` towards the tenant's rent.
    ///
    /// The request is only stored (as `Pending`) once the gateway has accepted the push. If the gateway refuses,
    /// nothing is stored and the gateway's response is returned in the error.
    pub async fn initiate_payment(
        &self,
        tenant_id: i64,
        amount: Money,
        phone: &str,
    ) -> Result<PaymentRequest, PaymentFlowError> {
        if !amount.is_positive() {
            return Err(PaymentFlowError::InvalidAmount(amount));
        }
        let phone = normalize_phone(phone, &self.country_code)
            .ok_or_else(|| PaymentFlowError::InvalidPhone(phone.to_string()))?;
        let tenant = self.db.fetch_tenant(tenant_id).await?.ok_or(PaymentFlowError::TenantNotFound(tenant_id))?;
        let push = PushRequest {
            tenant_id,
            amount,
            phone: phone.clone(),
            account_reference: format!("Rent-{tenant_id}"),
            description: format!("Rent payment for {}", tenant.name),
        };
        trace!("🔄️📲️ Requesting {amount} from {phone} for tenant #{tenant_id}");
        let accepted = self.gateway.send_push(push).await.map_err(|e| {
            warn!("🔄️📲️ Payment request for tenant #{tenant_id} was not accepted. {e}");
            PaymentFlowError::from(e)
        })?;
        let request = NewPaymentRequest {
            tenant_id,
            amount,
            phone,
            checkout_request_id: accepted.checkout_request_id,
            merchant_request_id: accepted.merchant_request_id,
        };
        let request = self.db.insert_payment_request(request).await?;
        info!(
            "🔄️📲️ Payment request #{} [{}] for {amount} issued to tenant #{tenant_id}",
            request.id, request.checkout_request_id
        );
        Ok(request)
    }

    /// Like [`Self::initiate_payment`], using the phone number on the tenant's record.
    pub async fn initiate_for_tenant(&self, tenant_id: i64, amount: Money) -> Result<PaymentRequest, PaymentFlowError> {
        let tenant = self.db.fetch_tenant(tenant_id).await?.ok_or(PaymentFlowError::TenantNotFound(tenant_id))?;
        self.initiate_payment(tenant_id, amount, &tenant.phone).await
    }

    /// Reconciles a gateway notification.
    ///
    /// * A notification is correlated with its request by checkout request id. A notification that matches no
    ///   request is still processed.
    /// * A failure moves a `Pending` request to `Failed`. Nothing is credited.
    /// * A success records a payment exactly once per receipt, completes a `Pending` request and credits the tenant.
    ///   The tenant is the request's tenant if there is one; otherwise the single active tenant with a matching phone
    ///   number. Payments that cannot be attributed are recorded without a tenant.
    ///
    /// Only database failures are reported as errors. Everything else is an outcome to acknowledge.
    pub async fn process_notification(
        &self,
        notification: PaymentNotification,
    ) -> Result<CallbackOutcome, PaymentGatewayError> {
        let PaymentNotification { checkout_request_id, merchant_request_id, result_code, result_desc, outcome } =
            notification;
        trace!("🔄️📨️ Notification for [{checkout_request_id}]/[{merchant_request_id}]. Result {result_code}: {result_desc}");
        let request = self.db.fetch_payment_request_by_checkout_id(&checkout_request_id).await?;
        if request.is_none() {
            warn!("🔄️📨️ Notification for [{checkout_request_id}] does not match any payment request");
        }
        match outcome {
            NotificationOutcome::Declined => match self.db.fail_payment_request(&checkout_request_id, &result_desc).await? {
                Some(failed) => {
                    info!("🔄️❌️ Payment request #{} [{checkout_request_id}] failed. {result_desc}", failed.id);
                    self.call_request_failed_hook(&failed).await;
                    Ok(CallbackOutcome::RequestFailed(failed))
                },
                None => {
                    if let Some(r) = &request {
                        debug!(
                            "🔄️❌️ Failure reported for request #{} [{checkout_request_id}], which is already {}. \
                             Ignoring.",
                            r.id, r.status
                        );
                    }
                    Ok(CallbackOutcome::FailureIgnored { checkout_request_id })
                },
            },
            NotificationOutcome::Unreadable(reason) => {
                warn!("🔄️📨️ Success notification for [{checkout_request_id}] could not be read. {reason}");
                Ok(CallbackOutcome::Malformed(reason))
            },
            NotificationOutcome::Confirmed(transfer) => {
                let tenant_id = match &request {
                    Some(r) => {
                        if r.amount != transfer.amount {
                            warn!(
                                "🔄️💰️ Request #{} asked for {} but {} was paid (receipt {}). Crediting the amount paid.",
                                r.id, r.amount, transfer.amount, transfer.receipt
                            );
                        }
                        Some(r.tenant_id)
                    },
                    None => self.resolve_tenant_by_phone(&transfer).await?,
                };
                self.settle(checkout_request_id, result_desc, tenant_id, transfer).await
            },
        }
    }

    /// Fails every `Pending` request older than `timeout`.
    pub async fn expire_stale_requests(&self, timeout: Duration) -> Result<Vec<PaymentRequest>, PaymentGatewayError> {
        let expired = self.db.expire_stale_requests(timeout).await?;
        for request in &expired {
            info!("🔄️⏰️ Payment request #{} [{}] expired without a callback", request.id, request.checkout_request_id);
            self.call_request_failed_hook(request).await;
        }
        Ok(expired)
    }

    async fn settle(
        &self,
        checkout_request_id: String,
        result_desc: String,
        tenant_id: Option<i64>,
        transfer: ConfirmedTransfer,
    ) -> Result<CallbackOutcome, PaymentGatewayError> {
        let ConfirmedTransfer { receipt, amount, phone, transaction_date } = transfer;
        let phone = normalize_phone(&phone, &self.country_code).unwrap_or(phone);
        let payment = NewPayment {
            tenant_id,
            checkout_request_id: Some(checkout_request_id),
            amount,
            phone,
            receipt,
            transaction_date,
        };
        let result = self.db.settle_payment(SettlementRequest { payment, result_desc }).await?;
        let outcome = match result {
            SettlementResult::Settled { payment, request, balance } => {
                match (&payment.tenant_id, &balance) {
                    (Some(id), Some(b)) => info!(
                        "🔄️💰️ Payment {} of {} credited to tenant #{id}. Balance is now {}",
                        payment.receipt, payment.amount, b.rent_balance
                    ),
                    _ => info!(
                        "🔄️💰️ Payment {} of {} recorded without a tenant. It needs to be reconciled manually.",
                        payment.receipt, payment.amount
                    ),
                }
                self.call_payment_settled_hook(&payment, &balance).await;
                CallbackOutcome::Settled { payment, request, balance }
            },
            SettlementResult::Duplicate { payment, request } => {
                info!("🔄️💰️ Payment {} has already been processed. Ignoring the duplicate.", payment.receipt);
                CallbackOutcome::Duplicate { payment, request }
            },
        };
        Ok(outcome)
    }

    /// Finds the single active tenant whose phone matches the payer's. Zero or several matches attribute the payment
    /// to nobody.
    async fn resolve_tenant_by_phone(&self, transfer: &ConfirmedTransfer) -> Result<Option<i64>, PaymentGatewayError> {
        let variants = phone_variants(&transfer.phone, &self.country_code);
        let tenants = self.db.fetch_active_tenants_by_phone(&variants).await?;
        let result = match tenants.as_slice() {
            [tenant] => {
                debug!("🔄️📞️ Payment {} matched tenant #{} by phone", transfer.receipt, tenant.id);
                Some(tenant.id)
            },
            [] => {
                warn!("🔄️📞️ No active tenant has phone {} (payment {})", transfer.phone, transfer.receipt);
                None
            },
            many => {
                let ids = many.iter().map(|t| format!("#{}", t.id)).collect::<Vec<_>>().join(", ");
                warn!(
                    "🔄️📞️ Phone {} matches several tenants ({ids}). Payment {} is left unassigned.",
                    transfer.phone, transfer.receipt
                );
                None
            },
        };
        Ok(result)
    }

    async fn call_payment_settled_hook(&self, payment: &Payment, balance: &Option<TenantBalance>) {
        for emitter in &self.producers.payment_settled_producer {
            debug!("🔄️💰️ Notifying payment settled hook subscribers");
            emitter.publish_event(PaymentSettledEvent::new(payment.clone(), *balance)).await;
        }
    }

    async fn call_request_failed_hook(&self, request: &PaymentRequest) {
        for emitter in &self.producers.request_failed_producer {
            debug!("🔄️❌️ Notifying request failed hook subscribers");
            emitter.publish_event(PaymentRequestFailedEvent::new(request.clone())).await;
        }
    }
}
