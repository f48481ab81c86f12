//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. For this reason, any long, non-cpu-bound operation (e.g. I/O,
//! database operations, calls to the payment gateway) should be expressed as futures or asynchronous functions.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use rent_payment_engine::{
    db_types::Money,
    traits::{PaymentGatewayDatabase, PushGateway, TenantManagement},
    PaymentFlowApi,
    TenantApi,
};

use crate::{
    data_objects::{InitiatePaymentParams, InitiatePaymentResponse},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   STK push  ----------------------------------------------------
route!(initiate_payment => Post "/mpesa/stk/push" impl PaymentGatewayDatabase, PushGateway);
/// Prompts the tenant's handset to pay rent.
///
/// The body is `{"tenantId": 7, "amount": 1500}`. The tenant's phone number on record is used.
///
/// On success, the payment request is `Pending` and the response carries the ids needed to track it:
/// `{"checkoutRequestId": "...", "merchantRequestId": "...", "paymentRequestId": 12, "amount": 1500}`.
/// The outcome arrives later, on the callback route.
pub async fn initiate_payment<B, G>(
    body: web::Json<InitiatePaymentParams>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: PaymentGatewayDatabase,
    G: PushGateway,
{
    let InitiatePaymentParams { tenant_id, amount } = body.into_inner();
    debug!("💻️ Payment request for {amount} from tenant #{tenant_id}");
    let request = api.initiate_for_tenant(tenant_id, Money::from(amount)).await.map_err(|e| {
        debug!("💻️ Could not initiate payment for tenant #{tenant_id}. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(InitiatePaymentResponse::from(request)))
}

//----------------------------------------------   Tenants  ----------------------------------------------------
route!(tenant_payments => Get "/tenants/{id}/payments" impl TenantManagement);
/// The tenant's payments, most recent transaction first.
pub async fn tenant_payments<B: TenantManagement>(
    path: web::Path<i64>,
    api: web::Data<TenantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let tenant_id = path.into_inner();
    trace!("💻️ Fetching payments for tenant #{tenant_id}");
    let payments = api.payments_for_tenant(tenant_id).await?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(tenant_balance => Get "/tenants/{id}/balance" impl TenantManagement);
pub async fn tenant_balance<B: TenantManagement>(
    path: web::Path<i64>,
    api: web::Data<TenantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let tenant_id = path.into_inner();
    trace!("💻️ Fetching balance for tenant #{tenant_id}");
    let balance = api.balance(tenant_id).await?;
    Ok(HttpResponse::Ok().json(balance))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(payment_request => Get "/payment_requests/{id}" impl TenantManagement);
/// Lets a UI poll the status of a payment request.
pub async fn payment_request<B: TenantManagement>(
    path: web::Path<i64>,
    api: web::Data<TenantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    trace!("💻️ Fetching payment request #{id}");
    let request =
        api.payment_request(id).await?.ok_or_else(|| ServerError::NoRecordFound(format!("Payment request {id}")))?;
    Ok(HttpResponse::Ok().json(request))
}

route!(unassigned_payments => Get "/payments/unassigned" impl TenantManagement);
pub async fn unassigned_payments<B: TenantManagement>(
    api: web::Data<TenantApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Fetching unassigned payments");
    let payments = api.unassigned_payments().await?;
    Ok(HttpResponse::Ok().json(payments))
}
