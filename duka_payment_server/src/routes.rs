//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are async; anything that touches the database or the gateway awaits rather than
//! blocking the worker thread.
use actix_web::{get, web, HttpResponse, Responder};
use daraja_tools::{helpers::normalize_phone, DarajaApi, StkCallbackEnvelope};
use duka_payment_engine::{
    db_types::{NewOrder, NewPaymentAttempt, OrderId},
    traits::SettlementDatabase,
    OrderApi,
    SettlementApi,
};
use log::*;

use crate::{
    config::ServerOptions,
    data_objects::{CallbackAck, CheckoutRequest, OrderStatusResult, SubmitPaymentRequest, SubmitPaymentResponse},
    errors::ServerError,
    integrations::daraja::notice_from_callback,
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

//----------------------------------------------  Checkout  ----------------------------------------------------
route!(checkout => Post "/orders" impl SettlementDatabase);
/// Route handler for checkout.
///
/// The caller provides the frozen cart subtotal and payment method; the flat shipping fee comes
/// from the server configuration and the total is fixed here, once. The new order starts out
/// awaiting payment and is returned in full, including the `order_id` to submit payments against
/// and the `order_number` reference the payer will see on their device.
pub async fn checkout<B: SettlementDatabase>(
    req: web::Json<CheckoutRequest>,
    api: web::Data<OrderApi<B>>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let req = req.into_inner();
    debug!("💻️ POST checkout for subtotal {}", req.subtotal);
    let order = NewOrder::new(req.payment_method, req.subtotal, options.shipping_fee);
    let order = api.create_order(order).await?;
    Ok(HttpResponse::Created().json(order))
}

//--------------------------------------------  Submit payment  ------------------------------------------------
route!(submit_payment => Post "/payments/stk" impl SettlementDatabase);
/// Route handler for STK push submission.
///
/// The phone number is normalized to canonical MSISDN form before anything else happens; a number
/// that cannot be normalized is a 400 with no gateway traffic. The push amount is always the
/// order total. An accepted submission is recorded in the ledger as a pending attempt and the
/// correlation id is returned to the caller for status polling.
pub async fn submit_payment<B: SettlementDatabase>(
    req: web::Json<SubmitPaymentRequest>,
    orders: web::Data<OrderApi<B>>,
    settlements: web::Data<SettlementApi<B>>,
    gateway: web::Data<DarajaApi>,
    options: web::Data<ServerOptions>,
) -> Result<HttpResponse, ServerError> {
    let req = req.into_inner();
    debug!("💻️ POST submit payment for order {}", req.order_id);
    let phone = normalize_phone(&req.phone, &options.country_prefix)?;
    let order_id = OrderId::from(req.order_id);
    let order = orders
        .order_by_order_id(&order_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_id}")))?;
    if !order.payment_status.awaits_payment() {
        return Err(ServerError::InvalidRequestBody(format!(
            "Order {} is not awaiting payment ({})",
            order.order_number, order.payment_status
        )));
    }
    let description = format!("Payment for order {}", order.order_number);
    let submission = gateway.stk_push(order.total, &phone, &order.order_number, &description).await?;
    let attempt = settlements
        .record_submission(NewPaymentAttempt::new(
            order.id,
            submission.checkout_request_id,
            submission.merchant_request_id,
            order.total,
            phone,
        ))
        .await?;
    let response = SubmitPaymentResponse {
        order_number: order.order_number,
        checkout_request_id: attempt.checkout_request_id,
        merchant_request_id: attempt.merchant_request_id,
        amount: attempt.amount,
    };
    Ok(HttpResponse::Ok().json(response))
}

//--------------------------------------------  Payment callback  ----------------------------------------------
route!(payment_callback => Post "/payments/callback" impl SettlementDatabase);
/// Route handler for the asynchronous Daraja result callback.
///
/// This endpoint is unauthenticated and must reply with the fixed acknowledgement no matter what
/// arrives, or the gateway keeps retrying. The body is taken as raw bytes so that malformed
/// payloads can be logged and acked instead of bouncing with a 400 from the JSON extractor.
/// All reconciliation outcomes, including backend errors, are swallowed into the ack.
pub async fn payment_callback<B: SettlementDatabase>(
    body: web::Bytes,
    api: web::Data<SettlementApi<B>>,
) -> HttpResponse {
    trace!("💻️ Received payment callback");
    match serde_json::from_slice::<StkCallbackEnvelope>(&body) {
        Ok(envelope) => {
            let notice = notice_from_callback(envelope.body.stk_callback);
            if let Err(e) = api.process_settlement(notice).await {
                error!("💻️ Error processing settlement notice. {e}");
            }
        },
        Err(e) => {
            warn!("💻️ Discarding callback payload that does not parse as an STK callback. {e}");
        },
    }
    HttpResponse::Ok().json(CallbackAck::accepted())
}

//----------------------------------------------  Order status  ------------------------------------------------
route!(order_status => Get "/orders/{order_number}" impl SettlementDatabase);
/// Route handler for the order status surface. Lookup is by the human-readable reference.
pub async fn order_status<B: SettlementDatabase>(
    path: web::Path<String>,
    api: web::Data<OrderApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let reference = path.into_inner();
    debug!("💻️ GET order status for {reference}");
    let order = api
        .order_by_reference(&reference)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {reference}")))?;
    Ok(HttpResponse::Ok().json(OrderStatusResult::from(order)))
}
