//! Conversion between the raw Daraja callback and the engine's provider-agnostic notice.
use daraja_tools::StkCallback;
use duka_payment_engine::SettlementNotice;

/// Flatten an STK callback into a [`SettlementNotice`].
///
/// Fields the gateway omitted become empty, which the reconciler treats as a failed or
/// unreconcilable notice. The conversion never fails; malformed payloads are dealt with at the
/// parsing stage and acked regardless.
pub fn notice_from_callback(callback: StkCallback) -> SettlementNotice {
    let receipt = callback.receipt_number();
    SettlementNotice {
        correlation_id: callback.checkout_request_id,
        result_code: callback.result_code.unwrap_or_default(),
        result_desc: callback.result_desc.unwrap_or_default(),
        receipt,
    }
}

#[cfg(test)]
mod test {
    use daraja_tools::StkCallbackEnvelope;

    use super::*;

    #[test]
    fn success_callback_becomes_a_success_notice() {
        let json = r#"{
          "Body": {
            "stkCallback": {
              "MerchantRequestID": "29115-34620561-1",
              "CheckoutRequestID": "ws_CO_191220191020363925",
              "ResultCode": 0,
              "ResultDesc": "The service request is processed successfully.",
              "CallbackMetadata": {
                "Item": [
                  { "Name": "Amount", "Value": 1200.00 },
                  { "Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV" }
                ]
              }
            }
          }
        }"#;
        let envelope: StkCallbackEnvelope = serde_json::from_str(json).unwrap();
        let notice = notice_from_callback(envelope.body.stk_callback);
        assert!(notice.is_success());
        assert_eq!(notice.correlation_id.as_deref(), Some("ws_CO_191220191020363925"));
        assert_eq!(notice.receipt.as_deref(), Some("NLJ7RT61SV"));
    }

    #[test]
    fn missing_result_code_is_not_a_success() {
        let json = r#"{"Body":{"stkCallback":{"CheckoutRequestID":"ws_CO_1"}}}"#;
        let envelope: StkCallbackEnvelope = serde_json::from_str(json).unwrap();
        let notice = notice_from_callback(envelope.body.stk_callback);
        assert!(!notice.is_success());
        assert!(notice.receipt.is_none());
    }
}
