use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

//------------------------------------     OAuth token endpoint     ---------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<String>,
}

//------------------------------------     STK push request     -------------------------------------------------------

/// The payload of an STK push submission. Field names follow the Daraja wire format.
#[derive(Debug, Clone, Serialize)]
pub struct StkPushRequest {
    #[serde(rename = "BusinessShortCode")]
    pub business_short_code: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "TransactionType")]
    pub transaction_type: String,
    #[serde(rename = "Amount")]
    pub amount: i64,
    #[serde(rename = "PartyA")]
    pub party_a: String,
    #[serde(rename = "PartyB")]
    pub party_b: String,
    #[serde(rename = "PhoneNumber")]
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub callback_url: String,
    #[serde(rename = "AccountReference")]
    pub account_reference: String,
    #[serde(rename = "TransactionDesc")]
    pub transaction_desc: String,
}

/// The synchronous reply to an STK push submission.
///
/// Every field is optional because the gateway replies with a completely different shape
/// (`errorCode`/`errorMessage`) when the request is malformed or unauthorized.
#[derive(Debug, Clone, Deserialize)]
pub struct StkPushResponse {
    #[serde(rename = "ResponseCode", default)]
    pub response_code: Option<String>,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: Option<String>,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: Option<String>,
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: Option<String>,
    #[serde(rename = "CustomerMessage", default)]
    pub customer_message: Option<String>,
    #[serde(rename = "errorCode", default)]
    pub error_code: Option<String>,
    #[serde(rename = "errorMessage", default)]
    pub error_message: Option<String>,
}

/// The outcome of a successfully accepted STK push submission.
///
/// `checkout_request_id` is the correlation id that the asynchronous callback will carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StkPushSubmission {
    pub checkout_request_id: String,
    pub merchant_request_id: String,
}

//------------------------------------     Asynchronous callback     --------------------------------------------------

/// The envelope Daraja POSTs to the callback URL: `{"Body": {"stkCallback": {...}}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StkCallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: StkCallbackBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StkCallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: Option<String>,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: Option<String>,
    /// "0" denotes success. Daraja sends this as a JSON number, but sandbox payloads have been
    /// observed with a string, so both are accepted.
    #[serde(rename = "ResultCode", default, deserialize_with = "code_as_string")]
    pub result_code: Option<String>,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: Option<String>,
    #[serde(rename = "CallbackMetadata", default)]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub item: Vec<CallbackItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Option<Value>,
}

impl StkCallback {
    /// The M-Pesa receipt number, present in the metadata items on successful payments only.
    pub fn receipt_number(&self) -> Option<String> {
        self.metadata_value("MpesaReceiptNumber")
    }

    fn metadata_value(&self, name: &str) -> Option<String> {
        let items = &self.callback_metadata.as_ref()?.item;
        items.iter().find(|i| i.name == name).and_then(|i| i.value.as_ref()).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

fn code_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where D: Deserializer<'de> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

#[cfg(test)]
mod test {
    use super::*;

    const SUCCESS_CALLBACK: &str = r#"{
      "Body": {
        "stkCallback": {
          "MerchantRequestID": "29115-34620561-1",
          "CheckoutRequestID": "ws_CO_191220191020363925",
          "ResultCode": 0,
          "ResultDesc": "The service request is processed successfully.",
          "CallbackMetadata": {
            "Item": [
              { "Name": "Amount", "Value": 1000.00 },
              { "Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV" },
              { "Name": "TransactionDate", "Value": 20191219102115 },
              { "Name": "PhoneNumber", "Value": 254712345678 }
            ]
          }
        }
      }
    }"#;

    const FAILURE_CALLBACK: &str = r#"{
      "Body": {
        "stkCallback": {
          "MerchantRequestID": "29115-34620561-1",
          "CheckoutRequestID": "ws_CO_191220191020363925",
          "ResultCode": 1032,
          "ResultDesc": "Request cancelled by user."
        }
      }
    }"#;

    #[test]
    fn parse_success_callback() {
        let envelope: StkCallbackEnvelope = serde_json::from_str(SUCCESS_CALLBACK).unwrap();
        let callback = envelope.body.stk_callback;
        assert_eq!(callback.checkout_request_id.as_deref(), Some("ws_CO_191220191020363925"));
        assert_eq!(callback.result_code.as_deref(), Some("0"));
        assert_eq!(callback.receipt_number().as_deref(), Some("NLJ7RT61SV"));
    }

    #[test]
    fn parse_failure_callback() {
        let envelope: StkCallbackEnvelope = serde_json::from_str(FAILURE_CALLBACK).unwrap();
        let callback = envelope.body.stk_callback;
        assert_eq!(callback.result_code.as_deref(), Some("1032"));
        assert!(callback.receipt_number().is_none());
    }

    #[test]
    fn result_code_accepts_string_form() {
        let json = r#"{"Body":{"stkCallback":{"CheckoutRequestID":"x","ResultCode":"0","ResultDesc":"ok"}}}"#;
        let envelope: StkCallbackEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.body.stk_callback.result_code.as_deref(), Some("0"));
    }

    #[test]
    fn stk_push_request_uses_daraja_field_names() {
        let request = StkPushRequest {
            business_short_code: "174379".into(),
            password: "cGFzcw==".into(),
            timestamp: "20240815121500".into(),
            transaction_type: "CustomerPayBillOnline".into(),
            amount: 1000,
            party_a: "254712345678".into(),
            party_b: "174379".into(),
            phone_number: "254712345678".into(),
            callback_url: "https://example.com/payments/callback".into(),
            account_reference: "DPS-00000001".into(),
            transaction_desc: "Payment for order DPS-00000001".into(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["BusinessShortCode"], "174379");
        assert_eq!(json["CallBackURL"], "https://example.com/payments/callback");
        assert_eq!(json["Amount"], 1000);
    }
}
