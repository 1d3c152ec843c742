//! Typed webhook payloads and the subscription documents that project them.
//!
//! The subscription queries are the contract with Saleor: a field absent from
//! the selection is never delivered, so handlers must only read fields the
//! corresponding document selects.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookEventType {
    PaymentGatewayInitializeSession,
    TransactionInitializeSession,
}

impl WebhookEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEventType::PaymentGatewayInitializeSession => {
                "PAYMENT_GATEWAY_INITIALIZE_SESSION"
            }
            WebhookEventType::TransactionInitializeSession => "TRANSACTION_INITIALIZE_SESSION",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataItem {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub id: String,
    #[serde(default)]
    pub metadata: Vec<MetadataItem>,
    #[serde(default)]
    pub private_metadata: Vec<MetadataItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuingPrincipal {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Channel {
    pub id: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Money {
    pub amount: f64,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxedMoney {
    pub gross: Money,
    pub net: Option<Money>,
    pub tax: Option<Money>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryRef {
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub street_address1: Option<String>,
    pub street_address2: Option<String>,
    pub postal_code: Option<String>,
    pub country_area: Option<String>,
    pub company_name: Option<String>,
    pub country: Option<CountryRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryMethod {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductRef {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantRef {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub product: Option<ProductRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub id: Option<String>,
    pub quantity: i64,
    pub total_price: Option<TaxedMoney>,
    #[serde(alias = "checkoutVariant", alias = "orderVariant")]
    pub variant: Option<VariantRef>,
}

/// Fields shared by the checkout and order shapes of a source object. The
/// subscription aliases `email`/`totalPrice` on checkouts so both variants
/// arrive with identical keys.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceObjectFields {
    pub id: String,
    pub channel: Option<Channel>,
    #[serde(alias = "languageCodeEnum")]
    pub language_code: Option<String>,
    pub user_email: Option<String>,
    pub billing_address: Option<Address>,
    pub shipping_address: Option<Address>,
    pub total: Option<TaxedMoney>,
    pub shipping_price: Option<TaxedMoney>,
    pub delivery_method: Option<DeliveryMethod>,
    pub lines: Option<Vec<Line>>,
}

/// The platform entity a payment session is attached to.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "__typename")]
pub enum SourceObject {
    Checkout(SourceObjectFields),
    Order(SourceObjectFields),
}

impl SourceObject {
    pub fn fields(&self) -> &SourceObjectFields {
        match self {
            SourceObject::Checkout(fields) | SourceObject::Order(fields) => fields,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentGatewayInitializeSessionEvent {
    pub recipient: Option<Recipient>,
    pub data: Option<serde_json::Value>,
    pub amount: Option<f64>,
    pub issuing_principal: Option<IssuingPrincipal>,
    pub source_object: Option<SourceObject>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionActionType {
    Authorization,
    Charge,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionAction {
    pub amount: f64,
    pub currency: String,
    pub action_type: Option<TransactionActionType>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRef {
    pub id: String,
    pub psp_reference: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInitializeSessionEvent {
    pub recipient: Option<Recipient>,
    pub data: Option<serde_json::Value>,
    pub merchant_reference: Option<String>,
    pub action: TransactionAction,
    pub issuing_principal: Option<IssuingPrincipal>,
    pub transaction: TransactionRef,
    pub source_object: Option<SourceObject>,
}

/// Result enum Saleor accepts on a transaction session response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionResultType {
    AuthorizationSuccess,
    AuthorizationFailure,
    ChargeSuccess,
    ChargeFailure,
}

/// Synchronous response the platform interprets as the authorization
/// outcome. Omitting any field makes Saleor treat the delivery as malformed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResult {
    pub psp_reference: String,
    pub result: TransactionResultType,
    pub amount: f64,
    pub time: String,
    pub external_url: String,
    pub message: String,
}

/// Subscription document for PAYMENT_GATEWAY_INITIALIZE_SESSION.
pub const PAYMENT_GATEWAY_INITIALIZE_SUBSCRIPTION: &str = r#"
fragment PaymentGatewayInitializeSessionEvent on PaymentGatewayInitializeSession {
  __typename
  recipient {
    id
    privateMetadata { key value }
    metadata { key value }
  }
  data
  amount
  issuingPrincipal { ... on Node { id } }
  sourceObject {
    __typename
    ... on Checkout {
      id
      channel { id slug }
      languageCode
      billingAddress { country { code } }
      total: totalPrice { gross { currency amount } }
    }
    ... on Order {
      id
      channel { id slug }
      languageCodeEnum
      userEmail
      billingAddress { country { code } }
      total { gross { currency amount } }
    }
  }
}

subscription PaymentGatewayInitializeSession {
  event { ...PaymentGatewayInitializeSessionEvent }
}
"#;

/// Subscription document for TRANSACTION_INITIALIZE_SESSION.
pub const TRANSACTION_INITIALIZE_SUBSCRIPTION: &str = r#"
fragment TransactionInitializeSessionAddress on Address {
  firstName
  lastName
  phone
  city
  streetAddress1
  streetAddress2
  postalCode
  countryArea
  companyName
  country { code }
}

fragment OrderOrCheckoutLines on OrderOrCheckout {
  __typename
  ... on Checkout {
    shippingPrice {
      gross { currency amount }
      net { currency amount }
      tax { currency amount }
    }
    deliveryMethod {
      __typename
      ... on ShippingMethod { id name }
    }
    lines {
      __typename
      id
      quantity
      totalPrice {
        gross { currency amount }
        net { currency amount }
        tax { currency amount }
      }
      checkoutVariant: variant {
        name
        sku
        product { name }
      }
    }
  }
  ... on Order {
    shippingPrice {
      gross { currency amount }
      net { currency amount }
      tax { currency amount }
    }
    deliveryMethod {
      __typename
      ... on ShippingMethod { id name }
    }
    lines {
      __typename
      id
      quantity
      totalPrice {
        gross { currency amount }
        net { currency amount }
        tax { currency amount }
      }
      orderVariant: variant {
        name
        sku
        product { name }
      }
    }
  }
}

fragment OrderOrCheckoutSourceObject on OrderOrCheckout {
  __typename
  ... on Checkout {
    id
    languageCode
    channel { id slug }
    userEmail: email
    billingAddress { ...TransactionInitializeSessionAddress }
    shippingAddress { ...TransactionInitializeSessionAddress }
    total: totalPrice { gross { currency amount } }
    ...OrderOrCheckoutLines
  }
  ... on Order {
    id
    languageCodeEnum
    userEmail
    channel { id slug }
    billingAddress { ...TransactionInitializeSessionAddress }
    shippingAddress { ...TransactionInitializeSessionAddress }
    total { gross { currency amount } }
    ...OrderOrCheckoutLines
  }
}

fragment TransactionInitializeSessionEvent on TransactionInitializeSession {
  __typename
  recipient {
    id
    privateMetadata { key value }
    metadata { key value }
  }
  data
  merchantReference
  action { amount currency actionType }
  issuingPrincipal { ... on Node { id } }
  transaction { id pspReference }
  sourceObject {
    __typename
    ...OrderOrCheckoutSourceObject
  }
}

subscription TransactionInitializeSession {
  event { ...TransactionInitializeSessionEvent }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_object_fields_reach_both_variants() {
        for typename in ["Checkout", "Order"] {
            let json = serde_json::json!({
                "__typename": typename,
                "id": "U291cmNlOjE=",
                "channel": { "id": "Q2hhbm5lbDox", "slug": "default-channel" },
                "total": { "gross": { "amount": 12.5, "currency": "PLN" } }
            });
            let source: SourceObject = serde_json::from_value(json).unwrap();
            let fields = source.fields();
            assert_eq!(fields.id, "U291cmNlOjE=");
            assert_eq!(fields.channel.as_ref().unwrap().slug, "default-channel");
            assert_eq!(
                fields.total.as_ref().unwrap().gross.currency,
                "PLN"
            );
        }
    }
}
