use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    Paypal,
    BankTransfer,
}

impl PaymentMethodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodType::Paypal => "paypal",
            PaymentMethodType::BankTransfer => "bank_transfer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "paypal" => Some(PaymentMethodType::Paypal),
            "bank_transfer" => Some(PaymentMethodType::BankTransfer),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethodType::Paypal => "PayPal",
            PaymentMethodType::BankTransfer => "Bank Transfer",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaypalSettings {
    pub paypal_email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BankTransferSettings {
    pub bank_name: String,
    pub account_name: String,
    pub sort_code: String,
    pub account_number: String,
}

/// Per-type configuration. The tag doubles as the `method_type` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method_type", content = "settings", rename_all = "snake_case")]
pub enum PaymentSettings {
    Paypal(PaypalSettings),
    BankTransfer(BankTransferSettings),
}

impl PaymentSettings {
    pub fn method_type(&self) -> PaymentMethodType {
        match self {
            PaymentSettings::Paypal(_) => PaymentMethodType::Paypal,
            PaymentSettings::BankTransfer(_) => PaymentMethodType::BankTransfer,
        }
    }

    /// Rebuilds settings from the stored column pair. Fields belonging to
    /// another method type are rejected.
    pub fn from_parts(
        method_type: PaymentMethodType,
        settings: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        let settings = if settings.is_null() {
            serde_json::json!({})
        } else {
            settings
        };
        match method_type {
            PaymentMethodType::Paypal => serde_json::from_value(settings).map(PaymentSettings::Paypal),
            PaymentMethodType::BankTransfer => {
                serde_json::from_value(settings).map(PaymentSettings::BankTransfer)
            }
        }
    }

    /// Whether every field a customer needs to pay this way is filled in.
    pub fn is_configured(&self) -> bool {
        match self {
            PaymentSettings::Paypal(s) => !s.paypal_email.trim().is_empty(),
            PaymentSettings::BankTransfer(s) => [
                &s.bank_name,
                &s.account_name,
                &s.sort_code,
                &s.account_number,
            ]
            .iter()
            .all(|field| !field.trim().is_empty()),
        }
    }

    /// The settings body alone, as stored in the `settings` column.
    pub fn to_value(&self) -> serde_json::Value {
        let value = match self {
            PaymentSettings::Paypal(s) => serde_json::to_value(s),
            PaymentSettings::BankTransfer(s) => serde_json::to_value(s),
        };
        value.unwrap_or_else(|_| serde_json::json!({}))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethod {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    #[serde(flatten)]
    pub settings: PaymentSettings,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_paypal() {
        let settings = PaymentSettings::from_parts(
            PaymentMethodType::Paypal,
            serde_json::json!({"paypal_email": "pay@example.com"}),
        )
        .unwrap();
        assert_eq!(
            settings,
            PaymentSettings::Paypal(PaypalSettings {
                paypal_email: "pay@example.com".to_string()
            })
        );
        assert_eq!(settings.method_type(), PaymentMethodType::Paypal);
    }

    #[test]
    fn test_from_parts_rejects_foreign_fields() {
        let result = PaymentSettings::from_parts(
            PaymentMethodType::Paypal,
            serde_json::json!({"bank_name": "Barclays"}),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_parts_null_defaults() {
        let settings =
            PaymentSettings::from_parts(PaymentMethodType::BankTransfer, serde_json::Value::Null)
                .unwrap();
        assert_eq!(
            settings,
            PaymentSettings::BankTransfer(BankTransferSettings::default())
        );
    }

    #[test]
    fn test_blank_settings_are_not_configured() {
        let paypal = PaymentSettings::from_parts(
            PaymentMethodType::Paypal,
            serde_json::json!({"paypal_email": "  "}),
        )
        .unwrap();
        assert!(!paypal.is_configured());

        let partial_bank = PaymentSettings::from_parts(
            PaymentMethodType::BankTransfer,
            serde_json::json!({"bank_name": "Barclays", "account_name": "L&C Cleaning"}),
        )
        .unwrap();
        assert!(!partial_bank.is_configured());

        let paypal = PaymentSettings::from_parts(
            PaymentMethodType::Paypal,
            serde_json::json!({"paypal_email": "pay@example.com"}),
        )
        .unwrap();
        assert!(paypal.is_configured());
    }

    #[test]
    fn test_payment_method_serializes_tag_and_settings() {
        let method = PaymentMethod {
            id: 2,
            name: "Bank Transfer".to_string(),
            description: None,
            is_active: true,
            settings: PaymentSettings::BankTransfer(BankTransferSettings {
                bank_name: "Barclays".to_string(),
                account_name: "L&C Cleaning".to_string(),
                sort_code: "20-00-00".to_string(),
                account_number: "12345678".to_string(),
            }),
            created_at: chrono::NaiveDateTime::default(),
            updated_at: chrono::NaiveDateTime::default(),
        };
        let json = serde_json::to_value(&method).unwrap();
        assert_eq!(json["method_type"], "bank_transfer");
        assert_eq!(json["settings"]["sort_code"], "20-00-00");
        assert_eq!(json["name"], "Bank Transfer");
    }
}
