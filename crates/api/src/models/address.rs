//! Shipping addresses, stored as JSONB on orders and buyer profiles.

use serde::{Deserialize, Serialize};

/// A postal shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Check that every required field has content.
    ///
    /// # Errors
    ///
    /// Returns the name of the first blank field.
    pub fn validate(&self) -> Result<(), &'static str> {
        let required = [
            ("full_name", &self.full_name),
            ("line1", &self.line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
            ("phone", &self.phone),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(*field),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Meera Gond".to_string(),
            line1: "12 Craft Lane".to_string(),
            line2: None,
            city: "Bhopal".to_string(),
            state: "Madhya Pradesh".to_string(),
            postal_code: "462001".to_string(),
            country: "IN".to_string(),
            phone: "+91 98000 00000".to_string(),
        }
    }

    #[test]
    fn test_valid_address() {
        assert_eq!(address().validate(), Ok(()));
    }

    #[test]
    fn test_blank_field_reported() {
        let mut a = address();
        a.city = "  ".to_string();
        assert_eq!(a.validate(), Err("city"));
    }

    #[test]
    fn test_line2_optional_in_json() {
        let json = r#"{"full_name":"A","line1":"B","city":"C","state":"D",
            "postal_code":"E","country":"F","phone":"G"}"#;
        let parsed: Result<ShippingAddress, _> = serde_json::from_str(json);
        assert!(parsed.is_ok_and(|a| a.line2.is_none()));
    }
}
