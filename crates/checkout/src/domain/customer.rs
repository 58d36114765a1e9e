use serde::{Deserialize, Serialize};

/// A billing or shipping address in the shape the Store API expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub address_1: String,
    pub address_2: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country: String,
    /// Only billing addresses carry an email.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone: String,
}

impl Address {
    /// Looks up a property by its Store API name.
    pub fn get(&self, property: &str) -> Option<&str> {
        let value: &str = match property {
            "first_name" => &self.first_name,
            "last_name" => &self.last_name,
            "company" => &self.company,
            "address_1" => &self.address_1,
            "address_2" => &self.address_2,
            "city" => &self.city,
            "state" => &self.state,
            "postcode" => &self.postcode,
            "country" => &self.country,
            "email" => self.email.as_deref().unwrap_or_default(),
            "phone" => &self.phone,
            _ => return None,
        };
        Some(value)
    }
}
