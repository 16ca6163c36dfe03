use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{impl_entity, lenient, EntityKind};

/// The address attributes shared by establishments, units, professionals and
/// customers. Owners receive these flattened into their own payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressFields {
    #[serde(default)]
    pub post_code: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub number: Option<i32>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub compliment: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_number")]
    pub longitude: Option<f64>,
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

impl AddressFields {
    /// True when no field carries a value. Empty strings count as absent,
    /// numbers count as present whenever supplied.
    pub fn is_empty(&self) -> bool {
        blank(&self.post_code)
            && blank(&self.street)
            && self.number.is_none()
            && blank(&self.neighborhood)
            && blank(&self.city)
            && blank(&self.state)
            && blank(&self.compliment)
            && self.latitude.is_none()
            && self.longitude.is_none()
    }

    /// Incoming values layered over `stored`. Absent fields keep the stored
    /// value; an empty string is written through and clears it.
    pub fn merged_over(&self, stored: &AddressFields) -> AddressFields {
        fn text(incoming: &Option<String>, stored: &Option<String>) -> Option<String> {
            incoming.clone().or_else(|| stored.clone())
        }

        AddressFields {
            post_code: text(&self.post_code, &stored.post_code),
            street: text(&self.street, &stored.street),
            number: self.number.or(stored.number),
            neighborhood: text(&self.neighborhood, &stored.neighborhood),
            city: text(&self.city, &stored.city),
            state: text(&self.state, &stored.state),
            compliment: text(&self.compliment, &stored.compliment),
            latitude: self.latitude.or(stored.latitude),
            longitude: self.longitude.or(stored.longitude),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: AddressFields,
}

impl_entity!(Address, EntityKind::Address);
