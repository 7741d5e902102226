use serde::{Deserialize, Serialize};

use supplynet_core::{ContactId, DomainError, DomainResult, Entity};

/// Largest building number we accept: at most five digits.
const MAX_BUILDING: u32 = 99_999;

/// Address/contact details attachable to one or more network nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: ContactId,
    pub department: Option<String>,
    pub email: String,
    pub country: String,
    pub city: String,
    pub street: Option<String>,
    pub building: Option<u32>,
}

impl ContactRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: ContactId,
        department: Option<String>,
        email: String,
        country: String,
        city: String,
        street: Option<String>,
        building: Option<u32>,
    ) -> DomainResult<Self> {
        let contact = Self {
            id,
            department,
            email,
            country,
            city,
            street,
            building,
        };
        contact.validate()?;
        Ok(contact)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if !is_plausible_email(&self.email) {
            return Err(DomainError::validation(format!(
                "'{}' is not a valid email address",
                self.email
            )));
        }
        if self.country.trim().is_empty() {
            return Err(DomainError::validation("country cannot be empty"));
        }
        if self.city.trim().is_empty() {
            return Err(DomainError::validation("city cannot be empty"));
        }
        if let Some(building) = self.building {
            if building > MAX_BUILDING {
                return Err(DomainError::validation(
                    "number of building should not exceed 5 characters",
                ));
            }
        }
        Ok(())
    }

    /// Single-line address used by the brief node listing.
    pub fn address_line(&self) -> String {
        format!(
            "{}, {}, {}-{}",
            self.country,
            self.city,
            self.street.as_deref().unwrap_or(""),
            self.building.map(|b| b.to_string()).unwrap_or_default(),
        )
    }
}

/// Minimal shape check: `local@domain.tld`. Full RFC parsing is not a goal.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

impl Entity for ContactRecord {
    type Id = ContactId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(email: &str, building: Option<u32>) -> DomainResult<ContactRecord> {
        ContactRecord::new(
            ContactId::new(),
            Some("sales".to_string()),
            email.to_string(),
            "Norway".to_string(),
            "Oslo".to_string(),
            Some("Storgata".to_string()),
            building,
        )
    }

    #[test]
    fn well_formed_contact_validates() {
        let c = contact("sales@factory.example.com", Some(12)).unwrap();
        assert_eq!(c.city, "Oslo");
    }

    #[test]
    fn email_without_at_sign_is_rejected() {
        assert!(contact("factory.example.com", None).is_err());
    }

    #[test]
    fn email_without_domain_dot_is_rejected() {
        assert!(contact("sales@factory", None).is_err());
        assert!(contact("sales@.com", None).is_err());
    }

    #[test]
    fn building_number_is_capped_at_five_digits() {
        assert!(contact("a@b.co", Some(99_999)).is_ok());
        let err = contact("a@b.co", Some(100_000)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn address_line_joins_fields() {
        let c = contact("a@b.co", Some(7)).unwrap();
        assert_eq!(c.address_line(), "Norway, Oslo, Storgata-7");
    }

    #[test]
    fn address_line_tolerates_missing_street_and_building() {
        let c = ContactRecord::new(
            ContactId::new(),
            None,
            "a@b.co".to_string(),
            "Norway".to_string(),
            "Oslo".to_string(),
            None,
            None,
        )
        .unwrap();
        assert_eq!(c.address_line(), "Norway, Oslo, -");
    }
}
