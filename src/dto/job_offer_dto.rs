use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::error::Result;
use crate::models::job_offer::{JobOffer, JobOfferChanges, NewJobOffer};
use crate::utils::validation::{
    after_today, check_salary_range, error_with_message, non_negative, validate_with,
};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJobOfferPayload {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(length(max = 255))]
    pub location: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub company_name: String,
    #[validate(
        length(min = 1, max = 100),
        custom(function = "crate::utils::validation::contract_type")
    )]
    pub contract_type: String,
    #[validate(custom(function = "crate::utils::validation::non_negative"))]
    pub salary_min: Option<Decimal>,
    #[validate(custom(function = "crate::utils::validation::non_negative"))]
    pub salary_max: Option<Decimal>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[validate(custom(function = "crate::utils::validation::after_today"))]
    pub expires_at: Option<NaiveDate>,
    pub requirements: Option<String>,
    pub benefits: Option<String>,
}

impl CreateJobOfferPayload {
    pub fn check(&self) -> Result<()> {
        validate_with(self, |errors| {
            check_salary_range(errors, self.salary_min, self.salary_max)
        })
    }

    pub fn into_new_offer(self, owner_id: i64) -> NewJobOffer {
        NewJobOffer {
            title: self.title,
            description: self.description,
            location: self.location,
            company_name: self.company_name,
            contract_type: self.contract_type,
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            is_active: self.is_active,
            expires_at: self.expires_at,
            requirements: self.requirements,
            benefits: self.benefits,
            user_id: owner_id,
        }
    }
}

/// Keeps an explicit `null` apart from an absent key: absent is `None`,
/// `null` is `Some(None)`.
fn nullable<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateJobOfferPayload {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
    #[validate(length(min = 1, max = 255))]
    pub company_name: Option<String>,
    #[validate(
        length(min = 1, max = 100),
        custom(function = "crate::utils::validation::contract_type")
    )]
    pub contract_type: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<Option<Decimal>>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub benefits: Option<Option<String>>,
}

impl UpdateJobOfferPayload {
    pub fn check(&self) -> Result<()> {
        validate_with(self, |errors| {
            if let Some(Some(location)) = &self.location {
                if location.chars().count() > 255 {
                    errors.add(
                        "location",
                        error_with_message(
                            "length",
                            "The location may not be greater than 255 characters.",
                        ),
                    );
                }
            }
            for (field, salary) in [("salary_min", self.salary_min), ("salary_max", self.salary_max)] {
                if let Some(Some(value)) = salary {
                    if let Err(error) = non_negative(&value) {
                        errors.add(field, error);
                    }
                }
            }
            if let Some(Some(date)) = self.expires_at {
                if let Err(error) = after_today(&date) {
                    errors.add("expires_at", error);
                }
            }
            check_salary_range(errors, self.salary_min.flatten(), self.salary_max.flatten())
        })
    }
}

impl From<UpdateJobOfferPayload> for JobOfferChanges {
    fn from(value: UpdateJobOfferPayload) -> Self {
        Self {
            title: value.title,
            description: value.description,
            location: value.location,
            company_name: value.company_name,
            contract_type: value.contract_type,
            salary_min: value.salary_min,
            salary_max: value.salary_max,
            is_active: value.is_active,
            expires_at: value.expires_at,
            requirements: value.requirements,
            benefits: value.benefits,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobOfferStatisticsQuery {
    pub recruiter_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOfferListResponse {
    pub job_offers: Vec<JobOffer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOfferResponse {
    pub job_offer: JobOffer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOfferMutationResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_offer: Option<JobOffer>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use chrono::Duration;

    fn payload() -> CreateJobOfferPayload {
        CreateJobOfferPayload {
            title: "Rust developer".into(),
            description: "Own the job board API".into(),
            location: Some("Lyon".into()),
            company_name: "TalentPool".into(),
            contract_type: "CDI".into(),
            salary_min: Some(Decimal::new(40000, 0)),
            salary_max: Some(Decimal::new(55000, 0)),
            is_active: true,
            expires_at: Some(crate::utils::time::today() + Duration::days(30)),
            requirements: None,
            benefits: None,
        }
    }

    fn failing_fields(result: Result<()>) -> Vec<String> {
        match result {
            Err(Error::Validation(errors)) => {
                crate::error::field_messages(&errors).into_keys().collect()
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(payload().check().is_ok());
    }

    #[test]
    fn inverted_salary_range_fails_on_salary_max() {
        let mut p = payload();
        p.salary_max = Some(Decimal::new(35000, 0));
        assert_eq!(failing_fields(p.check()), vec!["salary_max".to_string()]);
    }

    #[test]
    fn unknown_contract_type_and_past_expiry_fail() {
        let mut p = payload();
        p.contract_type = "Permanent".into();
        p.expires_at = Some(crate::utils::time::today());
        let fields = failing_fields(p.check());
        assert!(fields.contains(&"contract_type".to_string()));
        assert!(fields.contains(&"expires_at".to_string()));
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(UpdateJobOfferPayload::default().check().is_ok());
    }

    #[test]
    fn update_keeps_null_apart_from_absent() {
        let p: UpdateJobOfferPayload = serde_json::from_value(serde_json::json!({
            "expires_at": null,
            "salary_max": 52000
        }))
        .unwrap();
        assert_eq!(p.expires_at, Some(None));
        assert_eq!(p.salary_max, Some(Some(Decimal::new(52000, 0))));
        assert_eq!(p.location, None);
        assert!(p.check().is_ok());
    }

    #[test]
    fn update_checks_nullable_fields_when_present() {
        let p = UpdateJobOfferPayload {
            salary_min: Some(Some(Decimal::new(-5, 0))),
            expires_at: Some(Some(crate::utils::time::today())),
            ..Default::default()
        };
        let fields = failing_fields(p.check());
        assert!(fields.contains(&"salary_min".to_string()));
        assert!(fields.contains(&"expires_at".to_string()));
    }

    #[test]
    fn is_active_defaults_to_true() {
        let p: CreateJobOfferPayload = serde_json::from_value(serde_json::json!({
            "title": "Ops",
            "description": "Keep it running",
            "company_name": "Acme",
            "contract_type": "CDD"
        }))
        .unwrap();
        assert!(p.is_active);
    }
}
