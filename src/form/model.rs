/*
 * Responsibility
 * - form-side profile (EmployeeProfile) and the editable Field set
 * - remote shapes: EmployeeRecord (read), EmployeeUpdatePayload (write)
 * - reference data: Position, Region
 * - PendingImage (unsaved avatar)
 */
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::form::date;

pub type RegionCode = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    /// Maps the localized label stored on the employee record.
    pub fn from_display_label(label: &str) -> Self {
        match label {
            "Nam" => Gender::Male,
            "Nữ" => Gender::Female,
            _ => Gender::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        }
    }
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            "OTHER" => Ok(Gender::Other),
            _ => Err(()),
        }
    }
}

/// Editable, free-input fields. Region selections go through the cascade instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    LastName,
    FirstName,
    Email,
    PhoneNumber,
    Gender,
    DateOfBirth,
    Salary,
    Position,
    StreetName,
}

impl Field {
    pub const REQUIRED: [Field; 7] = [
        Field::Email,
        Field::FirstName,
        Field::LastName,
        Field::Gender,
        Field::PhoneNumber,
        Field::DateOfBirth,
        Field::Salary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::LastName => "last_name",
            Field::FirstName => "first_name",
            Field::Email => "email",
            Field::PhoneNumber => "phone_number",
            Field::Gender => "gender",
            Field::DateOfBirth => "date_of_birth",
            Field::Salary => "salary",
            Field::Position => "position",
            Field::StreetName => "street_name",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    pub city: String,
    pub district: String,
    pub ward: String,
    pub street_name: String,
}

/// Profile as edited in the form. Text fields hold raw input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmployeeProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub gender: Option<Gender>,
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
    pub salary: String,
    pub position: Option<i64>,
    pub avatar: Option<String>,
    pub address: Address,
}

impl EmployeeProfile {
    /// Raw text of a field, as validation sees it.
    pub fn value(&self, field: Field) -> String {
        match field {
            Field::LastName => self.last_name.clone(),
            Field::FirstName => self.first_name.clone(),
            Field::Email => self.email.clone(),
            Field::PhoneNumber => self.phone_number.clone(),
            Field::Gender => self.gender.map(|g| g.as_str().to_string()).unwrap_or_default(),
            Field::DateOfBirth => self.date_of_birth.clone(),
            Field::Salary => self.salary.clone(),
            Field::Position => self.position.map(|p| p.to_string()).unwrap_or_default(),
            Field::StreetName => self.address.street_name.clone(),
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::LastName => self.last_name = value,
            Field::FirstName => self.first_name = value,
            Field::Email => self.email = value,
            Field::PhoneNumber => self.phone_number = value,
            Field::Gender => self.gender = value.parse().ok(),
            Field::DateOfBirth => self.date_of_birth = value,
            Field::Salary => self.salary = value,
            Field::Position => self.position = value.trim().parse().ok(),
            Field::StreetName => self.address.street_name = value,
        }
    }

    pub fn from_record(record: &EmployeeRecord) -> Self {
        let address = record.employee_address.clone().unwrap_or_default();

        let date_of_birth = record
            .date_of_birth
            .as_deref()
            .and_then(|d| date::from_transport(d).ok())
            .unwrap_or_default();

        Self {
            first_name: record.first_name.clone().unwrap_or_default(),
            last_name: record.last_name.clone().unwrap_or_default(),
            email: record.email.clone().unwrap_or_default(),
            phone_number: record.phone_number.clone().unwrap_or_default(),
            gender: Some(Gender::from_display_label(
                record.gender.as_deref().unwrap_or_default(),
            )),
            date_of_birth,
            salary: record
                .salaries
                .as_ref()
                .map(|n| n.to_string())
                .unwrap_or_default(),
            position: record.position.as_ref().map(|p| p.id),
            avatar: record.avatar.clone().filter(|a| !a.is_empty()),
            address: Address {
                city: address.city.unwrap_or_default(),
                district: address.district.unwrap_or_default(),
                ward: address.ward.unwrap_or_default(),
                street_name: address.street_name.unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub code: RegionCode,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EmployeeAddressRecord {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, rename = "cityId")]
    pub city_id: Option<RegionCode>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default, rename = "districtId")]
    pub district_id: Option<RegionCode>,
    #[serde(default)]
    pub ward: Option<String>,
    #[serde(default, rename = "streetName")]
    pub street_name: Option<String>,
}

/// Employee record as returned by the employee-record API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EmployeeRecord {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Localized label, e.g. "Nam" / "Nữ".
    #[serde(default)]
    pub gender: Option<String>,
    /// Transport format `DD/MM/YYYY | HH:MM:SS`.
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub salaries: Option<serde_json::Number>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub employee_address: Option<EmployeeAddressRecord>,
}

/// Body of the profile-update call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeUpdatePayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub gender: Option<Gender>,
    /// Transport format.
    pub date_of_birth: String,
    pub salary: String,
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    pub city_id: Option<RegionCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    pub district_id: Option<RegionCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ward: Option<String>,
    #[serde(rename = "streetName")]
    pub street_name: String,
}

/// A locally chosen avatar, not yet uploaded.
#[derive(Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub preview: String,
}

impl PendingImage {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
            preview: format!("pending://{}", Uuid::new_v4()),
        }
    }
}

impl fmt::Debug for PendingImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingImage")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .field("preview", &self.preview)
            .finish()
    }
}
