// src/models/user.rs

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique username, generated from name and date of birth.
    pub username: String,

    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub year_group: i32,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Staff accounts may use the admin endpoints.
    pub is_staff: bool,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Public identity returned at login and in reports.
#[derive(Debug, Serialize, FromRow)]
pub struct UserSummary {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 30, message = "First name must be 1 to 30 characters."))]
    pub first_name: String,
    #[validate(length(min = 1, max = 30, message = "Last name must be 1 to 30 characters."))]
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    #[validate(range(min = 1, max = 13, message = "Year group must be between 1 and 13."))]
    pub year_group: i32,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Query parameters for username generation.
#[derive(Debug, Deserialize)]
pub struct GenerateUsernameParams {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
}

/// Username stem: first three letters of the first name capitalized, first three
/// of the last name uppercased, then the birth month and day.
///
/// "Test", "User", 2000-01-01 gives "TesUSE0101".
pub fn username_base(first_name: &str, last_name: &str, date_of_birth: NaiveDate) -> String {
    let first: String = first_name.trim().chars().take(3).collect();
    let mut chars = first.chars();
    let first = match chars.next() {
        Some(c) => c.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    };

    let last: String = last_name.trim().chars().take(3).collect::<String>().to_uppercase();

    format!(
        "{}{}{:02}{:02}",
        first,
        last,
        date_of_birth.month(),
        date_of_birth.day()
    )
}

/// Appends a suffix when other usernames already share the stem.
pub fn disambiguate_username(base: &str, existing_with_prefix: i64) -> String {
    if existing_with_prefix > 0 {
        format!("{}_{}", base, existing_with_prefix + 1)
    } else {
        base.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_from_names_and_birthday() {
        let dob = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert_eq!(username_base("Test", "User", dob), "TesUSE0101");

        let dob = NaiveDate::from_ymd_opt(2008, 11, 23).unwrap();
        assert_eq!(username_base("aLIcE", "smith", dob), "AliSMI1123");
    }

    #[test]
    fn base_with_short_names() {
        let dob = NaiveDate::from_ymd_opt(2010, 5, 9).unwrap();
        assert_eq!(username_base("Al", "Li", dob), "AlLI0509");
    }

    #[test]
    fn collisions_get_a_suffix() {
        assert_eq!(disambiguate_username("TesUSE0101", 0), "TesUSE0101");
        assert_eq!(disambiguate_username("TesUSE0101", 1), "TesUSE0101_2");
        assert_eq!(disambiguate_username("TesUSE0101", 4), "TesUSE0101_5");
    }

    #[test]
    fn registration_validation() {
        let req = CreateUserRequest {
            first_name: "Test".into(),
            last_name: "User".into(),
            date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            year_group: 14,
            password: "password123".into(),
        };
        assert!(req.validate().is_err());

        let req = CreateUserRequest { year_group: 12, ..req };
        assert!(req.validate().is_ok());
    }
}
