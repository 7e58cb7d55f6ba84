//! Book model and related types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Cover type of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum CoverType {
    Hard,
    Soft,
}

impl CoverType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverType::Hard => "HARD",
            CoverType::Soft => "SOFT",
        }
    }
}

impl std::fmt::Display for CoverType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CoverType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HARD" => Ok(CoverType::Hard),
            "SOFT" => Ok(CoverType::Soft),
            _ => Err(format!("Invalid cover type: {}", s)),
        }
    }
}

// Stored as TEXT constrained by a CHECK
impl sqlx::Type<Postgres> for CoverType {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for CoverType {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for CoverType {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Book record. `inventory` is the number of copies currently on the shelf.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub cover: CoverType,
    pub inventory: i32,
    #[schema(value_type = String, example = "0.50")]
    pub daily_fee: Decimal,
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.title, self.author)
    }
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"))]
    pub author: String,
    pub cover: CoverType,
    #[validate(range(min = 1, message = "Amount of books can not be 0 or negative number"))]
    pub inventory: i32,
    #[validate(custom(function = "validate_daily_fee"))]
    #[schema(value_type = String, example = "0.50")]
    pub daily_fee: Decimal,
}

/// Update book request, absent fields are left untouched
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"))]
    pub author: Option<String>,
    pub cover: Option<CoverType>,
    #[validate(range(min = 1, message = "Amount of books can not be 0 or negative number"))]
    pub inventory: Option<i32>,
    #[validate(custom(function = "validate_daily_fee"))]
    #[schema(value_type = Option<String>, example = "0.50")]
    pub daily_fee: Option<Decimal>,
}

fn validate_daily_fee(fee: &Decimal) -> Result<(), ValidationError> {
    if fee.is_sign_negative() && !fee.is_zero() {
        return Err(ValidationError::new("daily_fee")
            .with_message("Daily fee can not be negative".into()));
    }
    // NUMERIC(12, 2)
    if fee.normalize().scale() > 2 {
        return Err(ValidationError::new("daily_fee")
            .with_message("Daily fee allows at most 2 decimal places".into()));
    }
    if fee.trunc() >= Decimal::from(10_000_000_000i64) {
        return Err(ValidationError::new("daily_fee")
            .with_message("Daily fee allows at most 10 integer digits".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn create_book(inventory: i32, fee: &str) -> CreateBook {
        CreateBook {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            cover: CoverType::Hard,
            inventory,
            daily_fee: Decimal::from_str(fee).unwrap(),
        }
    }

    #[test]
    fn test_cover_type_serde() {
        assert_eq!(serde_json::to_string(&CoverType::Soft).unwrap(), "\"SOFT\"");
        let cover: CoverType = serde_json::from_str("\"HARD\"").unwrap();
        assert_eq!(cover, CoverType::Hard);
        assert!(serde_json::from_str::<CoverType>("\"PAPER\"").is_err());
    }

    #[test]
    fn test_cover_type_from_str() {
        assert_eq!("soft".parse::<CoverType>().unwrap(), CoverType::Soft);
        assert!("".parse::<CoverType>().is_err());
    }

    #[test]
    fn test_book_display() {
        let book = Book {
            id: 1,
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            cover: CoverType::Soft,
            inventory: 3,
            daily_fee: Decimal::new(50, 2),
        };
        assert_eq!(book.to_string(), "Dune(Frank Herbert)");
    }

    #[test]
    fn test_inventory_must_be_positive() {
        assert!(create_book(1, "0.50").validate().is_ok());
        let errors = create_book(0, "0.50").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("inventory"));
        assert!(create_book(-3, "0.50").validate().is_err());
    }

    #[test]
    fn test_daily_fee_rules() {
        assert!(create_book(1, "0").validate().is_ok());
        assert!(create_book(1, "1.50").validate().is_ok());
        assert!(create_book(1, "1.500").validate().is_ok());
        assert!(create_book(1, "-0.01").validate().is_err());
        assert!(create_book(1, "0.125").validate().is_err());
    }

    #[test]
    fn test_update_book_skips_absent_fields() {
        assert!(UpdateBook::default().validate().is_ok());
        let update = UpdateBook {
            inventory: Some(0),
            ..UpdateBook::default()
        };
        assert!(update.validate().is_err());
    }
}
