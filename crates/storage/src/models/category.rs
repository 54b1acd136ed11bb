use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Age class × gender × division. Age classes are expressed as an inclusive
/// birth-year window so membership does not drift with the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Category {
    pub category_id: i32,
    pub name: String,
    pub age_class_code: String,
    pub gender_code: String,
    pub division_code: String,
    pub min_birth_year: i32,
    pub max_birth_year: i32,
}

impl Category {
    pub fn includes(&self, gender_code: &str, division_code: &str, birth_year: i32) -> bool {
        self.gender_code.eq_ignore_ascii_case(gender_code)
            && self.division_code.eq_ignore_ascii_case(division_code)
            && (self.min_birth_year..=self.max_birth_year).contains(&birth_year)
    }
}

/// First category, by id, that includes the archer.
pub fn category_for<'a>(
    categories: &'a [Category],
    gender_code: &str,
    division_code: &str,
    birth_year: i32,
) -> Option<&'a Category> {
    categories
        .iter()
        .filter(|c| c.includes(gender_code, division_code, birth_year))
        .min_by_key(|c| c.category_id)
}
