use diesel::prelude::*;
use jiff_diesel::DateTime;
use serde::Deserialize;

/// Product category. Names are unique ignoring case and surrounding whitespace.
#[derive(Debug, Queryable, Selectable, Identifiable, Clone, PartialEq)]
#[diesel(table_name = crate::schema::categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime,
}

#[derive(Debug, Insertable, Deserialize, Clone)]
#[diesel(table_name = crate::schema::categories)]
pub struct NewCategory {
    pub name: String,
}

#[derive(Debug, AsChangeset, Deserialize, Clone)]
#[diesel(table_name = crate::schema::categories)]
pub struct UpdateCategory {
    pub name: String,
}
