use regex::Regex;
use std::sync::OnceLock;

/// Utility for parsing PostgreSQL constraint violation messages.
///
/// The storefront schema names its constraints `{table}_{column}_{suffix}`
/// (`categories_name_key`, `products_category_id_fkey`, `products_price_check`),
/// so most information can be recovered from the constraint name alone. The
/// `DETAIL` line supplies the offending value.
pub struct ConstraintParser;

/// Which side of a foreign key a violation came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForeignKeyViolation {
    /// A row points at a parent that does not exist
    MissingParent {
        parent: String,
        field: String,
        value: String,
    },
    /// A parent row is still referenced by children
    StillReferenced {
        parent: String,
        child: String,
        value: String,
    },
}

struct RegexPatterns {
    key_value: Regex,
    column_name: Regex,
    table_name: Regex,
    identifier: Regex,
}

impl RegexPatterns {
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // "Key (field)=(value)"; greedy so expression indexes such as
            // "Key (lower(btrim((name)::text)))=(Shoes)" keep their parentheses
            key_value: Regex::new(r"Key \((.+)\)=\((.*)\)")?,
            column_name: Regex::new(r#"column "([^"]+)""#)?,
            table_name: Regex::new(r#"table "([^"]+)""#)?,
            identifier: Regex::new(r"\(*([a-z_][a-z0-9_]*)\)*(?:::[a-z ]+)?\)*$")?,
        })
    }
}

static REGEX_PATTERNS: OnceLock<Option<RegexPatterns>> = OnceLock::new();

const CONSTRAINT_SUFFIXES: [&str; 5] = ["_fkey", "_pkey", "_key", "_idx", "_check"];

impl ConstraintParser {
    fn patterns() -> Option<&'static RegexPatterns> {
        REGEX_PATTERNS
            .get_or_init(|| RegexPatterns::new().ok())
            .as_ref()
    }

    /// Parses a unique constraint violation into `(entity, field, value)`.
    ///
    /// # Examples
    /// ```
    /// use storefront_rs::error::ConstraintParser;
    ///
    /// let message = "duplicate key value violates unique constraint \"categories_name_key\"\nDETAIL: Key (lower(btrim((name)::text)))=(shoes) already exists.";
    /// let result = ConstraintParser::parse_unique_violation(message, Some("categories_name_key"));
    /// assert_eq!(result, Some(("category".to_string(), "name".to_string(), "shoes".to_string())));
    /// ```
    pub fn parse_unique_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let key_value = Self::extract_key_value_from_message(message);

        if let Some((table, field)) = constraint_name.and_then(Self::parse_constraint_name) {
            let value = key_value
                .map(|(_, value)| value)
                .unwrap_or_else(|| "duplicate_value".to_string());
            return Some((Self::entity_name(&table), field, value));
        }

        let (field, value) = key_value?;
        let entity = Self::extract_table_from_message(message)
            .map(|t| Self::entity_name(&t))
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, field, value))
    }

    /// Parses a foreign key violation, telling apart a dangling reference on
    /// insert/update from a delete of a row that is still referenced.
    pub fn parse_foreign_key_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<ForeignKeyViolation> {
        let (_, value) = Self::extract_key_value_from_message(message)?;
        let (child_table, field) = constraint_name.and_then(Self::parse_constraint_name)?;

        if message.contains("is still referenced") || message.starts_with("update or delete") {
            let parent = Self::extract_table_from_message(message)
                .unwrap_or_else(|| field.trim_end_matches("_id").to_string());
            return Some(ForeignKeyViolation::StillReferenced {
                parent: Self::entity_name(&parent),
                child: child_table,
                value,
            });
        }

        let parent = field.trim_end_matches("_id").to_string();
        Some(ForeignKeyViolation::MissingParent {
            parent,
            field,
            value,
        })
    }

    /// Parses a not-null violation into `(entity, field)`.
    pub fn parse_not_null_violation(message: &str) -> Option<(String, String)> {
        let field = Self::extract_column_from_message(message)?;
        let entity = Self::extract_relation_from_message(message)
            .map(|t| Self::entity_name(&t))
            .unwrap_or_else(|| "resource".to_string());
        Some((entity, field))
    }

    /// Parses a check violation into `(entity, field)` using the constraint name.
    pub fn parse_check_violation(constraint_name: Option<&str>) -> Option<(String, String)> {
        let (table, field) = constraint_name.and_then(Self::parse_constraint_name)?;
        Some((Self::entity_name(&table), field))
    }

    /// Splits `{table}_{column}_{suffix}` into `(table, column)`.
    ///
    /// Tables are single words in this schema; column names may contain
    /// underscores (`category_id`).
    pub fn parse_constraint_name(constraint_name: &str) -> Option<(String, String)> {
        let stem = CONSTRAINT_SUFFIXES
            .iter()
            .find_map(|suffix| constraint_name.strip_suffix(suffix))?;
        let (table, field) = stem.split_once('_')?;
        if table.is_empty() || field.is_empty() {
            return None;
        }
        Some((table.to_string(), field.to_string()))
    }

    /// Maps a table name to the singular entity name used in API errors.
    pub fn entity_name(table: &str) -> String {
        match table {
            "categories" => "category".to_string(),
            other => other.strip_suffix('s').unwrap_or(other).to_string(),
        }
    }

    pub fn extract_column_from_message(message: &str) -> Option<String> {
        Self::patterns()?
            .column_name
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Returns the first `table "..."` mentioned in the message.
    pub fn extract_table_from_message(message: &str) -> Option<String> {
        Self::patterns()?
            .table_name
            .captures(message)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn extract_relation_from_message(message: &str) -> Option<String> {
        let start = message.find("relation \"")? + "relation \"".len();
        let end = message[start..].find('"')?;
        Some(message[start..start + end].to_string())
    }

    /// Extracts `(field, value)` from a `Key (field)=(value)` detail line.
    ///
    /// Expression index keys are reduced to the innermost column name.
    pub fn extract_key_value_from_message(message: &str) -> Option<(String, String)> {
        let patterns = Self::patterns()?;
        let caps = message
            .lines()
            .find_map(|line| patterns.key_value.captures(line))?;
        let raw_field = caps.get(1)?.as_str();
        let value = caps.get(2)?.as_str().to_string();
        let field = Self::innermost_identifier(raw_field).unwrap_or_else(|| raw_field.to_string());
        Some((field, value))
    }

    fn innermost_identifier(expression: &str) -> Option<String> {
        if !expression.contains('(') {
            return Some(expression.trim().to_string());
        }
        let start = expression.rfind('(')? + 1;
        let tail = &expression[start..];
        Self::patterns()?
            .identifier
            .captures(tail)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}
