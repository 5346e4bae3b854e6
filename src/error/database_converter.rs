use crate::error::constraint_parser::ForeignKeyViolation;
use crate::error::{AppError, ConstraintParser};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};

/// Utility for converting database errors to structured AppError variants.
///
/// Constraint violations are turned into client-facing errors (`Duplicate`,
/// `Conflict`, `Validation`); everything else becomes an opaque `Database` error.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    ///
    /// # Arguments
    /// * `error` - The Diesel error to convert
    /// * `operation` - Description of the database operation that failed
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info.as_ref(), operation)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: &(dyn DatabaseErrorInformation + Send + Sync),
        operation: &str,
    ) -> AppError {
        // Postgres keeps "Key (..)=(..)" in DETAIL, separate from the primary message
        let message = match info.details() {
            Some(details) => format!("{}\n{}", info.message(), details),
            None => info.message().to_string(),
        };
        let constraint_name = info.constraint_name();

        let parsed = match kind {
            DatabaseErrorKind::UniqueViolation => {
                ConstraintParser::parse_unique_violation(&message, constraint_name).map(
                    |(entity, field, value)| AppError::Duplicate {
                        entity,
                        field,
                        value,
                    },
                )
            }
            DatabaseErrorKind::ForeignKeyViolation => {
                ConstraintParser::parse_foreign_key_violation(&message, constraint_name).map(
                    |violation| match violation {
                        ForeignKeyViolation::MissingParent { parent, value, .. } => {
                            AppError::NotFound {
                                entity: parent,
                                field: "id".to_string(),
                                value,
                            }
                        }
                        ForeignKeyViolation::StillReferenced {
                            parent,
                            child,
                            value,
                        } => AppError::Conflict {
                            message: format!(
                                "{} {} is still referenced by {}",
                                parent, value, child
                            ),
                        },
                    },
                )
            }
            DatabaseErrorKind::NotNullViolation => {
                ConstraintParser::parse_not_null_violation(&message).map(|(entity, field)| {
                    AppError::Validation {
                        field,
                        reason: format!("Field is required for {}", entity),
                    }
                })
            }
            DatabaseErrorKind::CheckViolation => ConstraintParser::parse_check_violation(
                constraint_name,
            )
            .map(|(entity, field)| AppError::Validation {
                field,
                reason: format!("Check constraint failed for {} field", entity),
            }),
            _ => None,
        };

        parsed.unwrap_or_else(|| AppError::Database {
            operation: operation.to_string(),
            source: anyhow::Error::msg(format!("{:?}: {}", kind, message)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockDatabaseErrorInfo {
        message: String,
        details: Option<String>,
        constraint_name: Option<String>,
    }

    impl DatabaseErrorInformation for MockDatabaseErrorInfo {
        fn message(&self) -> &str {
            &self.message
        }

        fn details(&self) -> Option<&str> {
            self.details.as_deref()
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            None
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            self.constraint_name.as_deref()
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(
        kind: DatabaseErrorKind,
        message: &str,
        details: Option<&str>,
        constraint: Option<&str>,
    ) -> DieselError {
        DieselError::DatabaseError(
            kind,
            Box::new(MockDatabaseErrorInfo {
                message: message.to_string(),
                details: details.map(str::to_string),
                constraint_name: constraint.map(str::to_string),
            }),
        )
    }

    #[test]
    fn test_convert_not_found_error() {
        let result = DatabaseErrorConverter::convert_diesel_error(DieselError::NotFound, "find");
        assert!(matches!(result, AppError::NotFound { .. }));
    }

    #[test]
    fn test_convert_unique_violation_reads_details() {
        let error = database_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint \"categories_name_key\"",
            Some("Key (lower(btrim((name)::text)))=(shoes) already exists."),
            Some("categories_name_key"),
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "insert category") {
            AppError::Duplicate {
                entity,
                field,
                value,
            } => {
                assert_eq!(entity, "category");
                assert_eq!(field, "name");
                assert_eq!(value, "shoes");
            }
            other => panic!("Expected Duplicate error, got: {:?}", other),
        }
    }

    #[test]
    fn test_convert_delete_of_referenced_category() {
        let error = database_error(
            DatabaseErrorKind::ForeignKeyViolation,
            "update or delete on table \"categories\" violates foreign key constraint \"products_category_id_fkey\" on table \"products\"",
            Some("Key (id)=(4) is still referenced from table \"products\"."),
            Some("products_category_id_fkey"),
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "delete category") {
            AppError::Conflict { message } => {
                assert_eq!(message, "category 4 is still referenced by products");
            }
            other => panic!("Expected Conflict error, got: {:?}", other),
        }
    }

    #[test]
    fn test_convert_dangling_category_reference() {
        let error = database_error(
            DatabaseErrorKind::ForeignKeyViolation,
            "insert or update on table \"products\" violates foreign key constraint \"products_category_id_fkey\"",
            Some("Key (category_id)=(42) is not present in table \"categories\"."),
            Some("products_category_id_fkey"),
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "insert product") {
            AppError::NotFound { entity, value, .. } => {
                assert_eq!(entity, "category");
                assert_eq!(value, "42");
            }
            other => panic!("Expected NotFound error, got: {:?}", other),
        }
    }

    #[test]
    fn test_convert_check_violation() {
        let error = database_error(
            DatabaseErrorKind::CheckViolation,
            "new row for relation \"products\" violates check constraint \"products_stock_check\"",
            None,
            Some("products_stock_check"),
        );

        match DatabaseErrorConverter::convert_diesel_error(error, "update product") {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "stock");
                assert!(reason.contains("Check constraint failed"));
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_violation_stays_opaque() {
        let error = database_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value",
            None,
            None,
        );
        assert!(matches!(
            DatabaseErrorConverter::convert_diesel_error(error, "insert"),
            AppError::Database { .. }
        ));
    }
}
