//! SQL statement text derived from entity metadata.
//!
//! # Invariants
//! - Placeholders are positional `?` and follow `EntityMetadata::columns`
//!   order, with the identifier bound last where it appears.
//! - Statements are built once per repository and reused unchanged.

use crate::metadata::EntityMetadata;

/// The five CRUD statements for one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatements {
    pub insert: String,
    /// `None` when the entity has no non-identifier columns to update.
    pub update: Option<String>,
    pub select_by_id: String,
    pub select_all: String,
    pub delete_by_id: String,
    pub count: String,
}

impl SqlStatements {
    pub fn for_metadata<T>(metadata: &EntityMetadata<T>) -> Self {
        let table = metadata.table_name();
        let id_column = metadata.id_field().column_name();
        let columns = metadata.column_names();

        let insert = if columns.is_empty() {
            format!("INSERT INTO {table} DEFAULT VALUES")
        } else {
            let placeholders = vec!["?"; columns.len()].join(", ");
            format!(
                "INSERT INTO {table} ({}) VALUES ({placeholders})",
                columns.join(", ")
            )
        };

        let update = (!columns.is_empty()).then(|| {
            let assignments = columns
                .iter()
                .map(|column| format!("{column} = ?"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("UPDATE {table} SET {assignments} WHERE {id_column} = ?")
        });

        Self {
            insert,
            update,
            select_by_id: format!("SELECT * FROM {table} WHERE {id_column} = ?"),
            select_all: format!("SELECT * FROM {table}"),
            delete_by_id: format!("DELETE FROM {table} WHERE {id_column} = ?"),
            count: format!("SELECT COUNT(*) FROM {table}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SqlStatements;
    use crate::metadata::resolve_declaration;
    use crate::model::declaration::{EntityDeclaration, FieldDeclaration};

    #[derive(Default)]
    struct Book {
        isbn: i64,
        title: String,
        pages: i32,
    }

    #[test]
    fn builds_statements_in_column_order() {
        let metadata = resolve_declaration(
            EntityDeclaration::new()
                .mapped_to("library_books")
                .field(
                    FieldDeclaration::new("isbn", |b: &Book| &b.isbn, |b: &mut Book| &mut b.isbn)
                        .id()
                        .column("book_id"),
                )
                .field(FieldDeclaration::new(
                    "title",
                    |b: &Book| &b.title,
                    |b: &mut Book| &mut b.title,
                ))
                .field(FieldDeclaration::new(
                    "pages",
                    |b: &Book| &b.pages,
                    |b: &mut Book| &mut b.pages,
                )),
        )
        .unwrap();

        let sql = SqlStatements::for_metadata(&metadata);
        assert_eq!(
            sql.insert,
            "INSERT INTO library_books (title, pages) VALUES (?, ?)"
        );
        assert_eq!(
            sql.update.as_deref(),
            Some("UPDATE library_books SET title = ?, pages = ? WHERE book_id = ?")
        );
        assert_eq!(
            sql.select_by_id,
            "SELECT * FROM library_books WHERE book_id = ?"
        );
        assert_eq!(sql.select_all, "SELECT * FROM library_books");
        assert_eq!(
            sql.delete_by_id,
            "DELETE FROM library_books WHERE book_id = ?"
        );
        assert_eq!(sql.count, "SELECT COUNT(*) FROM library_books");
    }

    #[test]
    fn identifier_only_entity_inserts_default_values() {
        let metadata = resolve_declaration(EntityDeclaration::new().mapped().field(
            FieldDeclaration::new("isbn", |b: &Book| &b.isbn, |b: &mut Book| &mut b.isbn).id(),
        ))
        .unwrap();

        let sql = SqlStatements::for_metadata(&metadata);
        assert_eq!(sql.insert, "INSERT INTO books DEFAULT VALUES");
        assert!(sql.update.is_none());
    }
}
