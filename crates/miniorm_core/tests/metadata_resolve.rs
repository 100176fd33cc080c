mod common;

use common::{Player, Tag, User};
use miniorm_core::{
    resolve, resolve_declaration, EntityDeclaration, FieldDeclaration, MetadataError, ValueType,
};

#[derive(Debug, Default)]
struct Draft {
    id: i64,
    other_id: i64,
    title: String,
    body: String,
}

fn id_field() -> FieldDeclaration<Draft> {
    FieldDeclaration::new("id", |d: &Draft| &d.id, |d: &mut Draft| &mut d.id)
}

fn other_id_field() -> FieldDeclaration<Draft> {
    FieldDeclaration::new(
        "other_id",
        |d: &Draft| &d.other_id,
        |d: &mut Draft| &mut d.other_id,
    )
}

fn title_field() -> FieldDeclaration<Draft> {
    FieldDeclaration::new("title", |d: &Draft| &d.title, |d: &mut Draft| &mut d.title)
}

fn body_field() -> FieldDeclaration<Draft> {
    FieldDeclaration::new("body", |d: &Draft| &d.body, |d: &mut Draft| &mut d.body)
}

#[test]
fn resolves_explicit_table_and_column_overrides() {
    let metadata = resolve::<User>().unwrap();

    assert_eq!(metadata.type_name(), "User");
    assert_eq!(metadata.table_name(), "users");
    assert_eq!(metadata.id_field().field_name(), "id");
    assert_eq!(metadata.id_field().column_name(), "id");
    assert_eq!(metadata.id_field().value_type(), ValueType::I64);
    assert_eq!(
        metadata.column_names(),
        vec!["username", "email", "age", "rating", "active"]
    );
    assert_eq!(metadata.columns()[0].field_name(), "user_name");
}

#[test]
fn columns_exclude_identifier_and_transient_fields() {
    let metadata = resolve::<User>().unwrap();

    assert!(metadata
        .columns()
        .iter()
        .all(|column| column.field_name() != "id" && column.field_name() != "temporary_password"));
}

#[test]
fn derives_lowercase_plural_table_name() {
    assert_eq!(resolve::<Player>().unwrap().table_name(), "players");
    assert_eq!(resolve::<Tag>().unwrap().table_name(), "tags");

    let renamed = resolve_declaration(
        EntityDeclaration::<Draft>::new()
            .named("BlogPost")
            .mapped()
            .field(id_field().id()),
    )
    .unwrap();
    assert_eq!(renamed.table_name(), "blogposts");
}

#[test]
fn declared_value_types_follow_field_types() {
    let metadata = resolve::<User>().unwrap();
    let types: Vec<ValueType> = metadata
        .columns()
        .iter()
        .map(|column| column.value_type())
        .collect();
    assert_eq!(
        types,
        vec![
            ValueType::Text,
            ValueType::Text,
            ValueType::I32,
            ValueType::F64,
            ValueType::Bool
        ]
    );
    assert_eq!(
        resolve::<Tag>().unwrap().id_field().value_type(),
        ValueType::I32
    );
}

#[test]
fn unmapped_type_is_rejected() {
    let err = resolve_declaration(EntityDeclaration::<Draft>::new().field(id_field().id()))
        .unwrap_err();
    assert_eq!(
        err,
        MetadataError::NotAnEntity {
            type_name: "Draft".to_string()
        }
    );
}

#[test]
fn missing_identifier_is_rejected() {
    let err = resolve_declaration(
        EntityDeclaration::<Draft>::new()
            .mapped()
            .field(title_field()),
    )
    .unwrap_err();
    assert!(matches!(err, MetadataError::MissingId { .. }));
}

#[test]
fn multiple_identifiers_are_rejected() {
    let err = resolve_declaration(
        EntityDeclaration::<Draft>::new()
            .mapped()
            .field(id_field().id())
            .field(other_id_field().id()),
    )
    .unwrap_err();
    match err {
        MetadataError::MultipleIds { fields, .. } => {
            assert_eq!(fields, vec!["id".to_string(), "other_id".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn transient_identifier_is_rejected() {
    let err = resolve_declaration(
        EntityDeclaration::<Draft>::new()
            .mapped()
            .field(id_field().id().transient()),
    )
    .unwrap_err();
    assert!(matches!(err, MetadataError::TransientId { field, .. } if field == "id"));
}

#[test]
fn colliding_column_names_are_rejected() {
    let err = resolve_declaration(
        EntityDeclaration::<Draft>::new()
            .mapped()
            .field(id_field().id())
            .field(title_field())
            .field(body_field().column("TITLE")),
    )
    .unwrap_err();
    assert!(matches!(err, MetadataError::DuplicateColumn { column, .. } if column == "TITLE"));
}

#[test]
fn column_colliding_with_identifier_is_rejected() {
    let err = resolve_declaration(
        EntityDeclaration::<Draft>::new()
            .mapped()
            .field(id_field().id())
            .field(title_field().column("id")),
    )
    .unwrap_err();
    assert!(matches!(err, MetadataError::DuplicateColumn { .. }));
}

#[test]
fn transient_fields_do_not_take_part_in_collisions() {
    let metadata = resolve_declaration(
        EntityDeclaration::<Draft>::new()
            .mapped()
            .field(id_field().id())
            .field(title_field())
            .field(body_field().column("title").transient()),
    )
    .unwrap();
    assert_eq!(metadata.column_names(), vec!["title"]);
}

#[test]
fn non_identifier_names_are_rejected() {
    let err = resolve_declaration(
        EntityDeclaration::<Draft>::new()
            .mapped_to("drafts; DROP TABLE users")
            .field(id_field().id()),
    )
    .unwrap_err();
    assert!(matches!(err, MetadataError::InvalidName { .. }));

    let err = resolve_declaration(
        EntityDeclaration::<Draft>::new()
            .mapped()
            .field(id_field().id())
            .field(title_field().column("title text")),
    )
    .unwrap_err();
    assert!(matches!(err, MetadataError::InvalidName { name, .. } if name == "title text"));
}

#[test]
fn column_order_follows_declaration_order() {
    let metadata = resolve_declaration(
        EntityDeclaration::<Draft>::new()
            .mapped()
            .field(body_field())
            .field(id_field().id())
            .field(title_field()),
    )
    .unwrap();
    assert_eq!(metadata.column_names(), vec!["body", "title"]);
}
