use medley_model::{schema_for, Column, ListKind, ListSnapshot, TagCategory, ViewLayout};

const ALL_KINDS: [ListKind; 5] = [
    ListKind::Games,
    ListKind::Movies,
    ListKind::Series,
    ListKind::Books,
    ListKind::Common,
];

#[test]
fn every_tag_column_has_a_backing_category() {
    for kind in ALL_KINDS {
        let schema = schema_for(kind);
        for column in schema.columns {
            if let Column::Tags(category) = column {
                assert!(
                    schema.categories.contains(category),
                    "{:?} lists a tag column without its category",
                    kind
                );
            }
        }
    }
}

#[test]
fn every_category_has_a_column() {
    for kind in ALL_KINDS {
        let schema = schema_for(kind);
        for category in schema.categories {
            assert!(
                schema.columns.contains(&Column::Tags(*category)),
                "{:?} links {:?} but never displays it",
                kind,
                category
            );
        }
    }
}

#[test]
fn only_games_carry_sensitivity() {
    for kind in ALL_KINDS {
        let schema = schema_for(kind);
        assert_eq!(schema.has_sensitivity(), kind == ListKind::Games);
    }
}

#[test]
fn kind_strings_roundtrip() {
    for kind in ALL_KINDS {
        assert_eq!(ListKind::from_str_loose(kind.as_str()), Some(kind));
    }
    assert_eq!(ListKind::from_str_loose("podcasts"), None);
}

#[test]
fn category_strings_roundtrip() {
    for category in [
        TagCategory::Categories,
        TagCategory::Developers,
        TagCategory::Platforms,
        TagCategory::Services,
        TagCategory::Actors,
        TagCategory::Directors,
        TagCategory::Authors,
    ] {
        assert_eq!(TagCategory::from_str_loose(category.as_str()), Some(category));
    }
}

#[test]
fn snapshot_tolerates_minimal_json() {
    let snapshot: ListSnapshot = serde_json::from_str(
        r#"{"name": "shelf", "kind": "books", "records": []}"#,
    )
    .unwrap();
    assert_eq!(snapshot.kind, ListKind::Books);
    assert!(snapshot.catalogs.is_empty());
    assert!(snapshot.edges.is_empty());
    assert!(snapshot.sensitivity.is_empty());
    assert_eq!(snapshot.layout, ViewLayout::default());
}

#[test]
fn layout_defaults_to_manual_order() {
    let layout: ViewLayout = serde_json::from_str("{}").unwrap();
    assert_eq!(layout.sort_column, -1);
    assert_eq!(layout.sort_desc, 0);
    assert!(layout.column_widths.is_empty());
}
