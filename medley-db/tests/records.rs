use medley_db::{
    add_tag_if_absent, create_list, open_memory, FieldValue, Filter, RecordTable, SortOrder,
    StoreError,
};
use medley_model::{ListKind, Sensitivity, TagCategory};
use rusqlite::Connection;

const CAT: TagCategory = TagCategory::Categories;

fn setup(kind: ListKind) -> (Connection, RecordTable) {
    let conn = open_memory().unwrap();
    let list_id = create_list(&conn, "test", kind).unwrap();
    let mut table = RecordTable::new(list_id, kind);
    table.refresh(&conn).unwrap();
    (conn, table)
}

fn row_ids(table: &RecordTable) -> Vec<i64> {
    table.rows().iter().map(|r| r.record.id).collect()
}

fn row_positions(table: &RecordTable) -> Vec<i64> {
    table.rows().iter().map(|r| r.record.position).collect()
}

#[test]
fn positional_ops_require_a_loaded_view() {
    let conn = open_memory().unwrap();
    let list_id = create_list(&conn, "test", ListKind::Common).unwrap();
    let mut table = RecordTable::new(list_id, ListKind::Common);

    let err = table.insert(&conn, 1, None).unwrap_err();
    assert!(matches!(err, StoreError::StaleView));
}

#[test]
fn insert_appends_with_dense_positions() {
    let (conn, mut table) = setup(ListKind::Common);
    let ids = table.insert(&conn, 3, None).unwrap();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(row_positions(&table), vec![0, 1, 2]);

    // The cache and the store agree
    table.refresh(&conn).unwrap();
    assert_eq!(row_ids(&table), vec![1, 2, 3]);
    assert_eq!(row_positions(&table), vec![0, 1, 2]);
}

#[test]
fn insert_at_position_opens_a_gap() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 3, None).unwrap();
    let inserted = table.insert(&conn, 1, Some(1)).unwrap();

    assert_eq!(row_ids(&table), vec![1, inserted[0], 2, 3]);
    table.refresh(&conn).unwrap();
    assert_eq!(row_ids(&table), vec![1, inserted[0], 2, 3]);
    assert_eq!(row_positions(&table), vec![0, 1, 2, 3]);
}

#[test]
fn move_first_row_down() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 3, None).unwrap();

    let new_indices = table.move_by(&conn, &[1], 1).unwrap();
    assert_eq!(new_indices, vec![1]);
    assert_eq!(row_ids(&table), vec![2, 1, 3]);
    assert_eq!(row_positions(&table), vec![0, 1, 2]);

    table.refresh(&conn).unwrap();
    assert_eq!(row_ids(&table), vec![2, 1, 3]);
}

#[test]
fn move_at_boundary_is_a_noop() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 2, None).unwrap();

    assert_eq!(table.move_by(&conn, &[1], -1).unwrap(), vec![0]);
    assert_eq!(table.move_by(&conn, &[2], 1).unwrap(), vec![1]);
    assert_eq!(row_ids(&table), vec![1, 2]);
}

#[test]
fn multi_selection_moves_keep_relative_order() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 4, None).unwrap();

    // Move rows 2 and 3 down together: [1,2,3,4] -> [1,4,2,3]
    let new_indices = table.move_by(&conn, &[2, 3], 1).unwrap();
    assert_eq!(new_indices, vec![2, 3]);
    assert_eq!(row_ids(&table), vec![1, 4, 2, 3]);
}

#[test]
fn remove_leaves_gap_until_next_normalization() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 4, None).unwrap();
    table.remove(&conn, &[2]).unwrap();

    assert_eq!(row_ids(&table), vec![1, 3, 4]);
    assert_eq!(row_positions(&table), vec![0, 2, 3]);

    // A subsequent absolute move closes the gap
    table.move_to(&conn, &[4], 0).unwrap();
    assert_eq!(row_ids(&table), vec![4, 1, 3]);
    assert_eq!(row_positions(&table), vec![0, 1, 2]);
}

#[test]
fn normalize_makes_position_equal_index() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 5, None).unwrap();
    table.remove(&conn, &[1, 4]).unwrap();
    table.normalize_positions(&conn, 0).unwrap();

    assert_eq!(row_positions(&table), vec![0, 1, 2]);
    table.refresh(&conn).unwrap();
    assert_eq!(row_positions(&table), vec![0, 1, 2]);
}

#[test]
fn move_to_reinserts_contiguously() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 5, None).unwrap();

    let new_indices = table.move_to(&conn, &[2, 5], 1).unwrap();
    assert_eq!(new_indices, vec![1, 2]);
    assert_eq!(row_ids(&table), vec![1, 2, 5, 3, 4]);
    assert_eq!(row_positions(&table), vec![0, 1, 2, 3, 4]);

    table.refresh(&conn).unwrap();
    assert_eq!(row_ids(&table), vec![1, 2, 5, 3, 4]);
}

#[test]
fn set_field_writes_store_and_cache() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 1, None).unwrap();
    table
        .set_field(&conn, 1, FieldValue::Name("Outer Wilds".into()))
        .unwrap();
    table.set_field(&conn, 1, FieldValue::Rating(9)).unwrap();

    assert_eq!(table.rows()[0].record.name, "Outer Wilds");
    // Ratings clamp to the 0..=5 scale
    assert_eq!(table.rows()[0].record.rating, 5);

    let stored: u8 = conn
        .query_row("SELECT rating FROM items WHERE id = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(stored, 5);
}

#[test]
fn set_field_on_missing_item_fails() {
    let (conn, mut table) = setup(ListKind::Common);
    let err = table
        .set_field(&conn, 42, FieldValue::Name("ghost".into()))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "item", .. }));
}

#[test]
fn set_tags_refreshes_the_single_row() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 2, None).unwrap();
    let list_id = table.list_id();
    let action = add_tag_if_absent(&conn, list_id, CAT, "Action").unwrap();
    let puzzle = add_tag_if_absent(&conn, list_id, CAT, "Puzzle").unwrap();

    table.set_tags(&conn, 1, CAT, &[action, puzzle]).unwrap();

    assert_eq!(table.rows()[0].tags.get(&CAT).unwrap(), "Action, Puzzle");
    assert_eq!(table.rows()[1].tags.get(&CAT).unwrap(), "");
}

#[test]
fn set_tags_for_foreign_category_is_a_noop() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 1, None).unwrap();
    // Common lists have no developers dimension
    table
        .set_tags(&conn, 1, TagCategory::Developers, &[1, 2])
        .unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM item_tags", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn name_filter_is_case_insensitive_substring() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 3, None).unwrap();
    table
        .set_field(&conn, 1, FieldValue::Name("Outer Wilds".into()))
        .unwrap();
    table
        .set_field(&conn, 2, FieldValue::Name("The Outer Worlds".into()))
        .unwrap();
    table
        .set_field(&conn, 3, FieldValue::Name("Hades".into()))
        .unwrap();

    table
        .set_filter(&conn, Filter::NameContains("outer".into()))
        .unwrap();
    assert_eq!(row_ids(&table), vec![1, 2]);

    table.set_filter(&conn, Filter::None).unwrap();
    assert_eq!(row_ids(&table), vec![1, 2, 3]);
}

#[test]
fn tag_membership_filter_matches_aggregated_edges() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 2, None).unwrap();
    let list_id = table.list_id();
    let a = add_tag_if_absent(&conn, list_id, CAT, "A").unwrap();
    let b = add_tag_if_absent(&conn, list_id, CAT, "B").unwrap();

    // Item 1 is "A, B"; item 2 is "B"
    table.set_tags(&conn, 1, CAT, &[a, b]).unwrap();
    table.set_tags(&conn, 2, CAT, &[b]).unwrap();

    table
        .set_filter(
            &conn,
            Filter::TagsAnyOf {
                category: CAT,
                tag_ids: vec![b],
            },
        )
        .unwrap();
    assert_eq!(row_ids(&table), vec![1, 2]);

    table
        .set_filter(
            &conn,
            Filter::TagsAnyOf {
                category: CAT,
                tag_ids: vec![a],
            },
        )
        .unwrap();
    assert_eq!(row_ids(&table), vec![1]);
}

#[test]
fn empty_tag_filter_yields_no_rows() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 2, None).unwrap();

    table
        .set_filter(
            &conn,
            Filter::TagsAnyOf {
                category: CAT,
                tag_ids: vec![],
            },
        )
        .unwrap();
    assert_eq!(table.row_count(), 0);

    table.set_filter(&conn, Filter::None).unwrap();
    assert_eq!(table.row_count(), 2);
}

#[test]
fn rating_filter_is_exact() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 3, None).unwrap();
    table.set_field(&conn, 1, FieldValue::Rating(3)).unwrap();
    table.set_field(&conn, 2, FieldValue::Rating(5)).unwrap();
    table.set_field(&conn, 3, FieldValue::Rating(3)).unwrap();

    table.set_filter(&conn, Filter::RatingIs(3)).unwrap();
    assert_eq!(row_ids(&table), vec![1, 3]);
}

#[test]
fn rating_sort_is_stable_and_reproducible() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 3, None).unwrap();
    table.set_field(&conn, 1, FieldValue::Rating(2)).unwrap();
    table.set_field(&conn, 2, FieldValue::Rating(5)).unwrap();
    table.set_field(&conn, 3, FieldValue::Rating(3)).unwrap();

    // Common columns: name, categories, rating, url
    table
        .set_sort(&conn, Some(2), SortOrder::Descending)
        .unwrap();
    assert_eq!(row_ids(&table), vec![2, 3, 1]);

    table
        .set_sort(&conn, Some(2), SortOrder::Descending)
        .unwrap();
    assert_eq!(row_ids(&table), vec![2, 3, 1]);
}

#[test]
fn equal_sort_keys_keep_position_order() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 3, None).unwrap();
    table.set_field(&conn, 1, FieldValue::Rating(4)).unwrap();
    table.set_field(&conn, 2, FieldValue::Rating(4)).unwrap();
    table.set_field(&conn, 3, FieldValue::Rating(1)).unwrap();

    table
        .set_sort(&conn, Some(2), SortOrder::Descending)
        .unwrap();
    assert_eq!(row_ids(&table), vec![1, 2, 3]);
}

#[test]
fn tag_text_sort_runs_in_memory_and_is_stable() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 3, None).unwrap();
    let list_id = table.list_id();
    let alpha = add_tag_if_absent(&conn, list_id, CAT, "alpha").unwrap();
    let beta = add_tag_if_absent(&conn, list_id, CAT, "Beta").unwrap();

    table.set_tags(&conn, 1, CAT, &[beta]).unwrap();
    table.set_tags(&conn, 2, CAT, &[alpha]).unwrap();
    table.set_tags(&conn, 3, CAT, &[alpha]).unwrap();

    // Common columns: name, categories, rating, url
    table.set_sort(&conn, Some(1), SortOrder::Ascending).unwrap();
    assert_eq!(row_ids(&table), vec![2, 3, 1]);

    table
        .set_sort(&conn, Some(1), SortOrder::Descending)
        .unwrap();
    // Descending reverses the comparison, not the equal-key run
    assert_eq!(row_ids(&table), vec![1, 2, 3]);
}

#[test]
fn sensitivity_sort_uses_three_keys() {
    let (conn, mut table) = setup(ListKind::Games);
    table.insert(&conn, 3, None).unwrap();
    table
        .set_sensitivity(&conn, 1, Sensitivity::new(2, 0, 0))
        .unwrap();
    table
        .set_sensitivity(&conn, 2, Sensitivity::new(1, 5, 0))
        .unwrap();
    table
        .set_sensitivity(&conn, 3, Sensitivity::new(1, 2, 4))
        .unwrap();

    // Games columns: name, 4 tag dimensions, rating, sensitivity, url
    table.set_sort(&conn, Some(6), SortOrder::Ascending).unwrap();
    assert_eq!(row_ids(&table), vec![3, 2, 1]);
}

#[test]
fn moves_are_noops_while_sorted_or_filtered() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 3, None).unwrap();
    table
        .set_sort(&conn, Some(0), SortOrder::Ascending)
        .unwrap();

    let indices = table.move_by(&conn, &[1], 1).unwrap();
    assert_eq!(indices.len(), 1);

    table.set_sort(&conn, None, SortOrder::Ascending).unwrap();
    assert_eq!(row_ids(&table), vec![1, 2, 3]);
}

#[test]
fn cell_text_resolves_through_the_schema() {
    let (conn, mut table) = setup(ListKind::Games);
    table.insert(&conn, 1, None).unwrap();
    table
        .set_field(&conn, 1, FieldValue::Name("Celeste".into()))
        .unwrap();
    table
        .set_sensitivity(&conn, 1, Sensitivity::new(0, 1, 2))
        .unwrap();

    assert_eq!(table.cell_text(0, 0).unwrap(), "Celeste");
    assert_eq!(table.cell_text(0, 6).unwrap(), "0/1/2");
    assert_eq!(table.column_count(), 8);
    assert!(table.cell_text(0, 99).is_none());
}

#[test]
fn retrieve_is_canonical_regardless_of_view() {
    let (conn, mut table) = setup(ListKind::Common);
    table.insert(&conn, 3, None).unwrap();
    table.set_field(&conn, 1, FieldValue::Rating(1)).unwrap();
    table.set_field(&conn, 3, FieldValue::Rating(5)).unwrap();
    table
        .set_sort(&conn, Some(2), SortOrder::Descending)
        .unwrap();
    table
        .set_filter(&conn, Filter::RatingIs(5))
        .unwrap();

    let snapshot = table.retrieve(&conn).unwrap();
    let ids: Vec<i64> = snapshot.records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}
