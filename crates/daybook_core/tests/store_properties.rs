use daybook_core::{ActivityStore, ClockTime, DateKey};

fn date(text: &str) -> DateKey {
    text.parse().unwrap()
}

fn titles(store: &ActivityStore, key: DateKey) -> Vec<String> {
    store.list(key).iter().map(|a| a.title.clone()).collect()
}

#[test]
fn add_to_empty_store_lists_single_record() {
    let mut store = ActivityStore::new();
    let key = date("2024-01-01");

    store.add(key, ClockTime::new(9, 15), "Standup", "daily sync");

    let listed = store.list(key);
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].time.to_string(), "09:15");
    assert_eq!(listed[0].title, "Standup");
    assert_eq!(listed[0].description, "daily sync");
}

#[test]
fn add_places_new_record_last() {
    let mut store = ActivityStore::new();
    let key = date("2024-03-10");
    store.add(key, ClockTime::new(8, 0), "first", "");
    store.add(key, ClockTime::new(7, 0), "second", "");
    let before = store.list(key).len();

    let id = store.add(key, ClockTime::new(6, 0), "third", "");

    assert_eq!(store.list(key).len(), before + 1);
    assert_eq!(store.list(key).last().unwrap().id, id);
    assert_eq!(titles(&store, key), ["first", "second", "third"]);
}

#[test]
fn add_accepts_unvalidated_fields() {
    let mut store = ActivityStore::new();
    let key = date("2024-03-11");

    store.add(key, ClockTime::new(99, 99), "", "");

    assert_eq!(store.list(key)[0].time.to_string(), "99:99");
    assert_eq!(store.list(key)[0].title, "");
}

#[test]
fn delete_first_of_two_shifts_second_to_front() {
    let mut store = ActivityStore::new();
    let key = date("2024-01-01");
    store.add(key, ClockTime::new(9, 0), "one", "");
    store.add(key, ClockTime::new(10, 0), "two", "");

    store.delete(key, 0).unwrap();

    assert_eq!(titles(&store, key), ["two"]);
}

#[test]
fn delete_middle_preserves_relative_order() {
    let mut store = ActivityStore::new();
    let key = date("2024-05-05");
    for title in ["a", "b", "c", "d"] {
        store.add(key, ClockTime::new(12, 0), title, "");
    }

    let removed = store.delete(key, 2).unwrap();

    assert_eq!(removed.title, "c");
    assert_eq!(titles(&store, key), ["a", "b", "d"]);
}

#[test]
fn delete_without_match_leaves_store_unchanged() {
    let mut store = ActivityStore::new();
    let key = date("2024-05-06");
    store.add(key, ClockTime::new(12, 0), "kept", "");
    let snapshot = store.clone();

    assert!(store.delete(key, 1).is_none());
    assert!(store.delete(key, usize::MAX).is_none());
    assert!(store.delete(date("2030-01-01"), 0).is_none());

    assert_eq!(store, snapshot);
}

#[test]
fn deleting_last_record_removes_date() {
    let mut store = ActivityStore::new();
    let key = date("2024-06-01");
    let other = date("2024-06-02");
    store.add(key, ClockTime::new(12, 0), "gone", "");
    store.add(other, ClockTime::new(12, 0), "stays", "");

    store.delete(key, 0).unwrap();

    assert!(!store.contains_date(key));
    assert!(store.contains_date(other));
    assert_eq!(store.dates().collect::<Vec<_>>(), vec![other]);
}

#[test]
fn list_of_unknown_date_is_empty_and_read_only() {
    let store = ActivityStore::new();
    let key = date("2024-07-01");

    assert!(store.list(key).is_empty());
    assert!(!store.contains_date(key));
}
