use std::time::{Duration, Instant};

use snippet_shelf::{
    ListController, ListError, ListEvent, ListStore, MemoryClipboard, NewItem, SqliteStore,
    ValidationError,
};

fn steps() -> Vec<NewItem> {
    vec![
        NewItem::text("checkout", "git checkout main"),
        NewItem::text("pull", "git pull --rebase"),
        NewItem::text("test", "cargo test"),
    ]
}

#[test]
fn lists_survive_reopening_the_database() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("nested").join("shelf.sqlite");

    let list_id = {
        let store = SqliteStore::open(&path).expect("open");
        let category = store.create_category("Git", Some("🌿")).expect("category");
        let mut controller = ListController::new(store, MemoryClipboard::new());
        controller
            .create_list(category.id, "Morning", &steps(), Some("daily sync"))
            .expect("create")
            .list_id
    };

    let store = SqliteStore::open(&path).expect("reopen");
    let lista = store.get_lista(list_id).expect("query").expect("list exists");
    assert_eq!(lista.name, "Morning");
    assert_eq!(lista.description.as_deref(), Some("daily sync"));
    assert_eq!(lista.item_count, 3);

    let labels: Vec<String> = store
        .get_items_by_lista(list_id)
        .expect("items")
        .into_iter()
        .map(|item| item.label)
        .collect();
    assert_eq!(labels, ["checkout", "pull", "test"]);
}

#[test]
fn copy_replay_and_delete_end_to_end() {
    let store = SqliteStore::open_in_memory().expect("store");
    let category = store.create_category("Ops", None).expect("category");
    let mut controller = ListController::new(store, MemoryClipboard::new());
    let events = controller.subscribe();

    let created = controller
        .create_list(category.id, "Release", &steps(), None)
        .expect("create");

    let message = controller
        .copy_all_list_items(created.list_id, " && ")
        .expect("copy");
    assert_eq!(message, "Copiados 3 pasos de 'Release'");
    assert_eq!(
        controller.clipboard().last(),
        Some("git checkout main && git pull --rebase && cargo test")
    );

    let t0 = Instant::now();
    let delay = Duration::from_millis(200);
    controller
        .execute_list_sequentially_at(created.list_id, delay, t0)
        .expect("execute");
    assert!(!controller.poll_execution(t0 + Duration::from_millis(100)));
    assert!(controller.poll_execution(t0 + delay));
    assert!(controller.poll_execution(t0 + delay * 2));
    assert!(!controller.is_executing());
    assert_eq!(controller.clipboard().last(), Some("cargo test"));

    let lista = controller
        .store()
        .get_lista(created.list_id)
        .expect("query")
        .expect("list");
    assert_eq!(lista.use_count, 2);
    assert!(lista.last_used.is_some());

    controller.delete_list(created.list_id).expect("delete");
    assert!(controller.get_list_items(created.list_id).is_empty());
    assert_eq!(controller.get_list_count(category.id), 0);

    let received: Vec<ListEvent> = events.try_iter().collect();
    let steps_seen = received
        .iter()
        .filter(|event| matches!(event, ListEvent::ExecutionStep { .. }))
        .count();
    assert_eq!(steps_seen, 3);
    assert!(received.contains(&ListEvent::ExecutionCompleted {
        list_id: created.list_id
    }));
    assert!(received.contains(&ListEvent::Deleted {
        list_id: created.list_id,
        category_id: category.id,
    }));
}

#[test]
fn same_name_is_allowed_in_another_category() {
    let store = SqliteStore::open_in_memory().expect("store");
    let git = store.create_category("Git", None).expect("category");
    let docker = store.create_category("Docker", None).expect("category");
    let mut controller = ListController::new(store, MemoryClipboard::new());

    controller
        .create_list(git.id, "Cleanup", &steps(), None)
        .expect("first");
    controller
        .create_list(docker.id, "Cleanup", &steps(), None)
        .expect("other category");

    let err = controller
        .create_list(git.id, "Cleanup", &steps(), None)
        .expect_err("duplicate");
    assert!(matches!(
        err,
        ListError::Validation(ValidationError::DuplicateName(ref name)) if name == "Cleanup"
    ));
}
