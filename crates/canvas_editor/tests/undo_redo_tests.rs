//! End-to-end history behaviour of the editor against the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use futures_lite::future::{block_on, poll_once};

use canvas_common::{
    AttributeError, AttributeValue, EntityKind, Heliostat, HeliostatRecord, LightSource,
    LightSourceRecord, ProjectRecord, Receiver, SceneObject,
};
use canvas_editor::{
    BatchCommand, Command, CommandContext, CommandError, CreateCommand, DEFAULT_HISTORY_CAPACITY,
    DeleteCommand, Editor, EditorSettings, EventKind,
};
use canvas_sync::{GatewayCall, GatewayError, GatewayOp, InMemoryGateway, SyncPolicy};

fn editor() -> (Arc<InMemoryGateway>, Editor) {
    editor_with(EditorSettings::default())
}

fn editor_with(settings: EditorSettings) -> (Arc<InMemoryGateway>, Editor) {
    let gateway = Arc::new(InMemoryGateway::new());
    let editor = Editor::new(gateway.clone(), settings);
    (gateway, editor)
}

fn names(editor: &Editor) -> Vec<String> {
    editor
        .scene()
        .objects()
        .iter()
        .map(|object| object.display_name())
        .collect()
}

// ============================================================================
// History
// ============================================================================

#[test]
fn test_undoing_everything_restores_the_empty_scene() {
    let (gateway, editor) = editor();
    block_on(async {
        editor.objects().create_heliostat().await.unwrap();
        editor.objects().create_receiver().await.unwrap();
        editor.objects().create_light_source().await.unwrap();
        assert_eq!(editor.scene().len(), 3);

        for _ in 0..3 {
            assert!(editor.undo().await.unwrap());
        }
        assert!(!editor.undo().await.unwrap());
    });
    assert!(editor.scene().is_empty());
    assert!(gateway.is_empty());
    assert_eq!(editor.handler().redo_len(), 3);
}

#[test]
fn test_redo_reproduces_the_executed_state() {
    let (gateway, editor) = editor();
    block_on(async {
        editor.objects().create_heliostat().await.unwrap();
        editor.objects().create_heliostat().await.unwrap();
        editor.undo().await.unwrap();
        editor.undo().await.unwrap();
        assert!(editor.redo().await.unwrap());
        assert!(editor.redo().await.unwrap());
        assert!(!editor.redo().await.unwrap());
    });
    assert_eq!(names(&editor), vec!["1", "2"]);
    assert_eq!(gateway.len(EntityKind::Heliostat), 2);
    assert!(editor.scene().objects().iter().all(|o| o.api_id().is_some()));
}

#[test]
fn test_execute_clears_redo() {
    let (_gateway, editor) = editor();
    block_on(async {
        editor.objects().create_heliostat().await.unwrap();
        editor.undo().await.unwrap();
        assert!(editor.handler().can_redo());
        editor.objects().create_receiver().await.unwrap();
    });
    assert!(!editor.handler().can_redo());
    assert_eq!(editor.handler().undo_len(), 1);
}

#[test]
fn test_history_keeps_the_latest_hundred() {
    let (_gateway, editor) = editor();
    block_on(async {
        for _ in 0..=DEFAULT_HISTORY_CAPACITY {
            editor
                .execute(CreateCommand::new(Heliostat::default()))
                .await
                .unwrap();
        }
        assert_eq!(editor.handler().undo_len(), DEFAULT_HISTORY_CAPACITY);
        while editor.undo().await.unwrap() {}
    });
    // the very first creation fell out of the history
    assert_eq!(editor.scene().len(), 1);
}

#[test]
fn test_facet_count_round_trip() {
    let (gateway, editor) = editor();
    let heliostat = block_on(async {
        let heliostat = editor.objects().create_heliostat().await.unwrap();
        editor
            .objects()
            .update_attribute(&heliostat, "numberOfFacets", 8)
            .await
            .unwrap();
        heliostat
    });
    let id = heliostat.api_id().unwrap();
    let facets = || heliostat.get_named("numberOfFacets").unwrap();
    assert_eq!(facets(), AttributeValue::Integer(8));
    assert_eq!(gateway.heliostat(id).unwrap().number_of_facets, 8);

    block_on(editor.undo()).unwrap();
    assert_eq!(facets(), AttributeValue::Integer(4));
    assert_eq!(gateway.heliostat(id).unwrap().number_of_facets, 4);

    block_on(editor.redo()).unwrap();
    assert_eq!(facets(), AttributeValue::Integer(8));
    assert_eq!(gateway.heliostat(id).unwrap().number_of_facets, 8);
    assert_eq!(gateway.call_count(EntityKind::Heliostat, GatewayOp::Update), 3);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_create_receiver_then_undo() {
    let (gateway, editor) = editor();
    let receiver = block_on(editor.objects().create_receiver()).unwrap();
    assert_eq!(gateway.call_count(EntityKind::Receiver, GatewayOp::Create), 1);
    let id = receiver.api_id().unwrap();
    assert!(gateway.contains(EntityKind::Receiver, id));
    assert!(editor.selection().is_selected(&receiver));

    block_on(editor.undo()).unwrap();
    assert_eq!(gateway.call_count(EntityKind::Receiver, GatewayOp::Delete), 1);
    assert_eq!(
        gateway.calls().last(),
        Some(&GatewayCall {
            kind: Some(EntityKind::Receiver),
            op: GatewayOp::Delete,
            id: Some(id),
        })
    );
    assert!(!gateway.contains(EntityKind::Receiver, id));
    assert_eq!(receiver.api_id(), None);
}

#[test]
fn test_deleting_an_unpersisted_object_makes_no_call() {
    let (gateway, editor) = editor();
    gateway.set_offline(true);
    let heliostat = block_on(editor.objects().create_heliostat()).unwrap();
    assert_eq!(heliostat.api_id(), None);
    assert!(editor.scene().contains(&heliostat));

    gateway.set_offline(false);
    gateway.clear_calls();
    block_on(editor.execute(DeleteCommand::new(heliostat.clone()))).unwrap();
    assert!(gateway.calls().is_empty());
    assert!(!editor.scene().contains(&heliostat));
}

#[test]
fn test_write_through_failure_leaves_everything_unchanged() {
    let settings = EditorSettings::default().with_sync_policy(SyncPolicy::WriteThrough);
    let (gateway, editor) = editor_with(settings);
    let heliostat = block_on(editor.objects().create_heliostat()).unwrap();

    gateway.fail_next(GatewayError::Unavailable("maintenance".into()));
    let err = block_on(
        editor
            .objects()
            .update_attribute(&heliostat, "kinematicType", "rigid_body"),
    )
    .unwrap_err();
    assert!(matches!(err, CommandError::Persistence(_)));
    assert_eq!(
        heliostat.get_named("kinematicType").unwrap(),
        AttributeValue::from("ideal")
    );
    assert_eq!(editor.handler().undo_len(), 1);

    gateway.fail_next(GatewayError::Unavailable("maintenance".into()));
    assert!(block_on(editor.objects().create_receiver()).is_err());
    assert_eq!(editor.scene().len(), 1);
    assert_eq!(editor.handler().undo_len(), 1);
    assert!(!editor.handler().can_redo());
}

#[test]
fn test_failed_undo_keeps_the_command() {
    let settings = EditorSettings::default().with_sync_policy(SyncPolicy::WriteThrough);
    let (gateway, editor) = editor_with(settings);
    let heliostat = block_on(editor.objects().create_heliostat()).unwrap();

    gateway.fail_next(GatewayError::Unavailable("maintenance".into()));
    assert!(block_on(editor.undo()).is_err());
    assert!(editor.scene().contains(&heliostat));
    assert_eq!(editor.handler().undo_len(), 1);

    assert!(block_on(editor.undo()).unwrap());
    assert!(editor.scene().is_empty());
}

#[test]
fn test_redo_after_a_lost_delete_keeps_one_record() {
    let (gateway, editor) = editor();
    let heliostat = block_on(editor.objects().create_heliostat()).unwrap();
    let id = heliostat.api_id().unwrap();

    gateway.fail_next(GatewayError::Unavailable("maintenance".into()));
    assert!(block_on(editor.undo()).unwrap());
    assert!(editor.scene().is_empty());
    assert!(gateway.contains(EntityKind::Heliostat, id));

    assert!(block_on(editor.redo()).unwrap());
    assert_eq!(heliostat.api_id(), Some(id));
    assert_eq!(gateway.len(EntityKind::Heliostat), 1);
    assert_eq!(gateway.call_count(EntityKind::Heliostat, GatewayOp::Create), 1);
    assert_eq!(gateway.call_count(EntityKind::Heliostat, GatewayOp::Update), 1);

    // once the delete goes through, a later redo creates a fresh record
    assert!(block_on(editor.undo()).unwrap());
    assert!(gateway.is_empty());
    assert!(block_on(editor.redo()).unwrap());
    assert_ne!(heliostat.api_id(), Some(id));
    assert_eq!(gateway.len(EntityKind::Heliostat), 1);
}

// ============================================================================
// Object manager
// ============================================================================

#[test]
fn test_new_objects_are_numbered_per_kind() {
    let (_gateway, editor) = editor();
    block_on(async {
        editor.objects().create_heliostat().await.unwrap();
        editor.objects().create_heliostat().await.unwrap();
        editor.objects().create_receiver().await.unwrap();
    });
    assert_eq!(names(&editor), vec!["1", "2", "1"]);
}

#[test]
fn test_duplicate_names_and_ids() {
    let (gateway, editor) = editor();
    let original = block_on(editor.objects().create_heliostat()).unwrap();
    let copies = block_on(editor.objects().duplicate_selected()).unwrap();
    assert_eq!(copies.len(), 1);
    let copy = &copies[0];
    assert_eq!(copy.name().as_deref(), Some("1_Copy"));
    assert_ne!(copy.api_id(), original.api_id());
    assert!(copy.api_id().is_some());
    assert!(editor.selection().is_selected(copy));
    assert_eq!(gateway.len(EntityKind::Heliostat), 2);

    let unnamed = block_on(async {
        let command = CreateCommand::new(Heliostat::default());
        let object = command.object().clone();
        editor.execute(command).await.unwrap();
        editor.selection().set_selection(vec![object]);
        editor.objects().duplicate_selected().await.unwrap()
    });
    assert_eq!(unnamed[0].name().as_deref(), Some("Heliostat_Copy"));
}

#[test]
fn test_unknown_attribute_is_rejected() {
    let (gateway, editor) = editor();
    let receiver = block_on(editor.objects().create_receiver()).unwrap();
    gateway.clear_calls();

    let err = block_on(editor.objects().update_attribute(&receiver, "bogusField", 1)).unwrap_err();
    assert!(matches!(
        err,
        CommandError::InvalidAttribute(AttributeError::Unknown { .. })
    ));
    assert!(gateway.calls().is_empty());
    assert_eq!(editor.handler().undo_len(), 1);
}

#[test]
fn test_delete_selected_is_one_history_entry() {
    let (gateway, editor) = editor();
    block_on(async {
        for _ in 0..3 {
            editor.objects().create_heliostat().await.unwrap();
        }
    });
    editor.selection().set_selection(editor.scene().objects());

    assert_eq!(block_on(editor.objects().delete_selected()).unwrap(), 3);
    assert!(editor.scene().is_empty());
    assert!(editor.selection().is_empty());
    assert!(gateway.is_empty());
    assert_eq!(editor.handler().undo_len(), 4);

    block_on(editor.undo()).unwrap();
    assert_eq!(names(&editor), vec!["1", "2", "3"]);
    assert_eq!(gateway.len(EntityKind::Heliostat), 3);
    assert_eq!(block_on(editor.objects().delete_selected()).unwrap(), 0);
}

#[test]
fn test_selection_forgets_deleted_objects() {
    let (_gateway, editor) = editor();
    let first = block_on(editor.objects().create_heliostat()).unwrap();
    let second = block_on(editor.objects().create_receiver()).unwrap();
    editor
        .selection()
        .set_selection(vec![first.clone(), second.clone()]);

    block_on(editor.execute(DeleteCommand::new(first.clone()))).unwrap();
    assert!(!editor.selection().is_selected(&first));
    assert!(editor.selection().is_selected(&second));

    // undoing the deletion brings the object back, not its selection
    block_on(editor.undo()).unwrap();
    assert!(editor.scene().contains(&first));
    assert!(!editor.selection().is_selected(&first));
}

#[test]
fn test_batch_undoes_in_reverse_order() {
    let (_gateway, editor) = editor();
    let updates = editor.events().subscribe_to(&[EventKind::ItemDeleted, EventKind::ItemCreated]);
    let first = SceneObject::from(Heliostat::default().with_name("a"));
    let second = SceneObject::from(Receiver::default().with_name("b"));
    let batch = BatchCommand::new("Place pair")
        .with_command(CreateCommand::new(first.clone()))
        .with_command(CreateCommand::new(second.clone()));
    block_on(editor.execute(batch)).unwrap();
    updates.drain();

    block_on(editor.undo()).unwrap();
    let deleted: Vec<String> = updates
        .drain()
        .iter()
        .filter_map(|event| event.item().map(|item| item.display_name()))
        .collect();
    assert_eq!(deleted, vec!["b", "a"]);
    assert_eq!(editor.handler().redo_labels(), vec!["Place pair"]);
}

// ============================================================================
// Concurrency and projects
// ============================================================================

#[derive(Debug)]
struct Stall;

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Command for Stall {
    async fn execute(&mut self, _ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        futures_lite::future::pending::<()>().await;
        Ok(())
    }

    async fn undo(&mut self, _ctx: &CommandContext<'_>) -> Result<(), CommandError> {
        Ok(())
    }

    fn label(&self) -> String {
        "stall".to_string()
    }
}

#[test]
fn test_overlapping_operations_are_rejected() {
    let (_gateway, editor) = editor();
    block_on(editor.objects().create_heliostat()).unwrap();

    let mut stalled = Box::pin(editor.execute(Stall));
    assert!(block_on(poll_once(&mut stalled)).is_none());

    assert_eq!(block_on(editor.undo()), Err(CommandError::Busy));
    assert_eq!(block_on(editor.load_project()), Err(CommandError::Busy));
    drop(stalled);

    assert_eq!(editor.handler().undo_len(), 1);
    assert!(block_on(editor.undo()).unwrap());
}

#[test]
fn test_loaded_project_is_not_undoable() {
    let project = ProjectRecord {
        name: "Almería".into(),
        heliostats: vec![HeliostatRecord::from(&Heliostat::default().with_name("h"))],
        lightsources: vec![LightSourceRecord::from(&LightSource::default())],
        ..Default::default()
    };
    let gateway = Arc::new(InMemoryGateway::with_project(project).unwrap());
    let editor = Editor::new(gateway.clone(), EditorSettings::default());

    // created before the load, so it is part of the stored project
    block_on(editor.objects().create_receiver()).unwrap();
    assert_eq!(block_on(editor.load_project()).unwrap(), 3);
    assert_eq!(editor.scene().receivers().len(), 1);
    assert_eq!(editor.project_name(), "Almería");
    assert!(!editor.handler().can_undo());
    assert!(editor.selection().is_empty());
    assert!(!block_on(editor.undo()).unwrap());

    let heliostat = editor.scene().heliostats().remove(0);
    let id = heliostat.api_id().unwrap();
    assert!(
        editor
            .scene()
            .find_by_api_id(EntityKind::Heliostat, id)
            .is_some_and(|found| found.same(&heliostat))
    );
}
