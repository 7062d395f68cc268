//! Session CRUD, write discipline, and error-policy integration tests.

use std::sync::Arc;

use chrono::Utc;
use cumbre::{
    GatewayError, ItemDraft, Level, MockGateway, Node, NodeId, NodePatch, NodeTree, Session,
    SessionError,
};

fn node(id: &str, level: Level, titulo: &str) -> Node {
    Node {
        id: NodeId::from(id),
        level,
        titulo: titulo.to_string(),
        descripcion: None,
        is_done: false,
        usuario_id: None,
        parent_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Personal → Salud → Correr 10k, with an empty sibling vision.
fn seed() -> Vec<NodeTree> {
    vec![NodeTree {
        node: node("o1", Level::Organizacion, "Personal"),
        children: vec![
            NodeTree {
                node: node("v1", Level::Vision, "Salud"),
                children: vec![NodeTree::leaf(node("m1", Level::Meta, "Correr 10k"))],
            },
            NodeTree::leaf(node("v2", Level::Vision, "Finanzas")),
        ],
    }]
}

fn session_with_mock() -> (Session, Arc<MockGateway>) {
    let mock = Arc::new(MockGateway::with_seed(seed()));
    (Session::new(mock.clone()), mock)
}

#[tokio::test]
async fn test_create_appends_under_parent() {
    let (mut session, mock) = session_with_mock();
    session.refresh().await.unwrap();
    mock.reset_call_count();

    let created = session
        .create_child(
            Some(&NodeId::from("v1")),
            ItemDraft::new("Dormir mejor").with_descripcion("8 horas"),
        )
        .await
        .unwrap();

    // Level is derived from the parent, id was minted by the gateway
    assert_eq!(created.level, Level::Meta);
    assert_eq!(created.parent_id, Some(NodeId::from("v1")));

    // Optimistic insert: appended at the end, no refetch
    let children = session.store().children(&NodeId::from("v1"));
    assert_eq!(children.len(), 2);
    assert_eq!(children[1].id, created.id);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_create_new_root() {
    let (mut session, _mock) = session_with_mock();
    session.refresh().await.unwrap();

    let created = session
        .create_child(None, ItemDraft::new("Trabajo"))
        .await
        .unwrap();
    assert_eq!(created.level, Level::Organizacion);

    let roots = session.store().roots();
    assert_eq!(roots.len(), 2);
    assert_eq!(roots[1].id, created.id);
}

#[tokio::test]
async fn test_update_merges_returned_entity() {
    let (mut session, mock) = session_with_mock();
    session.refresh().await.unwrap();
    mock.reset_call_count();

    let updated = session
        .update_item(
            &NodeId::from("m1"),
            NodePatch::new().with_titulo("Correr 21k"),
        )
        .await
        .unwrap();

    assert_eq!(updated.titulo, "Correr 21k");
    assert_eq!(
        session.store().get(&NodeId::from("m1")).unwrap().titulo,
        "Correr 21k"
    );
    // Optimistic merge, no refetch
    assert_eq!(mock.call_count(), 1);
    // Siblings untouched
    assert_eq!(
        session.store().get(&NodeId::from("v2")).unwrap().titulo,
        "Finanzas"
    );
}

#[tokio::test]
async fn test_delete_drops_local_subtree() {
    let (mut session, mock) = session_with_mock();
    session.refresh().await.unwrap();
    mock.reset_call_count();

    session.delete_item(&NodeId::from("v1")).await.unwrap();

    assert!(!session.store().contains(&NodeId::from("v1")));
    assert!(!session.store().contains(&NodeId::from("m1")));
    assert!(session.store().contains(&NodeId::from("v2")));
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_deleting_unknown_item_fails_before_network() {
    let (mut session, mock) = session_with_mock();
    session.refresh().await.unwrap();
    mock.reset_call_count();

    let result = session.delete_item(&NodeId::from("nope")).await;
    assert!(matches!(result, Err(SessionError::UnknownNode(_))));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_failed_fetch_retains_previous_tree() {
    let (mut session, mock) = session_with_mock();
    session.refresh().await.unwrap();
    let len_before = session.store().len();

    mock.inject_failure(GatewayError::Network("connection reset".into()))
        .await;
    let result = session.refresh().await;
    assert!(matches!(
        result,
        Err(SessionError::Gateway(GatewayError::Network(_)))
    ));

    // Previous tree intact, caller can retry
    assert_eq!(session.store().len(), len_before);
}

#[tokio::test]
async fn test_validation_error_leaves_state_unchanged() {
    let (mut session, _mock) = session_with_mock();
    session.refresh().await.unwrap();
    let len_before = session.store().len();

    let result = session
        .create_child(Some(&NodeId::from("v1")), ItemDraft::new("  "))
        .await;
    assert!(matches!(
        result,
        Err(SessionError::Gateway(GatewayError::Validation(_)))
    ));
    assert_eq!(session.store().len(), len_before);
}

#[tokio::test]
async fn test_not_found_on_update_triggers_resync() {
    let (mut session, mock) = session_with_mock();
    session.refresh().await.unwrap();

    // Another device deletes m1 behind this client's back
    use cumbre::Gateway;
    mock.delete(Level::Meta, &NodeId::from("m1")).await.unwrap();
    assert!(session.store().contains(&NodeId::from("m1")));
    mock.reset_call_count();

    let result = session
        .update_item(&NodeId::from("m1"), NodePatch::new().with_is_done(true))
        .await;
    assert!(matches!(
        result,
        Err(SessionError::Gateway(GatewayError::NotFound(_)))
    ));

    // The failed update triggered a full refetch: the stale node is gone
    assert_eq!(mock.call_count(), 2);
    assert!(!session.store().contains(&NodeId::from("m1")));
}

#[tokio::test]
async fn test_not_found_on_delete_triggers_resync() {
    let (mut session, mock) = session_with_mock();
    session.refresh().await.unwrap();

    use cumbre::Gateway;
    mock.delete(Level::Meta, &NodeId::from("m1")).await.unwrap();
    mock.reset_call_count();

    let result = session.delete_item(&NodeId::from("m1")).await;
    assert!(matches!(
        result,
        Err(SessionError::Gateway(GatewayError::NotFound(_)))
    ));

    // Resynchronized rather than silently ignored
    assert_eq!(mock.call_count(), 2);
    assert!(!session.store().contains(&NodeId::from("m1")));
}

#[tokio::test]
async fn test_auth_error_clears_session() {
    let (mut session, mock) = session_with_mock();
    session.refresh().await.unwrap();
    session.enter(&NodeId::from("o1")).unwrap();
    session.enter(&NodeId::from("v1")).unwrap();

    mock.inject_failure(GatewayError::Auth("token expired".into()))
        .await;
    let result = session.refresh().await;
    assert!(matches!(
        result,
        Err(SessionError::Gateway(GatewayError::Auth(_)))
    ));

    // Fatal: both tree and navigation path are gone
    assert!(session.store().is_empty());
    assert!(session.navigation().is_at_root());
}

#[tokio::test]
async fn test_breadcrumb_jump_scenario() {
    let (mut session, _mock) = session_with_mock();
    session.refresh().await.unwrap();

    session.enter(&NodeId::from("o1")).unwrap();
    session.enter(&NodeId::from("v1")).unwrap();
    assert_eq!(session.current().unwrap().id, NodeId::from("v1"));
    assert_eq!(session.current_children().len(), 1);

    session.jump_to(0);
    assert_eq!(session.breadcrumbs().len(), 1);
    assert_eq!(session.current().unwrap().id, NodeId::from("o1"));

    session.back();
    assert!(session.navigation().is_at_root());
    // Back at the root the children are the root organizations
    assert_eq!(session.current_children().len(), 1);

    // Back on an empty path stays at the root
    session.back();
    assert!(session.navigation().is_at_root());
}

#[tokio::test]
async fn test_updating_breadcrumb_node_refreshes_path() {
    let (mut session, _mock) = session_with_mock();
    session.refresh().await.unwrap();

    session.enter(&NodeId::from("o1")).unwrap();
    session.enter(&NodeId::from("v1")).unwrap();

    session
        .update_item(
            &NodeId::from("v1"),
            NodePatch::new().with_titulo("Salud integral"),
        )
        .await
        .unwrap();

    // The optimistic write also re-pointed the breadcrumb trail
    assert_eq!(session.breadcrumbs()[1].node.titulo, "Salud integral");
}
