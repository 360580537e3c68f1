//! End-to-end resolution scenarios.
//!
//! These tests build small entity graphs through the public API and check
//! the observable guarantees of the model:
//! 1. value-equal items collapse into one slot, newest data wins
//! 2. the first applicable rule decides, regardless of specificity
//! 3. parent edges that would close a cycle are refused
//! 4. inherited permissions are aggregated once, in ancestor order
//! 5. revoking an inheritance edge revokes the inherited access

use acl_graph::{
    AclError, Assertion, CollectionKey, Entity, EntityCollection, Permission,
    PermissionCollection, ValueEquatable,
};
use serde_json::json;

/// A three-level role chain: jdoe -> admin -> super-admin.
struct BlogFixture {
    jdoe: Entity,
    admin: Entity,
    super_admin: Entity,
}

impl BlogFixture {
    fn new() -> Self {
        let super_admin = Entity::new("super-admin").unwrap();
        super_admin.add_permission(Permission::new("edit", "blog-post"));

        let admin = Entity::new("admin").unwrap();
        admin.add_parent(&super_admin).unwrap();

        let jdoe = Entity::new("jdoe").unwrap();
        jdoe.add_parent(&admin).unwrap();

        Self {
            jdoe,
            admin,
            super_admin,
        }
    }
}

#[test]
fn test_inherited_access_and_revocation() {
    let fixture = BlogFixture::new();
    assert!(fixture.jdoe.is_allowed("edit", "blog-post", None, &[]));
    assert!(fixture.jdoe.is_allowed("EDIT", "Blog-Post", None, &[]));
    assert!(!fixture.jdoe.is_allowed("delete", "blog-post", None, &[]));

    assert!(fixture.jdoe.remove_parent_if_exists(&fixture.admin));
    assert!(!fixture.jdoe.is_allowed("edit", "blog-post", None, &[]));

    // Other edges are untouched.
    assert!(fixture.admin.is_allowed("edit", "blog-post", None, &[]));
}

#[test]
fn test_revocation_through_distinct_equal_instance() {
    let fixture = BlogFixture::new();
    let lookalike = Entity::new("ADMIN").unwrap();
    assert!(fixture.jdoe.remove_parent_if_exists(&lookalike));
    assert!(!fixture.jdoe.is_child_of(&fixture.super_admin));
}

#[test]
fn test_permission_dedup_keeps_key_and_takes_new_data() {
    let rules = PermissionCollection::new();
    rules.add(Permission::new("read", "post"));
    rules.add(Permission::new("edit", "post"));
    let replacement = Permission::builder("Edit", "POST")
        .allow(false)
        .assertion(Assertion::new(|_| true))
        .build();
    rules.add(replacement.clone());

    assert_eq!(rules.count(), 2);
    let stored = rules.get(&CollectionKey::Index(1)).unwrap();
    assert!(stored.ptr_eq(&replacement));
    assert!(!stored.allows());
    assert!(stored.assertion().is_some());
}

#[test]
fn test_entity_dedup_keeps_key_and_takes_new_data() {
    let entities = EntityCollection::new();
    entities.add(Entity::new("guest").unwrap());
    entities.add(Entity::new("editor").unwrap());

    let replacement = Entity::new("Editor").unwrap();
    replacement.add_permission(Permission::new("edit", "post"));
    entities.add(replacement.clone());

    assert_eq!(entities.count(), 2);
    let stored = entities.get(&CollectionKey::Index(1)).unwrap();
    assert!(stored.ptr_eq(&replacement));
    assert_eq!(stored.get_direct_permissions().count(), 1);
}

#[test]
fn test_wildcard_precedence_by_insertion_order() {
    let deny_first = PermissionCollection::from_items(vec![
        Permission::deny("a", "r"),
        Permission::new("*", "*"),
    ]);
    assert!(!deny_first.is_allowed("a", "r", None, &[]));

    let allow_first = PermissionCollection::from_items(vec![
        Permission::new("*", "*"),
        Permission::deny("a", "r"),
    ]);
    assert!(allow_first.is_allowed("a", "r", None, &[]));
}

#[test]
fn test_direct_deny_beats_inherited_wildcard() {
    let fixture = BlogFixture::new();
    fixture.super_admin.add_permission(Permission::new("*", "*"));
    fixture.jdoe.add_permission(Permission::deny("delete", "blog-post"));

    assert!(!fixture.jdoe.is_allowed("delete", "blog-post", None, &[]));
    assert!(fixture.jdoe.is_allowed("publish", "blog-post", None, &[]));
}

#[test]
fn test_cycle_prevention() {
    let x = Entity::new("x").unwrap();
    let y = Entity::new("y").unwrap();
    let z = Entity::new("z").unwrap();
    x.add_parent(&y).unwrap();
    y.add_parent(&z).unwrap();

    let err = z.add_parent(&x).unwrap_err();
    assert!(matches!(err, AclError::ParentCannotBeChild { .. }));
    assert_eq!(err.error_code(), "PARENT_CANNOT_BE_CHILD");
    assert!(z.get_direct_parents().is_empty());
    assert!(!z.is_child_of(&x));
}

#[test]
fn test_idempotent_parent_and_permission_add() {
    let child = Entity::new("child").unwrap();
    child.add_parent(&Entity::new("parent").unwrap()).unwrap();
    child.add_parent(&Entity::new("PARENT").unwrap()).unwrap();
    assert_eq!(child.get_direct_parents().count(), 1);

    child.add_permission(Permission::new("edit", "post"));
    child.add_permission(Permission::new("edit", "post"));
    assert_eq!(child.get_direct_permissions().count(), 1);
}

#[test]
fn test_inheritance_aggregation_uniqueness() {
    let grandparent = Entity::new("g").unwrap();
    let parent = Entity::new("p").unwrap();
    let child = Entity::new("c").unwrap();
    parent.add_parent(&grandparent).unwrap();
    child.add_parent(&parent).unwrap();

    grandparent.add_permission(Permission::new("edit", "post"));
    parent.add_permission(Permission::new("edit", "post"));

    let inherited = child.get_inherited_permissions(None);
    assert_eq!(inherited.count(), 1);
    assert!(inherited
        .first()
        .unwrap()
        .is_equal_to(&Permission::new("edit", "post")));
}

#[test]
fn test_all_permissions_key_order() {
    let parent = Entity::new("parent").unwrap();
    parent.add_permission(Permission::new("i1", "r"));
    parent.add_permission(Permission::new("i2", "r"));
    let child = Entity::new("child").unwrap();
    child.add_permission(Permission::new("d1", "r"));
    child.add_permission(Permission::new("d2", "r"));
    child.add_parent(&parent).unwrap();

    let entries = |all: PermissionCollection| -> Vec<(CollectionKey, String)> {
        all.entries()
            .into_iter()
            .map(|(key, p)| (key, p.action().to_string()))
            .collect()
    };

    assert_eq!(
        entries(child.get_all_permissions(true, None)),
        vec![
            (CollectionKey::Index(0), "d1".to_string()),
            (CollectionKey::Index(1), "d2".to_string()),
            (CollectionKey::Index(2), "i1".to_string()),
            (CollectionKey::Index(3), "i2".to_string()),
        ]
    );
    assert_eq!(
        entries(child.get_all_permissions(false, None)),
        vec![
            (CollectionKey::Index(0), "i1".to_string()),
            (CollectionKey::Index(1), "i2".to_string()),
            (CollectionKey::Index(2), "d1".to_string()),
            (CollectionKey::Index(3), "d2".to_string()),
        ]
    );
}

#[test]
fn test_bounded_find() {
    let rules = PermissionCollection::from_items(vec![
        Permission::new("edit", "post"),
        Permission::new("read", "post"),
    ]);
    assert!(rules.find_all("", "").is_empty());
    assert!(PermissionCollection::new().find_one("edit", "post").is_none());
    assert!(rules.find_one("delete", "comment").is_none());
    assert_eq!(rules.find_all("", "POST").count(), 2);
}

#[test]
fn test_shared_permission_instance_across_entities() {
    let shared = Permission::new("moderate", "comment");
    let a = Entity::new("a").unwrap();
    let b = Entity::new("b").unwrap();
    a.add_permission(shared.clone());
    b.add_permission(shared.clone());

    assert!(a.is_allowed("moderate", "comment", None, &[]));
    shared.set_allow(false);
    assert!(!a.is_allowed("moderate", "comment", None, &[]));
    assert!(!b.is_allowed("moderate", "comment", None, &[]));
}

#[test]
fn test_ownership_assertion_through_inheritance() {
    let owner_check = Assertion::new(|args| match (args.first(), args.get(1)) {
        (Some(user), Some(author)) => user == author,
        _ => false,
    });

    let author_role = Entity::new("author").unwrap();
    author_role.add_permission(
        Permission::builder("edit", "blog-post")
            .assertion(owner_check)
            .build(),
    );
    let jdoe = Entity::new("jdoe").unwrap();
    jdoe.add_parent(&author_role).unwrap();

    assert!(jdoe.is_allowed("edit", "blog-post", None, &[json!("jdoe"), json!("jdoe")]));
    assert!(!jdoe.is_allowed("edit", "blog-post", None, &[json!("jdoe"), json!("asmith")]));
    assert!(!jdoe.is_allowed("edit", "blog-post", None, &[]));
}

#[test]
fn test_add_parents_batch_is_not_transactional() {
    let root = Entity::new("root").unwrap();
    let descendant = Entity::new("descendant").unwrap();
    descendant.add_parent(&root).unwrap();

    let batch = EntityCollection::from_items(vec![
        Entity::new("first").unwrap(),
        descendant,
        Entity::new("never").unwrap(),
    ]);
    assert!(root.add_parents(&batch).is_err());
    assert_eq!(root.get_direct_parents().ids(), vec!["first"]);
}
