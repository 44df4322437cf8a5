use memos_store::driver::MemoDriver;
use memos_store::model::{
    DeleteMemo, FindMemo, FindMemoOrganizer, FindMemoRelation, FindResource, FindTag, Memo,
    MemoRelation, MemoRelationType, Resource, Role, UpdateMemo, UpdateResource, User, Visibility,
};
use memos_store::{Context, DriverError, Profile, Store, StoreError};
use std::collections::BTreeMap;

fn open_store() -> (Store, Context) {
    let ctx = Context::background();
    let store = Store::open(&ctx, Profile::in_memory()).unwrap();
    (store, ctx)
}

fn create_user(store: &Store, ctx: &Context, username: &str) -> User {
    store
        .create_user(ctx, &User::new(username, Role::User, "hash"))
        .unwrap()
}

fn create_memo(store: &Store, ctx: &Context, creator_id: i32, content: &str) -> Memo {
    store
        .create_memo(ctx, &Memo::new(creator_id, content, Visibility::Private))
        .unwrap()
}

#[test]
fn visibility_follows_updates() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    let m1 = create_memo(&store, &ctx, alice.id, "first memo");

    let visibilities = store.find_memos_visibility_list(&ctx, &[m1.id]).unwrap();
    assert_eq!(
        visibilities,
        BTreeMap::from([(m1.id, Visibility::Private)])
    );

    store
        .update_memo(
            &ctx,
            &UpdateMemo {
                id: m1.id,
                visibility: Some(Visibility::Public),
                ..UpdateMemo::default()
            },
        )
        .unwrap();

    let visibilities = store.find_memos_visibility_list(&ctx, &[m1.id]).unwrap();
    assert_eq!(visibilities, BTreeMap::from([(m1.id, Visibility::Public)]));
}

#[test]
fn visibility_list_omits_unknown_ids() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    let m1 = create_memo(&store, &ctx, alice.id, "one");
    let m2 = create_memo(&store, &ctx, alice.id, "two");

    let visibilities = store
        .find_memos_visibility_list(&ctx, &[m1.id, 9_999, m2.id, -1])
        .unwrap();
    assert_eq!(visibilities.len(), 2);
    assert!(visibilities.contains_key(&m1.id));
    assert!(visibilities.contains_key(&m2.id));
    assert!(store.find_memos_visibility_list(&ctx, &[]).unwrap().is_empty());
}

#[test]
fn created_memo_has_identity_and_timestamps() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    let memo = create_memo(&store, &ctx, alice.id, "hello");

    assert!(memo.id > 0);
    assert!(!memo.uid.is_empty());
    assert!(memo.created_ts > 0);
    assert_eq!(memo.created_ts, memo.updated_ts);
    assert!(!memo.pinned);
    assert_eq!(memo.parent_id, None);
}

#[test]
fn duplicate_memo_uid_is_conflict() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    let first = create_memo(&store, &ctx, alice.id, "a");

    let mut clash = Memo::new(alice.id, "b", Visibility::Public);
    clash.uid = first.uid.clone();
    let err = store.create_memo(&ctx, &clash).unwrap_err();
    assert!(matches!(err, StoreError::Driver(DriverError::Conflict(_))));
}

#[test]
fn update_of_missing_memo_is_not_found_and_empty_patch_is_invalid() {
    let (store, ctx) = open_store();

    let err = store
        .update_memo(
            &ctx,
            &UpdateMemo {
                id: 404,
                content: Some("x".to_string()),
                ..UpdateMemo::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::Driver(DriverError::NotFound(_))));

    let err = store
        .update_memo(
            &ctx,
            &UpdateMemo {
                id: 404,
                ..UpdateMemo::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Driver(DriverError::InvalidArgument(_))
    ));
}

#[test]
fn pinned_memos_list_first_for_their_creator() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    let bob = create_user(&store, &ctx, "bob");
    let older = create_memo(&store, &ctx, alice.id, "older");
    let newer = create_memo(&store, &ctx, alice.id, "newer");

    store.set_memo_pinned(&ctx, older.id, alice.id, true).unwrap();
    // Another user's pin does not change the creator's view.
    store.set_memo_pinned(&ctx, newer.id, bob.id, true).unwrap();

    let memos = store
        .list_memos(
            &ctx,
            &FindMemo {
                creator_id: Some(alice.id),
                ..FindMemo::default()
            },
        )
        .unwrap();
    let ids: Vec<i32> = memos.iter().map(|memo| memo.id).collect();
    assert_eq!(ids, vec![older.id, newer.id]);
    assert!(memos[0].pinned);
    assert!(!memos[1].pinned);

    let pinned_only = store
        .list_memos(
            &ctx,
            &FindMemo {
                pinned: Some(true),
                ..FindMemo::default()
            },
        )
        .unwrap();
    assert_eq!(pinned_only.len(), 1);
    assert_eq!(pinned_only[0].id, older.id);
}

#[test]
fn filters_are_conjunctive() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    let bob = create_user(&store, &ctx, "bob");
    create_memo(&store, &ctx, alice.id, "groceries: milk");
    let wanted = store
        .create_memo(
            &ctx,
            &Memo::new(alice.id, "groceries: bread", Visibility::Public),
        )
        .unwrap();
    store
        .create_memo(
            &ctx,
            &Memo::new(bob.id, "groceries: eggs", Visibility::Public),
        )
        .unwrap();

    let found = store
        .list_memos(
            &ctx,
            &FindMemo {
                creator_id: Some(alice.id),
                content_search: vec!["groceries".to_string()],
                visibility_list: vec![Visibility::Public, Visibility::Protected],
                ..FindMemo::default()
            },
        )
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, wanted.id);

    let everything = store.list_memos(&ctx, &FindMemo::default()).unwrap();
    assert_eq!(everything.len(), 3);

    let paged = store
        .list_memos(
            &ctx,
            &FindMemo {
                limit: Some(2),
                offset: 2,
                ..FindMemo::default()
            },
        )
        .unwrap();
    assert_eq!(paged.len(), 1);
}

#[test]
fn content_search_treats_wildcards_literally() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    create_memo(&store, &ctx, alice.id, "100% done");
    create_memo(&store, &ctx, alice.id, "1000 done");

    let found = store
        .list_memos(
            &ctx,
            &FindMemo {
                content_search: vec!["0%".to_string()],
                ..FindMemo::default()
            },
        )
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].content, "100% done");
}

#[test]
fn exclude_content_blanks_content_only() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    let memo = create_memo(&store, &ctx, alice.id, "secret text");

    let found = store
        .get_memo(
            &ctx,
            &FindMemo {
                id: Some(memo.id),
                exclude_content: true,
                ..FindMemo::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(found.content, "");
    assert_eq!(found.uid, memo.uid);
}

#[test]
fn comment_relation_sets_parent() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    let parent = create_memo(&store, &ctx, alice.id, "parent");
    let comment = create_memo(&store, &ctx, alice.id, "comment");

    store
        .upsert_memo_relation(
            &ctx,
            &MemoRelation {
                memo_id: comment.id,
                related_memo_id: parent.id,
                kind: MemoRelationType::Comment,
            },
        )
        .unwrap();

    let comment = store
        .get_memo(
            &ctx,
            &FindMemo {
                id: Some(comment.id),
                ..FindMemo::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(comment.parent_id, Some(parent.id));

    let top_level = store
        .list_memos(
            &ctx,
            &FindMemo {
                has_parent: Some(false),
                ..FindMemo::default()
            },
        )
        .unwrap();
    assert_eq!(top_level.len(), 1);
    assert_eq!(top_level[0].id, parent.id);
}

#[test]
fn comment_on_itself_is_rejected() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    let memo = create_memo(&store, &ctx, alice.id, "self");

    let err = store
        .upsert_memo_relation(
            &ctx,
            &MemoRelation {
                memo_id: memo.id,
                related_memo_id: memo.id,
                kind: MemoRelationType::Comment,
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Driver(DriverError::InvalidArgument(_))
    ));
}

#[test]
fn failed_cascade_names_the_first_step() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    let memo = create_memo(&store, &ctx, alice.id, "doomed");
    store.close().unwrap();

    let err = store
        .delete_memo(&ctx, &DeleteMemo { id: memo.id })
        .unwrap_err();
    match &err {
        StoreError::Cascade { step, source } => {
            assert_eq!(*step, "delete_outgoing_relations");
            assert!(matches!(source, DriverError::Unavailable(_)));
        }
        other => panic!("expected a cascade failure, got {other}"),
    }
    assert!(err.driver_error().is_retryable());
}

#[test]
fn deleting_memo_cascades_and_detaches_resources() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    let target = create_memo(&store, &ctx, alice.id, "target");
    let other = create_memo(&store, &ctx, alice.id, "other");

    for (memo_id, related_memo_id) in [(target.id, other.id), (other.id, target.id)] {
        store
            .upsert_memo_relation(
                &ctx,
                &MemoRelation {
                    memo_id,
                    related_memo_id,
                    kind: MemoRelationType::Reference,
                },
            )
            .unwrap();
    }
    store.set_memo_pinned(&ctx, target.id, alice.id, true).unwrap();

    let mut attachment = Resource::new(alice.id, "photo.png", "image/png", 2048);
    attachment.memo_id = Some(target.id);
    let attachment = store.create_resource(&ctx, &attachment).unwrap();

    store
        .delete_memo(&ctx, &DeleteMemo { id: target.id })
        .unwrap();

    let outgoing = store
        .list_memo_relations(
            &ctx,
            &FindMemoRelation {
                memo_id: Some(target.id),
                ..FindMemoRelation::default()
            },
        )
        .unwrap();
    let incoming = store
        .list_memo_relations(
            &ctx,
            &FindMemoRelation {
                related_memo_id: Some(target.id),
                ..FindMemoRelation::default()
            },
        )
        .unwrap();
    let organizers = store
        .list_memo_organizers(
            &ctx,
            &FindMemoOrganizer {
                memo_id: Some(target.id),
                ..FindMemoOrganizer::default()
            },
        )
        .unwrap();
    assert!(outgoing.is_empty());
    assert!(incoming.is_empty());
    assert!(organizers.is_empty());

    let resource = store
        .get_resource(
            &ctx,
            &FindResource {
                id: Some(attachment.id),
                ..FindResource::default()
            },
        )
        .unwrap()
        .unwrap();
    assert_eq!(resource.memo_id, None);

    // Retrying the cascade on a gone memo succeeds.
    store
        .delete_memo(&ctx, &DeleteMemo { id: target.id })
        .unwrap();
}

#[test]
fn driver_delete_alone_also_cascades() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    let target = create_memo(&store, &ctx, alice.id, "target");
    let other = create_memo(&store, &ctx, alice.id, "other");
    store
        .upsert_memo_relation(
            &ctx,
            &MemoRelation {
                memo_id: other.id,
                related_memo_id: target.id,
                kind: MemoRelationType::Comment,
            },
        )
        .unwrap();

    store
        .driver()
        .delete_memo(&ctx, &DeleteMemo { id: target.id })
        .unwrap();

    let relations = store
        .list_memo_relations(&ctx, &FindMemoRelation::default())
        .unwrap();
    assert!(relations.is_empty());
}

#[test]
fn memo_detail_collects_related_rows() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    let memo = create_memo(&store, &ctx, alice.id, "detail");
    let comment = create_memo(&store, &ctx, alice.id, "a comment");
    store
        .upsert_memo_relation(
            &ctx,
            &MemoRelation {
                memo_id: comment.id,
                related_memo_id: memo.id,
                kind: MemoRelationType::Comment,
            },
        )
        .unwrap();
    store.set_memo_pinned(&ctx, memo.id, alice.id, true).unwrap();
    let resource = store
        .create_resource(&ctx, &Resource::new(alice.id, "a.txt", "text/plain", 3))
        .unwrap();
    store
        .update_resource(
            &ctx,
            &UpdateResource {
                id: resource.id,
                memo_id: Some(Some(memo.id)),
                ..UpdateResource::default()
            },
        )
        .unwrap();

    let detail = store.get_memo_detail(&ctx, memo.id).unwrap().unwrap();
    assert!(detail.memo.pinned);
    assert!(detail.relations.is_empty());
    assert_eq!(detail.referenced_by.len(), 1);
    assert_eq!(detail.organizers.len(), 1);
    assert_eq!(detail.resources.len(), 1);

    assert!(store.get_memo_detail(&ctx, 4_040).unwrap().is_none());
}

#[test]
fn memo_content_tags_are_registered() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    let memo = create_memo(&store, &ctx, alice.id, "plan #work and #home");

    store
        .update_memo(
            &ctx,
            &UpdateMemo {
                id: memo.id,
                content: Some("plan #work and #travel".to_string()),
                ..UpdateMemo::default()
            },
        )
        .unwrap();

    let names: Vec<String> = store
        .list_tags(
            &ctx,
            &FindTag {
                creator_id: Some(alice.id),
            },
        )
        .unwrap()
        .into_iter()
        .map(|tag| tag.name)
        .collect();
    assert_eq!(names, vec!["home", "travel", "work"]);
}

#[test]
fn deleting_user_removes_their_memos() {
    let (store, ctx) = open_store();
    let alice = create_user(&store, &ctx, "alice");
    create_memo(&store, &ctx, alice.id, "gone soon");

    store
        .delete_user(&ctx, &memos_store::model::DeleteUser { id: alice.id })
        .unwrap();

    assert!(store.list_memos(&ctx, &FindMemo::default()).unwrap().is_empty());
}
