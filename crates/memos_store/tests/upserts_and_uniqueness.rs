use memos_store::driver::{
    MaintenanceDriver, MemoDriver, MemoOrganizerDriver, MemoRelationDriver, SystemSettingDriver,
    TagDriver, UserDriver, UserSettingDriver,
};
use memos_store::model::{
    AccessToken, DeleteMemoOrganizer, DeleteMemoRelation, DeleteTag, FindMemoOrganizer,
    FindMemoRelation, FindSystemSetting, FindTag, FindUser, FindUserSetting, FindUserSettingV1,
    Memo, MemoOrganizer, MemoRelation, MemoRelationType, Role, SystemSetting, Tag, UpdateUser,
    User, UserSetting, UserSettingKey, UserSettingV1, UserSettingValue, Visibility,
};
use memos_store::{Context, DriverError, SqliteDriver};
use std::sync::{Arc, Barrier};
use std::thread;

fn migrated_file_driver() -> (tempfile::TempDir, Arc<SqliteDriver>) {
    let dir = tempfile::tempdir().unwrap();
    let driver = SqliteDriver::open(dir.path().join("memos.db")).unwrap();
    driver.migrate(&Context::background()).unwrap();
    (dir, Arc::new(driver))
}

fn migrated_memory_driver() -> SqliteDriver {
    let driver = SqliteDriver::open_in_memory().unwrap();
    driver.migrate(&Context::background()).unwrap();
    driver
}

#[test]
fn concurrent_creates_with_same_username_yield_one_conflict() {
    let (_dir, driver) = migrated_file_driver();
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let driver = Arc::clone(&driver);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                driver.create_user(
                    &Context::background(),
                    &User::new("alice", Role::User, "hash"),
                )
            })
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let successes = results.iter().filter(|result| result.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|result| matches!(result, Err(DriverError::Conflict(_))))
        .count();
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);

    let users = driver
        .list_users(&Context::background(), &FindUser::default())
        .unwrap();
    assert_eq!(users.len(), 1);
}

#[test]
fn user_update_applies_only_present_fields() {
    let driver = migrated_memory_driver();
    let ctx = Context::background();
    let alice = driver
        .create_user(&ctx, &User::new("alice", Role::Admin, "hash"))
        .unwrap();

    let updated = driver
        .update_user(
            &ctx,
            &UpdateUser {
                id: alice.id,
                nickname: Some("Al".to_string()),
                ..UpdateUser::default()
            },
        )
        .unwrap();
    assert_eq!(updated.nickname, "Al");
    assert_eq!(updated.username, "alice");
    assert_eq!(updated.role, Role::Admin);

    let err = driver
        .update_user(
            &ctx,
            &UpdateUser {
                id: alice.id + 100,
                nickname: Some("ghost".to_string()),
                ..UpdateUser::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, DriverError::NotFound(_)));

    let bob = driver
        .create_user(&ctx, &User::new("bob", Role::User, "hash"))
        .unwrap();
    let err = driver
        .update_user(
            &ctx,
            &UpdateUser {
                id: bob.id,
                username: Some("alice".to_string()),
                ..UpdateUser::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, DriverError::Conflict(_)));
}

#[test]
fn tag_upserted_twice_is_listed_once() {
    let driver = migrated_memory_driver();
    let ctx = Context::background();
    let alice = driver
        .create_user(&ctx, &User::new("alice", Role::User, "hash"))
        .unwrap();

    driver.upsert_tag(&ctx, &Tag::new("work", alice.id)).unwrap();
    driver.upsert_tag(&ctx, &Tag::new("work", alice.id)).unwrap();

    let tags = driver
        .list_tags(
            &ctx,
            &FindTag {
                creator_id: Some(alice.id),
            },
        )
        .unwrap();
    assert_eq!(tags, vec![Tag::new("work", alice.id)]);

    driver
        .delete_tag(
            &ctx,
            &DeleteTag {
                name: "work".to_string(),
                creator_id: alice.id,
            },
        )
        .unwrap();
    assert!(driver.list_tags(&ctx, &FindTag::default()).unwrap().is_empty());
}

#[test]
fn system_setting_upsert_keeps_last_payload() {
    let driver = migrated_memory_driver();
    let ctx = Context::background();

    driver
        .upsert_system_setting(&ctx, &SystemSetting::new("allow-signup", "true"))
        .unwrap();
    let second = driver
        .upsert_system_setting(
            &ctx,
            &SystemSetting {
                name: "allow-signup".to_string(),
                value: "false".to_string(),
                description: "closed beta".to_string(),
            },
        )
        .unwrap();
    assert_eq!(second.value, "false");

    let settings = driver
        .list_system_settings(&ctx, &FindSystemSetting::default())
        .unwrap();
    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0].value, "false");
    assert_eq!(settings[0].description, "closed beta");
}

#[test]
fn concurrent_upserts_never_duplicate_rows() {
    let (_dir, driver) = migrated_file_driver();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let driver = Arc::clone(&driver);
            thread::spawn(move || {
                driver
                    .upsert_system_setting(
                        &Context::background(),
                        &SystemSetting::new("server-id", format!("value-{i}")),
                    )
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let settings = driver
        .list_system_settings(
            &Context::background(),
            &FindSystemSetting {
                name: Some("server-id".to_string()),
            },
        )
        .unwrap();
    assert_eq!(settings.len(), 1);
}

#[test]
fn legacy_and_typed_user_settings_are_independent() {
    let driver = migrated_memory_driver();
    let ctx = Context::background();
    let alice = driver
        .create_user(&ctx, &User::new("alice", Role::User, "hash"))
        .unwrap();

    driver
        .upsert_user_setting(
            &ctx,
            &UserSetting {
                user_id: alice.id,
                key: "locale".to_string(),
                value: "\"en\"".to_string(),
            },
        )
        .unwrap();
    driver
        .upsert_user_setting(
            &ctx,
            &UserSetting {
                user_id: alice.id,
                key: "locale".to_string(),
                value: "\"fr\"".to_string(),
            },
        )
        .unwrap();
    driver
        .upsert_user_setting_v1(
            &ctx,
            &UserSettingV1 {
                user_id: alice.id,
                value: UserSettingValue::Locale("de".to_string()),
            },
        )
        .unwrap();
    driver
        .upsert_user_setting_v1(
            &ctx,
            &UserSettingV1 {
                user_id: alice.id,
                value: UserSettingValue::AccessTokens(vec![AccessToken {
                    access_token: "token-1".to_string(),
                    description: "cli".to_string(),
                }]),
            },
        )
        .unwrap();
    driver
        .upsert_user_setting_v1(
            &ctx,
            &UserSettingV1 {
                user_id: alice.id,
                value: UserSettingValue::MemoVisibility(Visibility::Protected),
            },
        )
        .unwrap();

    let legacy = driver
        .list_user_settings(
            &ctx,
            &FindUserSetting {
                user_id: Some(alice.id),
                ..FindUserSetting::default()
            },
        )
        .unwrap();
    assert_eq!(legacy.len(), 1);
    assert_eq!(legacy[0].value, "\"fr\"");

    let locale = driver
        .list_user_settings_v1(
            &ctx,
            &FindUserSettingV1 {
                user_id: Some(alice.id),
                key: Some(UserSettingKey::Locale),
            },
        )
        .unwrap();
    assert_eq!(locale.len(), 1);
    assert_eq!(locale[0].value, UserSettingValue::Locale("de".to_string()));

    let typed = driver
        .list_user_settings_v1(
            &ctx,
            &FindUserSettingV1 {
                user_id: Some(alice.id),
                ..FindUserSettingV1::default()
            },
        )
        .unwrap();
    assert_eq!(typed.len(), 3);
}

#[test]
fn organizer_and_relation_upserts_are_keyed() {
    let driver = migrated_memory_driver();
    let ctx = Context::background();
    let alice = driver
        .create_user(&ctx, &User::new("alice", Role::User, "hash"))
        .unwrap();
    let first = driver
        .create_memo(&ctx, &Memo::new(alice.id, "first", Visibility::Private))
        .unwrap();
    let second = driver
        .create_memo(&ctx, &Memo::new(alice.id, "second", Visibility::Private))
        .unwrap();

    for pinned in [true, false] {
        driver
            .upsert_memo_organizer(
                &ctx,
                &MemoOrganizer {
                    memo_id: first.id,
                    user_id: alice.id,
                    pinned,
                },
            )
            .unwrap();
    }
    let organizers = driver
        .list_memo_organizers(&ctx, &FindMemoOrganizer::default())
        .unwrap();
    assert_eq!(organizers.len(), 1);
    assert!(!organizers[0].pinned);

    let relation = MemoRelation {
        memo_id: first.id,
        related_memo_id: second.id,
        kind: MemoRelationType::Reference,
    };
    driver.upsert_memo_relation(&ctx, &relation).unwrap();
    driver.upsert_memo_relation(&ctx, &relation).unwrap();
    let relations = driver
        .list_memo_relations(&ctx, &FindMemoRelation::default())
        .unwrap();
    assert_eq!(relations, vec![relation]);
}

#[test]
fn unfiltered_deletes_are_rejected() {
    let driver = migrated_memory_driver();
    let ctx = Context::background();

    assert!(matches!(
        driver
            .delete_memo_relation(&ctx, &DeleteMemoRelation::default())
            .unwrap_err(),
        DriverError::InvalidArgument(_)
    ));
    assert!(matches!(
        driver
            .delete_memo_organizer(&ctx, &DeleteMemoOrganizer::default())
            .unwrap_err(),
        DriverError::InvalidArgument(_)
    ));
}

#[test]
fn deleting_missing_rows_is_not_an_error() {
    let driver = migrated_memory_driver();
    let ctx = Context::background();

    driver
        .delete_user(&ctx, &memos_store::model::DeleteUser { id: 77 })
        .unwrap();
    driver
        .delete_memo(&ctx, &memos_store::model::DeleteMemo { id: 77 })
        .unwrap();
    driver
        .delete_memo_relation(
            &ctx,
            &DeleteMemoRelation {
                memo_id: Some(77),
                ..DeleteMemoRelation::default()
            },
        )
        .unwrap();
}
