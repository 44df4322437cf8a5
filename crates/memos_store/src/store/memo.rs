//! Memo workflows spanning several entities.
//!
//! # Invariants
//! - Tags named in memo content exist for the memo creator after a
//!   successful create or content update.
//! - `delete_memo` runs relations, organizers, resources, memo in that
//!   order and reports the first failing step.

use super::{Store, StoreError, StoreResult};
use crate::context::Context;
use crate::driver::DriverError;
use crate::model::{
    DeleteMemo, DeleteMemoOrganizer, DeleteMemoRelation, DeleteResource, FindMemo,
    FindMemoOrganizer, FindMemoRelation, FindResource, Memo, MemoOrganizer, MemoRelation,
    Resource, Tag, UpdateMemo, UpdateResource, Visibility,
};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

/// `#tag` at line start or after whitespace; headings (`# x`, `## x`) do not match.
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(?:^|\s)#([^\s#]+)").expect("valid tag regex"));

const TAG_TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', '"', '\''];

/// A memo with everything that hangs off it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoDetail {
    pub memo: Memo,
    /// Edges where this memo is the source.
    pub relations: Vec<MemoRelation>,
    /// Edges pointing at this memo, e.g. its comments.
    pub referenced_by: Vec<MemoRelation>,
    pub organizers: Vec<MemoOrganizer>,
    pub resources: Vec<Resource>,
}

/// Tag names in `content`, in first-seen order without duplicates.
pub fn extract_tags(content: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for captures in TAG_RE.captures_iter(content) {
        let Some(raw) = captures.get(1) else {
            continue;
        };
        let name = raw.as_str().trim_end_matches(TAG_TRAILING_PUNCTUATION);
        if !name.is_empty() && !tags.iter().any(|existing| existing == name) {
            tags.push(name.to_string());
        }
    }
    tags
}

impl Store {
    /// Creates a memo and registers the tags its content names.
    pub fn create_memo(&self, ctx: &Context, create: &Memo) -> StoreResult<Memo> {
        let memo = self.driver.create_memo(ctx, create)?;
        self.sync_tags(ctx, memo.creator_id, &memo.content)?;
        Ok(memo)
    }

    pub fn list_memos(&self, ctx: &Context, find: &FindMemo) -> StoreResult<Vec<Memo>> {
        Ok(self.driver.list_memos(ctx, find)?)
    }

    /// First memo matching `find` in list order, or `None`.
    pub fn get_memo(&self, ctx: &Context, find: &FindMemo) -> StoreResult<Option<Memo>> {
        let find = FindMemo {
            limit: Some(1),
            offset: 0,
            ..find.clone()
        };
        Ok(self.driver.list_memos(ctx, &find)?.into_iter().next())
    }

    /// Applies `update`; a content change also registers new tags.
    pub fn update_memo(&self, ctx: &Context, update: &UpdateMemo) -> StoreResult<Memo> {
        let memo = self.driver.update_memo(ctx, update)?;
        if update.content.is_some() {
            self.sync_tags(ctx, memo.creator_id, &memo.content)?;
        }
        Ok(memo)
    }

    /// Deletes a memo after retracting its relations and organizer rows and
    /// detaching its resources.
    pub fn delete_memo(&self, ctx: &Context, delete: &DeleteMemo) -> StoreResult<()> {
        let memo_id = delete.id;

        cascade_step(memo_id, "delete_outgoing_relations", || {
            self.driver.delete_memo_relation(
                ctx,
                &DeleteMemoRelation {
                    memo_id: Some(memo_id),
                    ..DeleteMemoRelation::default()
                },
            )
        })?;
        cascade_step(memo_id, "delete_incoming_relations", || {
            self.driver.delete_memo_relation(
                ctx,
                &DeleteMemoRelation {
                    related_memo_id: Some(memo_id),
                    ..DeleteMemoRelation::default()
                },
            )
        })?;
        cascade_step(memo_id, "delete_organizers", || {
            self.driver.delete_memo_organizer(
                ctx,
                &DeleteMemoOrganizer {
                    memo_id: Some(memo_id),
                    ..DeleteMemoOrganizer::default()
                },
            )
        })?;
        cascade_step(memo_id, "detach_resources", || {
            let attached = self.driver.list_resources(
                ctx,
                &FindResource {
                    memo_id: Some(memo_id),
                    ..FindResource::default()
                },
            )?;
            for resource in attached {
                let detach = UpdateResource {
                    id: resource.id,
                    memo_id: Some(None),
                    ..UpdateResource::default()
                };
                match self.driver.update_resource(ctx, &detach) {
                    // Deleted concurrently: nothing left to detach.
                    Ok(_) | Err(DriverError::NotFound(_)) => {}
                    Err(err) => return Err(err),
                }
            }
            Ok(())
        })?;
        cascade_step(memo_id, "delete_memo", || {
            self.driver.delete_memo(ctx, delete)
        })
    }

    pub fn find_memos_visibility_list(
        &self,
        ctx: &Context,
        memo_ids: &[i32],
    ) -> StoreResult<BTreeMap<i32, Visibility>> {
        Ok(self.driver.find_memos_visibility_list(ctx, memo_ids)?)
    }

    /// Sets the pin state `user_id` keeps for `memo_id`.
    pub fn set_memo_pinned(
        &self,
        ctx: &Context,
        memo_id: i32,
        user_id: i32,
        pinned: bool,
    ) -> StoreResult<MemoOrganizer> {
        let organizer = MemoOrganizer {
            memo_id,
            user_id,
            pinned,
        };
        Ok(self.driver.upsert_memo_organizer(ctx, &organizer)?)
    }

    /// Memo plus relations in both directions, organizer rows and resources.
    pub fn get_memo_detail(&self, ctx: &Context, memo_id: i32) -> StoreResult<Option<MemoDetail>> {
        let find = FindMemo {
            id: Some(memo_id),
            ..FindMemo::default()
        };
        let Some(memo) = self.get_memo(ctx, &find)? else {
            return Ok(None);
        };

        let relations = self.driver.list_memo_relations(
            ctx,
            &FindMemoRelation {
                memo_id: Some(memo_id),
                ..FindMemoRelation::default()
            },
        )?;
        let referenced_by = self.driver.list_memo_relations(
            ctx,
            &FindMemoRelation {
                related_memo_id: Some(memo_id),
                ..FindMemoRelation::default()
            },
        )?;
        let organizers = self.driver.list_memo_organizers(
            ctx,
            &FindMemoOrganizer {
                memo_id: Some(memo_id),
                ..FindMemoOrganizer::default()
            },
        )?;
        let resources = self.driver.list_resources(
            ctx,
            &FindResource {
                memo_id: Some(memo_id),
                ..FindResource::default()
            },
        )?;

        Ok(Some(MemoDetail {
            memo,
            relations,
            referenced_by,
            organizers,
            resources,
        }))
    }

    // Relations and organizers

    pub fn upsert_memo_relation(
        &self,
        ctx: &Context,
        upsert: &MemoRelation,
    ) -> StoreResult<MemoRelation> {
        Ok(self.driver.upsert_memo_relation(ctx, upsert)?)
    }

    pub fn list_memo_relations(
        &self,
        ctx: &Context,
        find: &FindMemoRelation,
    ) -> StoreResult<Vec<MemoRelation>> {
        Ok(self.driver.list_memo_relations(ctx, find)?)
    }

    pub fn delete_memo_relation(
        &self,
        ctx: &Context,
        delete: &DeleteMemoRelation,
    ) -> StoreResult<()> {
        Ok(self.driver.delete_memo_relation(ctx, delete)?)
    }

    pub fn upsert_memo_organizer(
        &self,
        ctx: &Context,
        upsert: &MemoOrganizer,
    ) -> StoreResult<MemoOrganizer> {
        Ok(self.driver.upsert_memo_organizer(ctx, upsert)?)
    }

    pub fn list_memo_organizers(
        &self,
        ctx: &Context,
        find: &FindMemoOrganizer,
    ) -> StoreResult<Vec<MemoOrganizer>> {
        Ok(self.driver.list_memo_organizers(ctx, find)?)
    }

    pub fn delete_memo_organizer(
        &self,
        ctx: &Context,
        delete: &DeleteMemoOrganizer,
    ) -> StoreResult<()> {
        Ok(self.driver.delete_memo_organizer(ctx, delete)?)
    }

    // Resources

    pub fn create_resource(&self, ctx: &Context, create: &Resource) -> StoreResult<Resource> {
        Ok(self.driver.create_resource(ctx, create)?)
    }

    pub fn list_resources(&self, ctx: &Context, find: &FindResource) -> StoreResult<Vec<Resource>> {
        Ok(self.driver.list_resources(ctx, find)?)
    }

    pub fn get_resource(&self, ctx: &Context, find: &FindResource) -> StoreResult<Option<Resource>> {
        let find = FindResource {
            limit: Some(1),
            offset: 0,
            ..find.clone()
        };
        Ok(self.driver.list_resources(ctx, &find)?.into_iter().next())
    }

    pub fn update_resource(&self, ctx: &Context, update: &UpdateResource) -> StoreResult<Resource> {
        Ok(self.driver.update_resource(ctx, update)?)
    }

    pub fn delete_resource(&self, ctx: &Context, delete: &DeleteResource) -> StoreResult<()> {
        Ok(self.driver.delete_resource(ctx, delete)?)
    }

    fn sync_tags(&self, ctx: &Context, creator_id: i32, content: &str) -> StoreResult<()> {
        for name in extract_tags(content) {
            self.driver
                .upsert_tag(ctx, &Tag::new(name, creator_id))
                .map_err(|source| StoreError::Cascade {
                    step: "upsert_tags",
                    source,
                })?;
        }
        Ok(())
    }
}

fn cascade_step(
    memo_id: i32,
    step: &'static str,
    run: impl FnOnce() -> Result<(), DriverError>,
) -> StoreResult<()> {
    run().map_err(|source| {
        warn!(
            "event=memo_delete_cascade module=store status=error memo_id={} step={} error={}",
            memo_id, step, source
        );
        StoreError::Cascade { step, source }
    })
}

#[cfg(test)]
mod tests {
    use super::extract_tags;

    #[test]
    fn tags_are_deduplicated_in_order() {
        assert_eq!(
            extract_tags("#work notes #home\nmore #work"),
            vec!["work".to_string(), "home".to_string()]
        );
    }

    #[test]
    fn headings_and_inline_hashes_are_not_tags() {
        assert!(extract_tags("# Title\n## Section\nissue#42").is_empty());
    }

    #[test]
    fn trailing_punctuation_is_trimmed() {
        assert_eq!(extract_tags("done with #rust."), vec!["rust".to_string()]);
        assert_eq!(extract_tags("nested #a/b"), vec!["a/b".to_string()]);
    }
}
