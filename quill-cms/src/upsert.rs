//! Source-id keyed upsert against a CMS collection.
//!
//! Identity is the remote page id stored in the item's `source-id` field,
//! never the slug — titles get renamed, slugs follow, the page id does not.

use quill_core::Page;
use tracing::{info, warn};

use crate::error::CmsError;
use crate::fields::ItemFields;

/// A collection item as the upsert needs to see it: just its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRef {
    pub id: String,
}

/// The operations the upsert performs against a collection. Implemented by
/// [`crate::CmsClient`] for the real API and by in-memory doubles in tests.
pub trait Collection {
    /// All items whose `source-id` field equals `source_id`.
    fn find_by_source_id(&self, source_id: &str) -> Result<Vec<ItemRef>, CmsError>;
    fn create_item(&self, fields: &ItemFields) -> Result<ItemRef, CmsError>;
    fn update_item(&self, item_id: &str, fields: &ItemFields) -> Result<(), CmsError>;
    fn publish_item(&self, item_id: &str) -> Result<(), CmsError>;
}

/// What one upsert did, or would have done under dry-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created { item_id: String },
    Updated { item_id: String },
    WouldCreate,
    WouldUpdate { item_id: String },
}

/// Push one page into the collection.
///
/// Zero existing matches create, exactly one updates, more than one aborts
/// with [`CmsError::IdentityConflict`]. When the page's publish flag is set
/// the item is published after the write; a publish failure is logged and
/// does not undo the upsert.
pub fn upsert_page<C: Collection>(
    collection: &C,
    page: &Page,
    body_html: &str,
    dry_run: bool,
) -> Result<UpsertOutcome, CmsError> {
    let fields = ItemFields::from_page(page, body_html);
    let existing = collection.find_by_source_id(&fields.source_id)?;

    let outcome = match existing.as_slice() {
        [] => {
            if dry_run {
                UpsertOutcome::WouldCreate
            } else {
                let item = collection.create_item(&fields)?;
                info!(page = %page.id, item = %item.id, "created item");
                UpsertOutcome::Created { item_id: item.id }
            }
        }
        [item] => {
            if dry_run {
                UpsertOutcome::WouldUpdate {
                    item_id: item.id.clone(),
                }
            } else {
                collection.update_item(&item.id, &fields)?;
                info!(page = %page.id, item = %item.id, "updated item");
                UpsertOutcome::Updated {
                    item_id: item.id.clone(),
                }
            }
        }
        many => {
            return Err(CmsError::IdentityConflict {
                source_id: fields.source_id,
                count: many.len(),
            })
        }
    };

    if page.properties.publish && !dry_run {
        let item_id = match &outcome {
            UpsertOutcome::Created { item_id } | UpsertOutcome::Updated { item_id } => item_id,
            _ => return Ok(outcome),
        };
        if let Err(err) = collection.publish_item(item_id) {
            warn!(page = %page.id, item = %item_id, error = %err, "publish failed after upsert");
        }
    }

    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Tally of a whole push run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PushReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl PushReport {
    pub fn record(&mut self, outcome: &UpsertOutcome) {
        match outcome {
            UpsertOutcome::Created { .. } | UpsertOutcome::WouldCreate => self.created += 1,
            UpsertOutcome::Updated { .. } | UpsertOutcome::WouldUpdate { .. } => self.updated += 1,
        }
    }
}

impl std::fmt::Display for PushReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped, {} failed",
            self.created, self.updated, self.skipped, self.failed
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use quill_core::{PageId, PageProperties};
    use std::cell::RefCell;

    #[derive(Default)]
    struct MemoryCollection {
        items: RefCell<Vec<(String, ItemFields)>>,
        published: RefCell<Vec<String>>,
        fail_publish: bool,
    }

    impl Collection for MemoryCollection {
        fn find_by_source_id(&self, source_id: &str) -> Result<Vec<ItemRef>, CmsError> {
            Ok(self
                .items
                .borrow()
                .iter()
                .filter(|(_, f)| f.source_id == source_id)
                .map(|(id, _)| ItemRef { id: id.clone() })
                .collect())
        }

        fn create_item(&self, fields: &ItemFields) -> Result<ItemRef, CmsError> {
            let id = format!("item-{}", self.items.borrow().len() + 1);
            self.items.borrow_mut().push((id.clone(), fields.clone()));
            Ok(ItemRef { id })
        }

        fn update_item(&self, item_id: &str, fields: &ItemFields) -> Result<(), CmsError> {
            let mut items = self.items.borrow_mut();
            match items.iter_mut().find(|(id, _)| id == item_id) {
                Some(slot) => {
                    slot.1 = fields.clone();
                    Ok(())
                }
                None => Err(CmsError::Http {
                    status: 404,
                    body: "no such item".to_owned(),
                }),
            }
        }

        fn publish_item(&self, item_id: &str) -> Result<(), CmsError> {
            if self.fail_publish {
                return Err(CmsError::Http {
                    status: 500,
                    body: "publish backend down".to_owned(),
                });
            }
            self.published.borrow_mut().push(item_id.to_owned());
            Ok(())
        }
    }

    fn page(id: &str, publish: bool) -> Page {
        Page {
            id: PageId::from(id),
            title: "A Post".to_owned(),
            created_time: Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap(),
            last_edited_time: Utc.with_ymd_and_hms(2026, 8, 20, 0, 0, 0).unwrap(),
            properties: PageProperties {
                publish,
                ..PageProperties::default()
            },
            blocks: vec![],
        }
    }

    #[test]
    fn absent_page_creates_then_second_push_updates() {
        let collection = MemoryCollection::default();
        let page = page("p1", false);

        let first = upsert_page(&collection, &page, "<p>v1</p>", false).unwrap();
        assert!(matches!(first, UpsertOutcome::Created { .. }));
        assert_eq!(collection.items.borrow().len(), 1);

        let second = upsert_page(&collection, &page, "<p>v2</p>", false).unwrap();
        assert!(matches!(second, UpsertOutcome::Updated { .. }));
        assert_eq!(collection.items.borrow().len(), 1, "update must not duplicate");
        assert_eq!(collection.items.borrow()[0].1.post_body, "<p>v2</p>");
    }

    #[test]
    fn duplicate_source_ids_are_a_conflict() {
        let collection = MemoryCollection::default();
        let page = page("p1", false);
        let fields = ItemFields::from_page(&page, "");
        collection.items.borrow_mut().push(("a".to_owned(), fields.clone()));
        collection.items.borrow_mut().push(("b".to_owned(), fields));

        let err = upsert_page(&collection, &page, "", false).unwrap_err();
        match err {
            CmsError::IdentityConflict { source_id, count } => {
                assert_eq!(source_id, "p1");
                assert_eq!(count, 2);
            }
            other => panic!("expected conflict, got {other}"),
        }
        assert_eq!(collection.items.borrow().len(), 2, "conflict must not write");
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let collection = MemoryCollection::default();
        let page = page("p1", true);

        let outcome = upsert_page(&collection, &page, "<p>x</p>", true).unwrap();
        assert_eq!(outcome, UpsertOutcome::WouldCreate);
        assert!(collection.items.borrow().is_empty());
        assert!(collection.published.borrow().is_empty());
    }

    #[test]
    fn publish_flag_publishes_after_upsert() {
        let collection = MemoryCollection::default();
        let outcome = upsert_page(&collection, &page("p1", true), "", false).unwrap();
        let item_id = match outcome {
            UpsertOutcome::Created { item_id } => item_id,
            other => panic!("expected create, got {other:?}"),
        };
        assert_eq!(*collection.published.borrow(), vec![item_id]);
    }

    #[test]
    fn publish_failure_does_not_undo_the_upsert() {
        let collection = MemoryCollection {
            fail_publish: true,
            ..MemoryCollection::default()
        };
        let outcome = upsert_page(&collection, &page("p1", true), "", false).unwrap();
        assert!(matches!(outcome, UpsertOutcome::Created { .. }));
        assert_eq!(collection.items.borrow().len(), 1);
    }

    #[test]
    fn report_tallies_outcomes() {
        let mut report = PushReport::default();
        report.record(&UpsertOutcome::Created {
            item_id: "a".to_owned(),
        });
        report.record(&UpsertOutcome::WouldUpdate {
            item_id: "b".to_owned(),
        });
        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.to_string(), "1 created, 1 updated, 0 skipped, 0 failed");
    }
}
