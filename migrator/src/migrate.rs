//! Migration driver
//!
//! Reads folders and items from a [`VaultSource`] and writes them into a
//! [`VaultStore`]. Folders are materialized first, then items are converted
//! one at a time in source order. A failing item is skipped with a warning;
//! only listing the source or creating groups can fail the whole run.

use tracing::{debug, info, warn};
use vaultport_shared::folders::{build_groups, FolderMap};
use vaultport_shared::models::{Normalized, NormalizedEntry, SkipReason, SourceItem};
use vaultport_shared::normalize::{normalize, ItemPolicy};
use vaultport_shared::store::{EntryId, FileOperationProvider, GroupId, StoreError, VaultStore};

use crate::error::{MigrateError, MigrateResult};
use crate::source::VaultSource;

/// Knobs for a migration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOptions {
    pub item_policy: ItemPolicy,
    /// Save the store once all items are processed
    pub save: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            item_policy: ItemPolicy::default(),
            save: true,
        }
    }
}

/// An entry stored under a disambiguated title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedEntry {
    pub item_id: String,
    pub original: String,
    pub title: String,
}

/// An item that did not make it into the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub item_id: String,
    pub name: String,
    pub reason: String,
}

/// Outcome of a migration run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub groups_created: usize,
    pub entries_created: usize,
    pub renamed: Vec<RenamedEntry>,
    pub skipped: Vec<SkippedItem>,
}

impl MigrationReport {
    pub fn summary(&self) -> String {
        format!(
            "{} entries in {} groups, {} renamed, {} skipped",
            self.entries_created,
            self.groups_created,
            self.renamed.len(),
            self.skipped.len()
        )
    }

    fn skip(&mut self, item: &SourceItem, reason: String) {
        self.skipped.push(SkippedItem {
            item_id: item.id.clone(),
            name: item.name.clone(),
            reason,
        });
    }
}

enum ItemOutcome {
    Created { title: String },
    Skipped(SkipReason),
}

/// Runs one migration from a source into a store
pub struct Migrator<'a, S: VaultSource, F: FileOperationProvider> {
    source: &'a S,
    store: &'a mut VaultStore<F>,
    options: MigrationOptions,
}

impl<'a, S: VaultSource, F: FileOperationProvider> Migrator<'a, S, F> {
    pub fn new(source: &'a S, store: &'a mut VaultStore<F>, options: MigrationOptions) -> Self {
        Self {
            source,
            store,
            options,
        }
    }

    /// Run the migration.
    ///
    /// Fails only if the source cannot be listed, a group cannot be created
    /// or the final save fails. Per-item problems end up in
    /// [`MigrationReport::skipped`].
    pub fn run(&mut self) -> MigrateResult<MigrationReport> {
        let mut report = MigrationReport::default();

        let folders = self.source.list_folders()?;
        let root = self.store.root_group().clone();
        let groups = build_groups(&folders, root, |parent: &GroupId, name: &str| {
            self.store.add_group(parent, name)
        })?;
        report.groups_created = groups.len() - 1;
        info!("Folders done ({} groups)", report.groups_created);

        let items = self.source.list_items()?;
        info!("Starting to process {} items", items.len());

        for item in &items {
            match self.migrate_item(item, &groups) {
                Ok(ItemOutcome::Created { title }) => {
                    report.entries_created += 1;
                    if title != item.name {
                        report.renamed.push(RenamedEntry {
                            item_id: item.id.clone(),
                            original: item.name.clone(),
                            title,
                        });
                    }
                }
                Ok(ItemOutcome::Skipped(reason)) => {
                    warn!("Skipping item named \"{}\": {}", item.name, reason);
                    report.skip(item, reason.to_string());
                }
                Err(e) => {
                    warn!(
                        "Skipping item named \"{}\" because of this error: {}",
                        item.name, e
                    );
                    report.skip(item, e.to_string());
                }
            }
        }

        if self.options.save {
            info!("Saving changes to {}", self.store.path());
            self.store.save()?;
        }

        info!("Migration completed: {}", report.summary());
        Ok(report)
    }

    fn migrate_item(
        &mut self,
        item: &SourceItem,
        groups: &FolderMap<GroupId>,
    ) -> MigrateResult<ItemOutcome> {
        let entry = match normalize(item, self.options.item_policy) {
            Normalized::Entry(entry) => entry,
            Normalized::Skip(reason) => return Ok(ItemOutcome::Skipped(reason)),
        };

        let group = groups
            .get(&item.folder_id)
            .ok_or_else(|| MigrateError::MissingFolder {
                folder_id: item.folder_id.clone().unwrap_or_default(),
            })?;

        let (entry_id, title) = self.create_entry(group, item, &entry)?;

        // Leave nothing half-written behind when the item fails from here on
        if let Err(e) = self.fill_entry(&entry_id, item, &entry) {
            if let Err(remove_err) = self.store.remove_entry(&entry_id) {
                warn!(
                    "Failed to remove partial entry for \"{}\": {}",
                    item.name, remove_err
                );
            }
            return Err(e);
        }

        Ok(ItemOutcome::Created { title })
    }

    /// Add the entry, falling back to `"{name} - ({id})"` once on a title clash
    fn create_entry(
        &mut self,
        group: &GroupId,
        item: &SourceItem,
        entry: &NormalizedEntry,
    ) -> MigrateResult<(EntryId, String)> {
        let candidates = [
            entry.title.clone(),
            format!("{} - ({})", entry.title, item.id),
        ];

        for title in &candidates {
            match self.store.add_entry(
                group,
                title,
                &entry.username,
                &entry.password,
                entry.notes.as_deref(),
            ) {
                Ok(id) => return Ok((id, title.clone())),
                Err(StoreError::DuplicateTitle { .. }) => {
                    debug!("Title \"{}\" already taken", title);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(MigrateError::TitleCollision {
            title: candidates[candidates.len() - 1].clone(),
            attempts: candidates.len(),
        })
    }

    fn fill_entry(
        &mut self,
        entry_id: &EntryId,
        item: &SourceItem,
        entry: &NormalizedEntry,
    ) -> MigrateResult<()> {
        if let Some(url) = &entry.url {
            self.store.set_url(entry_id, url)?;
        }

        for property in &entry.properties {
            self.store.set_custom_property(
                entry_id,
                &property.name,
                &property.value,
                property.sensitive,
            )?;
        }

        for attachment in &entry.attachments {
            let bytes = self.source.attachment_bytes(&attachment.id, &item.id)?;
            debug!(
                "Fetched attachment {} ({} bytes) for \"{}\"",
                attachment.file_name,
                bytes.len(),
                item.name
            );
            let binary = self.store.add_binary(bytes);
            self.store
                .add_attachment(entry_id, &binary, &attachment.file_name)?;
        }

        Ok(())
    }
}
