//! Template management use cases.

use std::sync::Arc;

use apix_domain::{HistoryEntry, Template};
use thiserror::Error;
use tracing::{info, warn};

use crate::ports::{Listing, RecordStore, StoreError};

/// Errors raised by template management.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A template with this name already exists.
    #[error("template '{0}' already exists")]
    AlreadyExists(String),

    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create, edit, list and delete named templates.
pub struct Templates<S> {
    store: Arc<S>,
}

impl<S: RecordStore<Template>> Templates<S> {
    /// Creates the service over a template store.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Saves a new template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::AlreadyExists`] if the name is taken.
    pub async fn create(&self, template: &Template) -> Result<(), TemplateError> {
        if self.store.exists(&template.name).await? {
            return Err(TemplateError::AlreadyExists(template.name.clone()));
        }
        self.store.put(template).await?;
        info!(template = %template.name, "template created");
        Ok(())
    }

    /// Saves an edited template that was loaded as `original_name`.
    ///
    /// Saving under the same name overwrites. Saving under a new name writes
    /// the new record first and then removes the old one; renaming onto
    /// another existing template is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::AlreadyExists`] on a conflicting rename, or
    /// the failing store operation.
    pub async fn update(&self, original_name: &str, template: &Template) -> Result<(), TemplateError> {
        let renamed = template.name != original_name;
        if renamed && self.store.exists(&template.name).await? {
            return Err(TemplateError::AlreadyExists(template.name.clone()));
        }
        self.store.put(template).await?;
        if renamed {
            self.store.delete(original_name).await?;
            info!(from = original_name, to = %template.name, "template renamed");
        } else {
            info!(template = %template.name, "template updated");
        }
        Ok(())
    }

    /// Loads one template.
    ///
    /// # Errors
    ///
    /// Propagates store failures, including `NotFound`.
    pub async fn get(&self, name: &str) -> Result<Template, TemplateError> {
        Ok(self.store.get(name).await?)
    }

    /// Lists all readable templates.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    pub async fn list(&self) -> Result<Listing<Template>, TemplateError> {
        Ok(self.store.list().await?)
    }

    /// Deletes a template. Deleting an unknown name succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot remove the record.
    pub async fn delete(&self, name: &str) -> Result<(), TemplateError> {
        self.store.delete(name).await?;
        info!(template = name, "template deleted");
        Ok(())
    }

    /// Deletes every template and returns how many were removed.
    ///
    /// Unreadable template files are left in place.
    ///
    /// # Errors
    ///
    /// Stops at the first failed removal.
    pub async fn delete_all(&self) -> Result<usize, TemplateError> {
        let listing = self.store.list().await?;
        for warning in &listing.warnings {
            warn!(template = %warning.key, "skipping unreadable template during delete-all");
        }
        for template in &listing.records {
            self.store.delete(&template.name).await?;
        }
        info!(count = listing.records.len(), "all templates deleted");
        Ok(listing.records.len())
    }

    /// Saves a history entry as a new template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::AlreadyExists`] if the name is taken.
    pub async fn from_history(&self, entry: &HistoryEntry, name: &str) -> Result<Template, TemplateError> {
        let template = Template::from_request(name, &entry.request);
        self.create(&template).await?;
        Ok(template)
    }
}
