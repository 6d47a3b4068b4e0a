use crate::domain::connection::{NewConnection, SocialConnection};
use crate::error::{AppError, Result};
use crate::storage::SessionStore;
use std::sync::Arc;
use uuid::Uuid;

/// CRUD over the user's social connection records. Rows only enter through
/// an explicit authorization and only leave through an explicit delete.
#[derive(Clone, Debug)]
pub struct ConnectionService {
    store: Arc<dyn SessionStore>,
}

impl ConnectionService {
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// # Errors
    /// Returns the store error when the list fails.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<SocialConnection>> {
        self.store.list_connections(user_id).await
    }

    /// # Errors
    /// `AppError::BadRequest` when no platform account is referenced; store
    /// errors pass through.
    #[tracing::instrument(skip(self, fb_page_id, ig_account_id), err(level = "warn"))]
    pub async fn create(
        &self,
        user_id: Uuid,
        fb_page_id: Option<String>,
        ig_account_id: Option<String>,
    ) -> Result<SocialConnection> {
        let connection = NewConnection { user_id, fb_page_id, ig_account_id };
        if !connection.has_platform_account() {
            return Err(AppError::BadRequest(
                "a connection requires a page id or a business account id".to_string(),
            ));
        }

        let created = self.store.insert_connection(connection).await?;
        tracing::info!(connection_id = %created.id, "Social connection created");
        Ok(created)
    }

    /// # Errors
    /// `AppError::NotFound` when the row does not exist or is owned by
    /// someone else.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn remove(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        if self.store.delete_connection(user_id, id).await? {
            tracing::info!(connection_id = %id, "Social connection removed");
            Ok(())
        } else {
            Err(AppError::NotFound)
        }
    }
}
