//! Database handle with built-in connection pooling.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bson::doc;
use mongodb::options::GridFsBucketOptions;
use mongodb::{Client, ClientSession};
use tracing::{debug, info, warn};

use crate::collection::Collection;
use crate::config::DatabaseConfig;
use crate::document::Document;
use crate::error::{QuickError, QuickResult};
use crate::gridfs::GridFsBucket;

/// A boxed future, as returned by transaction callbacks.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A handle to one database on a pooled client.
///
/// The driver pools connections internally, so cloning a `Database` is cheap
/// and every clone shares the same pool.
#[derive(Clone)]
pub struct Database {
    client: Client,
    database: mongodb::Database,
    config: Arc<DatabaseConfig>,
}

impl Database {
    /// Connect with a connection URI.
    pub async fn connect(uri: &str, database: &str) -> QuickResult<Self> {
        Self::from_config(DatabaseConfig::from_uri(uri, database)).await
    }

    /// Connect with discrete credentials.
    pub async fn with_credentials(
        username: &str,
        password: &str,
        host: &str,
        port: u16,
        auth_source: &str,
        max_pool_size: u32,
        database: &str,
    ) -> QuickResult<Self> {
        let config = DatabaseConfig::from_credentials(
            username,
            password,
            host,
            port,
            auth_source,
            max_pool_size,
            database,
        );
        Self::from_config(config).await
    }

    /// Connect using a full configuration.
    pub async fn from_config(config: DatabaseConfig) -> QuickResult<Self> {
        if config.database.is_empty() {
            return Err(QuickError::config("database name is required"));
        }

        let options = config.to_client_options().await?;
        let client = Client::with_options(options)
            .map_err(|e| QuickError::connection(format!("failed to create client: {}", e)))?;
        let database = client.database(&config.database);

        info!(database = %config.database, "QuickDB client created");

        Ok(Self {
            client,
            database,
            config: Arc::new(config),
        })
    }

    /// A handle to another database sharing this connection pool.
    pub fn with_database(&self, name: &str) -> Self {
        Self {
            client: self.client.clone(),
            database: self.client.database(name),
            config: Arc::clone(&self.config),
        }
    }

    /// A typed collection.
    pub fn collection<T: Document>(&self, name: &str) -> Collection<T> {
        Collection::new(self.database.collection(name))
    }

    /// The collection named by [`Document::collection_name`].
    pub fn default_collection<T: Document>(&self) -> Collection<T> {
        self.collection(&T::collection_name())
    }

    /// A GridFS bucket for large files.
    pub fn gridfs_bucket(&self, bucket_name: &str) -> GridFsBucket {
        let mut options = GridFsBucketOptions::default();
        options.bucket_name = Some(bucket_name.to_string());
        GridFsBucket::new(self.database.gridfs_bucket(options))
    }

    /// Name of the database this handle points at.
    pub fn name(&self) -> &str {
        self.database.name()
    }

    /// The underlying driver database.
    pub fn inner(&self) -> &mongodb::Database {
        &self.database
    }

    /// The configuration this handle was created from.
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Check if the server answers a ping.
    pub async fn is_healthy(&self) -> bool {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .is_ok()
    }

    /// List all collection names in the database.
    pub async fn list_collections(&self) -> QuickResult<Vec<String>> {
        self.database
            .list_collection_names(None)
            .await
            .map_err(|e| QuickError::operation("list collections", e))
    }

    /// Drop a collection.
    pub async fn drop_collection(&self, name: &str) -> QuickResult<()> {
        debug!(collection = %name, "Dropping collection");
        self.database
            .collection::<bson::Document>(name)
            .drop(None)
            .await
            .map_err(|e| QuickError::operation("drop collection", e))
    }

    /// Start a client session.
    pub async fn start_session(&self) -> QuickResult<ClientSession> {
        self.client
            .start_session(None)
            .await
            .map_err(|e| QuickError::operation("start session", e))
    }

    /// Run `callback` inside a transaction.
    ///
    /// The transaction commits when the callback returns `Ok` and aborts when
    /// it returns `Err`; either failure is reported as
    /// [`QuickError::Transaction`]. Pass the session on to every collection
    /// call that should take part in the transaction. Captured handles must
    /// be owned, so clone collections into the closure:
    ///
    /// ```rust,ignore
    /// let accounts = db.collection::<Account>("accounts");
    /// db.with_transaction(move |session| {
    ///     let accounts = accounts.clone();
    ///     Box::pin(async move {
    ///         let debit = UpdateBuilder::new().inc("balance", -10);
    ///         accounts.update_one(&FilterBuilder::new().eq("owner", "a"), &debit, None, Some(session)).await?;
    ///         Ok(())
    ///     })
    /// })
    /// .await?;
    /// ```
    pub async fn with_transaction<R, F>(&self, callback: F) -> QuickResult<R>
    where
        F: for<'s> FnOnce(&'s mut ClientSession) -> BoxFuture<'s, QuickResult<R>>,
    {
        let mut session = self.start_session().await?;
        session
            .start_transaction(None)
            .await
            .map_err(|e| QuickError::transaction(format!("failed to start: {}", e)))?;
        debug!("Transaction started");

        match callback(&mut session).await {
            Ok(value) => {
                session
                    .commit_transaction()
                    .await
                    .map_err(|e| QuickError::transaction(format!("commit failed: {}", e)))?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    warn!(error = %abort_err, "Failed to abort transaction");
                }
                debug!(error = %err, "Transaction aborted");
                Err(QuickError::transaction(err.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.database.name())
            .finish_non_exhaustive()
    }
}
