/// All errors that can be returned by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No document with the given id exists in the collection.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// The caller's credentials do not permit the read or write. The
    /// engine degrades read-path hits of this to an empty result set.
    #[error("permission denied on collection {collection}")]
    PermissionDenied { collection: String },

    /// A batch mutation exceeded the store's per-batch limit. Callers
    /// must chunk; the store will not split a batch itself.
    #[error("batch of {requested} mutations exceeds the limit of {max}")]
    BatchTooLarge { requested: usize, max: usize },

    /// A backend-specific storage error (connection, serialization, quota).
    #[error("storage backend error: {0}")]
    Backend(String),
}
