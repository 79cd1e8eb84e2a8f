//! Error taxonomy for the engine: clipboard/file I/O, persistence, and
//! cold-start loading. The converter itself never fails — missing dictionary
//! entries degrade gracefully instead of raising an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("clipboard or file contained no text")]
    NotText,

    #[error("file not readable: {path}")]
    FileNotReadable { path: String, source: std::io::Error },

    #[error("file not writeable: {path}")]
    FileNotWriteable { path: String, source: std::io::Error },

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("redb database error")]
    Database(#[from] redb::DatabaseError),

    #[error("redb transaction error")]
    Transaction(#[from] redb::TransactionError),

    #[error("redb table error")]
    Table(#[from] redb::TableError),

    #[error("redb storage error")]
    Storage(#[from] redb::StorageError),

    #[error("redb commit error")]
    Commit(#[from] redb::CommitError),
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to load from store")]
    Store(#[from] StoreError),

    #[error("loader worker thread panicked")]
    WorkerPanicked,
}
