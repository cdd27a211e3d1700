// ============================
// postgate-backend-lib/src/storage.rs
// ============================
//! Storage abstraction with flat-file implementation.
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use postgate_common::{Id, Post, UserSummary};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{fs as tokio_fs, io::AsyncWriteExt, sync::Mutex};

const USERS_LOG: &str = "users.log";
const POSTS_LOG: &str = "posts.log";

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("username already exists: {0}")]
    UsernameTaken(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupt record in {file} at line {line}: {source}")]
    Corrupt {
        file: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
}

/// A stored account
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Id,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        UserSummary {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// Account fields supplied on registration
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Trait for storage backends.
///
/// Each method is a single atomic statement; callers take no locks.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Insert an account, failing with `UsernameTaken` on a duplicate name
    async fn insert_user(&self, user: NewUser) -> Result<Id, StorageError>;

    /// Look up an account by exact username
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StorageError>;

    /// Every account, in id order
    async fn list_users(&self) -> Result<Vec<UserSummary>, StorageError>;

    /// Insert a post and return it with its id
    async fn insert_post(&self, username: &str, content: &str) -> Result<Post, StorageError>;

    /// Every post, newest first
    async fn list_posts(&self) -> Result<Vec<Post>, StorageError>;
}

#[derive(Default)]
struct Tables {
    users: Vec<UserRecord>,
    posts: Vec<Post>,
}

/// Flat-file implementation of the Storage trait.
///
/// Users and posts are append-only JSON-lines logs replayed on open. One
/// mutex orders every insert so the uniqueness check and the append land
/// together.
#[derive(Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
    tables: Arc<Mutex<Tables>>,
}

impl FlatFileStorage {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let tables = Tables {
            users: replay(&root.join(USERS_LOG))?,
            posts: replay(&root.join(POSTS_LOG))?,
        };
        tracing::info!(
            root = %root.display(),
            users = tables.users.len(),
            posts = tables.posts.len(),
            "opened flat-file storage"
        );

        Ok(Self {
            root,
            tables: Arc::new(Mutex::new(tables)),
        })
    }

    async fn append<T: Serialize>(&self, file: &str, record: &T) -> Result<(), StorageError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = tokio_fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.root.join(file))
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

fn replay<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, StorageError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|source| StorageError::Corrupt {
                file: path.to_path_buf(),
                line: idx + 1,
                source,
            })
        })
        .collect()
}

#[async_trait]
impl Storage for FlatFileStorage {
    async fn insert_user(&self, user: NewUser) -> Result<Id, StorageError> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StorageError::UsernameTaken(user.username));
        }

        let record = UserRecord {
            id: tables.users.last().map_or(1, |u| u.id + 1),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
        };
        self.append(USERS_LOG, &record).await?;

        let id = record.id;
        tables.users.push(record);
        Ok(id)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserRecord>, StorageError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> Result<Vec<UserSummary>, StorageError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().map(UserSummary::from).collect())
    }

    async fn insert_post(&self, username: &str, content: &str) -> Result<Post, StorageError> {
        let mut tables = self.tables.lock().await;
        let post = Post {
            id: tables.posts.last().map_or(1, |p| p.id + 1),
            username: username.to_string(),
            content: content.to_string(),
        };
        self.append(POSTS_LOG, &post).await?;

        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn list_posts(&self) -> Result<Vec<Post>, StorageError> {
        let tables = self.tables.lock().await;
        Ok(tables.posts.iter().rev().cloned().collect())
    }
}
