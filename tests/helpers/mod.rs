//! Reusable helpers for integration tests.
//!
//! Each test gets its own on-disk database under a unique temporary
//! directory so suites can run in parallel without interference.

#![allow(dead_code)]

use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use agora_core::content::ContentRepository;
use agora_core::conversation::ConversationStore;
use agora_core::feed::ChangeFeed;
use agora_core::graph::SocialGraphManager;
use agora_core::identity::{IdentityManager, IdentityStore, Secret, UserId, UserProfile};
use agora_core::storage::Database;
use agora_core::sync::SyncEngine;

/// Atomic counter for unique test directory names.
static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Creates a unique temporary directory for test isolation.
///
/// Each call produces a distinct path by combining the prefix, process
/// ID, and an atomic counter.
pub fn unique_temp_dir(prefix: &str) -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = env::temp_dir().join(format!(
        "agora_test_{}_{}_{}",
        prefix,
        std::process::id(),
        id
    ));
    std::fs::create_dir_all(&dir).expect("test directory must be creatable");
    dir
}

/// Removes a temporary test directory. Ignores errors silently.
pub fn cleanup_dir(dir: &PathBuf) {
    let _ = std::fs::remove_dir_all(dir);
}

/// A fully wired store stack over one on-disk database.
///
/// The temporary directory is removed on drop.
pub struct TestStack {
    pub dir: PathBuf,
    pub db: Arc<Database>,
    pub feed: Arc<ChangeFeed>,
    pub identity: Arc<IdentityStore>,
    pub manager: IdentityManager,
    pub graph: Arc<SocialGraphManager>,
    pub content: Arc<ContentRepository>,
    pub conversations: Arc<ConversationStore>,
}

impl TestStack {
    /// Opens a fresh stack under a unique temporary directory.
    pub fn open(prefix: &str) -> Self {
        let dir = unique_temp_dir(prefix);
        Self::open_at(dir)
    }

    /// Opens a stack over an existing directory (for reopen tests).
    pub fn open_at(dir: PathBuf) -> Self {
        let db = Arc::new(Database::open(&dir.join("agora.db")).expect("database must open"));
        let feed = Arc::new(ChangeFeed::new());
        let identity = Arc::new(IdentityStore::new(Arc::clone(&db), Arc::clone(&feed)));
        let manager = IdentityManager::new(Arc::clone(&identity));
        let conversations = Arc::new(ConversationStore::new(Arc::clone(&db), Arc::clone(&feed)));
        let content = Arc::new(ContentRepository::new(Arc::clone(&db), Arc::clone(&feed)));
        let graph = Arc::new(SocialGraphManager::new(
            Arc::clone(&db),
            Arc::clone(&identity),
            Arc::clone(&conversations),
            Arc::clone(&feed),
        ));

        Self {
            dir,
            db,
            feed,
            identity,
            manager,
            graph,
            content,
            conversations,
        }
    }

    /// Registers a user with the default test password.
    pub fn sign_up(&self, handle: &str) -> UserId {
        self.manager
            .sign_up(UserProfile::new(handle, handle), &Secret::new("pw"))
            .expect("sign up must succeed")
            .id
    }

    /// Builds a synchronization engine over this stack's stores.
    pub fn engine(&self) -> SyncEngine {
        SyncEngine::new(
            Arc::clone(&self.content),
            Arc::clone(&self.conversations),
            Arc::clone(&self.graph),
            Arc::clone(&self.feed),
        )
    }
}

impl Drop for TestStack {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}
