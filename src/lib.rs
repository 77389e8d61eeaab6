// TodoStore - persistent to-do task store with subscriptions and import/export

pub mod clock;
pub mod config;
pub mod events;
pub mod query;
pub mod stats;
pub mod storage;
pub mod store;
pub mod task;
pub mod transfer;
pub mod validate;

// Re-export main types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Backend, Config, StorageConfig};
pub use events::Subscription;
pub use query::{SortKey, SortOrder, TaskQuery};
pub use stats::{PriorityCounts, TaskStats};
pub use storage::{FileStorage, MemoryStorage, SqliteStorage, Storage};
pub use store::TaskStore;
pub use task::{DEFAULT_CATEGORIES, DEFAULT_CATEGORY, NewTask, Priority, Task, TaskPatch};
pub use transfer::{EXPORT_VERSION, ExportData};
pub use validate::{TaskDraft, Validation, validate_task};
