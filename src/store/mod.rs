//! Rule store abstraction: the folder and rule primitives of one mailbox.

mod local;

pub use local::LocalRuleStore;

use std::fmt;

/// Errors from rule store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The bound mailbox is invalid or unreachable.
    Unavailable(String),
    /// The destination folder could not be created.
    FolderCreation(String),
    /// The rule could not be created.
    RuleCreation(String),
    /// The rule set could not be saved.
    Persistence(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(m) => write!(f, "store unavailable: {}", m),
            StoreError::FolderCreation(m) => write!(f, "cannot create folder: {}", m),
            StoreError::RuleCreation(m) => write!(f, "cannot create rule: {}", m),
            StoreError::Persistence(m) => write!(f, "cannot save rules: {}", m),
        }
    }
}

impl std::error::Error for StoreError {}

/// A store of mail folders and receive-time rules, bound to one mailbox.
///
/// Folder and rule handles are backend-specific, so each implementation
/// chooses its own representations. The synchronization engine only ever
/// drives one store sequentially; implementations need not be thread-safe.
pub trait RuleStore {
    type Folder;
    type Rule;

    /// Look up a folder by name under the active rule root.
    fn find_folder(&self, name: &str) -> Result<Option<Self::Folder>, StoreError>;

    /// Create a folder with the given name.
    fn create_folder(&mut self, name: &str) -> Result<Self::Folder, StoreError>;

    /// All rules currently in the store.
    fn list_rules(&self) -> Result<Vec<Self::Rule>, StoreError>;

    /// Whether `rule` already matches mail from `sender` and routes it to
    /// `destination`.
    fn rule_matches(&self, rule: &Self::Rule, sender: &str, destination: &Self::Folder) -> bool;

    /// Create an enabled rule moving mail from `sender` to `destination`.
    fn create_rule(
        &mut self,
        sender: &str,
        destination: &Self::Folder,
    ) -> Result<Self::Rule, StoreError>;

    /// Save the current rule set.
    fn persist(&mut self) -> Result<(), StoreError>;
}
