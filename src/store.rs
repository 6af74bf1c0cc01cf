use crate::error::{AnalyzerError, Result};
use crate::github::FetchedIssue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionResult};
use sled::{Db, Transactional, Tree};
use std::path::{Path, PathBuf};

/// A tracked repository and the outcome of its last scan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRecord {
    pub id: u64,
    pub repo: String,
    pub issues_fetched: usize,
    pub cached_successfully: bool,
    pub created_at: DateTime<Utc>,
}

/// A cached issue, owned by exactly one repository record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: u64,
    pub repo_id: u64,
    pub title: String,
    pub body: String,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
}

/// Result of a scan, returned to the caller as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub repo: String,
    pub issues_fetched: usize,
    pub cached_successfully: bool,
}

impl ScanOutcome {
    /// Outcome reported when fetching or caching failed
    pub fn failed(repo: &str) -> Self {
        Self {
            repo: repo.to_string(),
            issues_fetched: 0,
            cached_successfully: false,
        }
    }
}

/// Persistent repo → issues snapshot store
///
/// Three trees: `repos` (id → record), `repo_names` (name → id) and
/// `issues` (repo id → the repository's full issue list). Keeping each issue
/// set under a single key makes a rescan one transactional swap.
pub struct IssueStore {
    db: Db,
    path: PathBuf,
    repos: Tree,
    names: Tree,
    issues: Tree,
}

impl IssueStore {
    /// Create or open a store in the given directory
    pub fn open(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let path = data_dir.join("issues.sled");
        let db = sled::open(&path)?;
        let repos = db.open_tree("repos")?;
        let names = db.open_tree("repo_names")?;
        let issues = db.open_tree("issues")?;

        Ok(Self {
            db,
            path,
            repos,
            names,
            issues,
        })
    }

    /// Location of the store on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a repository record by full name
    pub fn find_repo(&self, name: &str) -> Result<Option<RepoRecord>> {
        let Some(id) = self.names.get(name)? else {
            return Ok(None);
        };

        match self.repos.get(&id)? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    /// Cached issues of a repository, in the order they were fetched
    pub fn issues_for(&self, repo_id: u64) -> Result<Vec<IssueRecord>> {
        match self.issues.get(repo_id.to_be_bytes())? {
            Some(data) => Ok(serde_json::from_slice(&data)?),
            None => Ok(Vec::new()),
        }
    }

    /// All repository records, sorted by name
    pub fn list_repos(&self) -> Result<Vec<RepoRecord>> {
        let mut records = Vec::new();
        for item in self.repos.iter() {
            let (_, value) = item?;
            records.push(serde_json::from_slice::<RepoRecord>(&value)?);
        }
        records.sort_by(|a, b| a.repo.cmp(&b.repo));
        Ok(records)
    }

    /// Replace the cached issue set of a repository
    ///
    /// Creates the repository record on first use. Lookup, the swap of the
    /// issue list and the record update commit together or not at all, so two
    /// concurrent rescans of one name leave exactly one of their issue sets.
    pub fn replace_issues(&self, name: &str, fetched: &[FetchedIssue]) -> Result<ScanOutcome> {
        let now = Utc::now();

        let result: TransactionResult<RepoRecord, AnalyzerError> =
            (&self.repos, &self.names, &self.issues).transaction(|(repos, names, issues)| {
                let existing = match names.get(name)? {
                    Some(id) => repos.get(&id)?,
                    None => None,
                };

                let mut record = match existing {
                    Some(data) => serde_json::from_slice::<RepoRecord>(&data)
                        .map_err(|e| ConflictableTransactionError::Abort(AnalyzerError::from(e)))?,
                    None => {
                        let id = repos
                            .generate_id()
                            .map_err(ConflictableTransactionError::Storage)?;
                        names.insert(name, &id.to_be_bytes()[..])?;
                        RepoRecord {
                            id,
                            repo: name.to_string(),
                            issues_fetched: 0,
                            cached_successfully: false,
                            created_at: now,
                        }
                    }
                };

                let records: Vec<IssueRecord> = fetched
                    .iter()
                    .map(|issue| IssueRecord {
                        id: issue.id,
                        repo_id: record.id,
                        title: issue.title.clone(),
                        body: issue.body.clone(),
                        html_url: issue.html_url.clone(),
                        created_at: issue.created_at,
                    })
                    .collect();

                let key = record.id.to_be_bytes();
                let issue_data = serde_json::to_vec(&records)
                    .map_err(|e| ConflictableTransactionError::Abort(AnalyzerError::from(e)))?;
                issues.insert(&key[..], issue_data)?;

                record.issues_fetched = records.len();
                record.cached_successfully = true;
                let record_data = serde_json::to_vec(&record)
                    .map_err(|e| ConflictableTransactionError::Abort(AnalyzerError::from(e)))?;
                repos.insert(&key[..], record_data)?;

                Ok(record)
            });

        let record = result.map_err(|e| match e {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => AnalyzerError::Store(e),
        })?;
        self.db.flush()?;

        Ok(ScanOutcome {
            repo: record.repo,
            issues_fetched: record.issues_fetched,
            cached_successfully: record.cached_successfully,
        })
    }

    /// Get store statistics
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            total_repos: self.repos.len(),
            db_size_bytes: self.db.size_on_disk().unwrap_or(0),
        }
    }
}

/// Store statistics
#[derive(Debug)]
pub struct StoreStats {
    pub total_repos: usize,
    pub db_size_bytes: u64,
}

impl StoreStats {
    /// Format size in human-readable format
    pub fn format_size(&self) -> String {
        let bytes = self.db_size_bytes;
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.2} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}
