//! fund-storage-json
//!
//! Filesystem JSON persistence for submissions and budget pools. One file per
//! submission, one file per subcategory holding all of its tier pools.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use fund_domain::{BudgetPool, Submission};
use fund_engine::{
    ports::{PoolStore, SubmissionStore},
    CoreError,
};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

const FILE_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// Pools of one subcategory as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PoolSet {
    subcategory_id: Uuid,
    pools: Vec<BudgetPool>,
}

pub struct JsonStore {
    submissions_dir: PathBuf,
    pools_dir: PathBuf,
    // Pool files are read-modify-write; tiers of one subcategory share a file.
    pool_writes: Mutex<()>,
}

impl JsonStore {
    pub fn new(root: PathBuf) -> Result<Self, CoreError> {
        let submissions_dir = root.join("submissions");
        let pools_dir = root.join("pools");
        fs::create_dir_all(&submissions_dir)?;
        fs::create_dir_all(&pools_dir)?;
        Ok(Self {
            submissions_dir,
            pools_dir,
            pool_writes: Mutex::new(()),
        })
    }

    pub fn submission_path(&self, id: Uuid) -> PathBuf {
        self.submissions_dir
            .join(format!("{}.{}", canonical_name(id), FILE_EXTENSION))
    }

    pub fn pools_path(&self, subcategory_id: Uuid) -> PathBuf {
        self.pools_dir
            .join(format!("{}.{}", canonical_name(subcategory_id), FILE_EXTENSION))
    }

    /// Identifiers of every stored submission, sorted.
    pub fn list_submissions(&self) -> Result<Vec<Uuid>, CoreError> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.submissions_dir)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(FILE_EXTENSION)
            {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| Uuid::parse_str(stem).ok())
            {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn read_pool_set(&self, subcategory_id: Uuid) -> Result<PoolSet, CoreError> {
        let path = self.pools_path(subcategory_id);
        if !path.exists() {
            return Ok(PoolSet {
                subcategory_id,
                pools: Vec::new(),
            });
        }
        read_json(&path)
    }
}

impl SubmissionStore for JsonStore {
    fn load_submission(&self, id: Uuid) -> Result<Submission, CoreError> {
        let path = self.submission_path(id);
        if !path.exists() {
            return Err(CoreError::SubmissionNotFound(id));
        }
        read_json(&path)
    }

    fn save_submission(&self, submission: &Submission) -> Result<(), CoreError> {
        write_json(&self.submission_path(submission.id), submission)
    }
}

impl PoolStore for JsonStore {
    fn load_pools(&self, subcategory_id: Uuid) -> Result<Vec<BudgetPool>, CoreError> {
        let mut pools = self.read_pool_set(subcategory_id)?.pools;
        pools.sort_by_key(|pool| pool.tier);
        Ok(pools)
    }

    fn save_pool(&self, pool: &BudgetPool) -> Result<(), CoreError> {
        let _guard = self.pool_writes.lock();
        let mut set = self.read_pool_set(pool.subcategory_id)?;
        match set.pools.iter_mut().find(|stored| stored.tier == pool.tier) {
            Some(stored) => *stored = pool.clone(),
            None => set.pools.push(pool.clone()),
        }
        write_json(&self.pools_path(pool.subcategory_id), &set)
    }
}

fn canonical_name(id: Uuid) -> String {
    id.as_hyphenated().to_string()
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CoreError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data)
        .map_err(|err| CoreError::Storage(format!("{}: {err}", path.display())))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| CoreError::Storage(err.to_string()))?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use fund_domain::{AmountSet, Money, SubmissionKind, TierCode};
    use fund_engine::BudgetLedger;
    use tempfile::tempdir;

    fn submission() -> Submission {
        let mut submission = Submission::new(
            SubmissionKind::GeneralFund,
            "Field survey equipment",
            2025,
            Uuid::new_v4(),
            TierCode::Default,
            Uuid::new_v4(),
            AmountSet::general(Money::from_minor(1_250_075)),
        );
        submission.attach("quote.pdf", "application/pdf");
        submission
    }

    #[test]
    fn submissions_survive_a_reload() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path().to_path_buf()).unwrap();
        let submission = submission();

        store.save_submission(&submission).unwrap();

        let reopened = JsonStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.load_submission(submission.id).unwrap(), submission);
        assert_eq!(reopened.list_submissions().unwrap(), vec![submission.id]);
        assert!(!tmp_path(&store.submission_path(submission.id)).exists());
    }

    #[test]
    fn missing_submission_is_not_found() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path().to_path_buf()).unwrap();
        let id = Uuid::new_v4();
        assert!(matches!(
            store.load_submission(id),
            Err(CoreError::SubmissionNotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path().to_path_buf()).unwrap();
        let id = Uuid::new_v4();
        fs::write(store.submission_path(id), "{").unwrap();
        assert!(matches!(store.load_submission(id), Err(CoreError::Storage(_))));
    }

    #[test]
    fn tiers_of_one_subcategory_share_a_file() {
        let dir = tempdir().unwrap();
        let store = JsonStore::new(dir.path().to_path_buf()).unwrap();
        let subcategory = Uuid::new_v4();
        let q2 = BudgetPool::new(subcategory, TierCode::Q2, Money::from_major(10_000));
        let q1 = BudgetPool::new(subcategory, TierCode::Q1, Money::from_major(20_000));

        store.save_pool(&q2).unwrap();
        store.save_pool(&q1).unwrap();

        let tiers: Vec<TierCode> = store
            .load_pools(subcategory)
            .unwrap()
            .into_iter()
            .map(|pool| pool.tier)
            .collect();
        assert_eq!(tiers, vec![TierCode::Q1, TierCode::Q2]);
        assert!(store.load_pools(Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn ledger_commits_are_durable() {
        let dir = tempdir().unwrap();
        let store = Arc::new(JsonStore::new(dir.path().to_path_buf()).unwrap());
        let subcategory = Uuid::new_v4();
        let ledger = BudgetLedger::with_store(store.clone());
        ledger
            .configure_pool(BudgetPool::new(
                subcategory,
                TierCode::Q1,
                Money::from_major(50_000),
            ))
            .unwrap();
        ledger
            .commit(subcategory, TierCode::Q1, Money::from_major(12_500))
            .unwrap();

        let restarted = BudgetLedger::with_store(store);
        assert_eq!(restarted.load_subcategory(subcategory).unwrap(), 1);
        let pool = restarted.pool(subcategory, TierCode::Q1).unwrap();
        assert_eq!(pool.allocated_budget, Money::from_major(12_500));
        assert_eq!(pool.remaining_budget, Money::from_major(37_500));
    }
}
