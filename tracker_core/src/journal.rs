//! Durable user store backed by a JSON-lines journal.
//!
//! Every mutation is appended to the journal as one JSON line with file
//! locking to ensure safe concurrent access. On open, the journal is
//! replayed into memory; reads are served from memory.
//!
//! Locks are taken on a sidecar `<journal>.lock` file rather than on the
//! journal itself, since compaction replaces the journal's inode and a lock
//! on the old file would no longer exclude writers of the new one.

use crate::store::UserStore;
use crate::{Error, ExerciseEntry, Result, User, UserId};
use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

/// One line of the journal
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum JournalRecord {
    Created {
        #[serde(rename = "_id")]
        id: UserId,
        username: String,
    },
    ExercisePushed {
        #[serde(rename = "_id")]
        id: UserId,
        entry: ExerciseEntry,
    },
}

/// Journal-backed store
pub struct JournalStore {
    path: PathBuf,
    users: Mutex<Vec<User>>,
}

impl JournalStore {
    /// Open (or lazily create) the journal at `path` and replay it
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let users = replay(&read_journal(&path)?);
        tracing::info!("Opened journal {:?} with {} users", path, users.len());
        Ok(Self {
            path,
            users: Mutex::new(users),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&self, record: JournalRecord) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || append_record(&path, &record))
            .await
            .map_err(|e| Error::Storage(format!("journal writer panicked: {}", e)))?
    }
}

#[async_trait]
impl UserStore for JournalStore {
    async fn insert(&self, user: &User) -> Result<()> {
        let mut users = self.users.lock().await;
        self.append(JournalRecord::Created {
            id: user.id.clone(),
            username: user.username.clone(),
        })
        .await?;
        for entry in &user.exercises {
            self.append(JournalRecord::ExercisePushed {
                id: user.id.clone(),
                entry: entry.clone(),
            })
            .await?;
        }
        users.push(user.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>> {
        Ok(self.users.lock().await.clone())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.users.lock().await.iter().find(|u| &u.id == id).cloned())
    }

    async fn push_exercise(&self, id: &UserId, entry: ExerciseEntry) -> Result<Option<User>> {
        // Holding the lock across the write makes the update atomic per store
        let mut users = self.users.lock().await;
        let Some(index) = users.iter().position(|u| &u.id == id) else {
            return Ok(None);
        };

        self.append(JournalRecord::ExercisePushed {
            id: id.clone(),
            entry: entry.clone(),
        })
        .await?;

        let user = &mut users[index];
        user.exercises.push(entry);
        Ok(Some(user.clone()))
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Take the exclusive journal lock; released when the file is dropped
fn lock_journal(path: &Path) -> Result<File> {
    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path(path))?;
    lock.lock_exclusive()?;
    Ok(lock)
}

fn append_record(path: &Path, record: &JournalRecord) -> Result<()> {
    ensure_parent_dir(path)?;
    let lock = lock_journal(path)?;

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = std::io::BufWriter::new(&file);
    let line = serde_json::to_string(record)?;
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    drop(writer);

    lock.unlock()?;
    tracing::debug!("Appended {} record to journal", record_kind(record));
    Ok(())
}

fn record_kind(record: &JournalRecord) -> &'static str {
    match record {
        JournalRecord::Created { .. } => "created",
        JournalRecord::ExercisePushed { .. } => "exercise_pushed",
    }
}

/// Read the journal under a shared lock
fn read_journal(path: &Path) -> Result<Vec<JournalRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let lock = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path(path))?;
    lock.lock_shared()?;
    let records = read_records(path)?;
    lock.unlock()?;
    Ok(records)
}

/// Read every well-formed record; malformed lines are skipped
///
/// The caller holds the journal lock.
fn read_records(path: &Path) -> Result<Vec<JournalRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<JournalRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Failed to parse journal record at line {}: {}", line_num + 1, e);
            }
        }
    }

    tracing::debug!("Read {} records from journal", records.len());
    Ok(records)
}

fn replay(records: &[JournalRecord]) -> Vec<User> {
    let mut users: Vec<User> = Vec::new();
    for record in records {
        match record {
            JournalRecord::Created { id, username } => {
                users.push(User::new(id.clone(), username.clone()));
            }
            JournalRecord::ExercisePushed { id, entry } => {
                match users.iter_mut().find(|u| &u.id == id) {
                    Some(user) => user.exercises.push(entry.clone()),
                    None => tracing::warn!("Journal entry for unknown user {}, skipping", id),
                }
            }
        }
    }
    users
}

/// Rewrite the journal with one `created` record per user followed by its
/// exercises, dropping malformed and orphaned lines
///
/// The new journal is written to a temp file, synced, then renamed over the
/// original. The journal lock is held from the read through the rename, so
/// appends from other writers wait and land in the new file. Returns the
/// number of users kept.
pub fn compact(path: &Path) -> Result<usize> {
    ensure_parent_dir(path)?;
    let lock = lock_journal(path)?;
    let users = replay(&read_records(path)?);

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = NamedTempFile::new_in(parent)?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        for user in &users {
            let created = JournalRecord::Created {
                id: user.id.clone(),
                username: user.username.clone(),
            };
            writeln!(writer, "{}", serde_json::to_string(&created)?)?;
            for entry in &user.exercises {
                let pushed = JournalRecord::ExercisePushed {
                    id: user.id.clone(),
                    entry: entry.clone(),
                };
                writeln!(writer, "{}", serde_json::to_string(&pushed)?)?;
            }
        }
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    lock.unlock()?;

    tracing::info!("Compacted journal {:?} to {} users", path, users.len());
    Ok(users.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(description: &str, date: &str) -> ExerciseEntry {
        ExerciseEntry {
            description: Some(description.into()),
            duration: 15.0,
            date: date.into(),
        }
    }

    #[tokio::test]
    async fn test_reopen_replays_users_and_exercises() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("users.jsonl");

        let store = JournalStore::open(&path).unwrap();
        let alice = User::new(store.next_id(), "alice");
        let bob = User::new(store.next_id(), "bob");
        store.insert(&alice).await.unwrap();
        store.insert(&bob).await.unwrap();
        store.push_exercise(&alice.id, entry("run", "2024-01-01")).await.unwrap();
        store.push_exercise(&bob.id, entry("lift", "2024-01-02")).await.unwrap();
        store.push_exercise(&alice.id, entry("row", "2024-01-03")).await.unwrap();
        drop(store);

        let reopened = JournalStore::open(&path).unwrap();
        let users = reopened.list().await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "alice");
        let descriptions: Vec<_> = users[0]
            .exercises
            .iter()
            .map(|e| e.description.clone().unwrap())
            .collect();
        assert_eq!(descriptions, vec!["run", "row"]);
        assert_eq!(users[1].exercises.len(), 1);
    }

    #[tokio::test]
    async fn test_nan_duration_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("users.jsonl");

        let store = JournalStore::open(&path).unwrap();
        let user = User::new(store.next_id(), "carol");
        store.insert(&user).await.unwrap();
        let bad = ExerciseEntry {
            description: None,
            duration: f64::NAN,
            date: "garbage".into(),
        };
        store.push_exercise(&user.id, bad).await.unwrap();
        drop(store);

        let reopened = JournalStore::open(&path).unwrap();
        let found = reopened.find_by_id(&user.id).await.unwrap().unwrap();
        assert!(found.exercises[0].duration.is_nan());
        assert_eq!(found.exercises[0].date, "garbage");
    }

    #[tokio::test]
    async fn test_push_to_unknown_user_writes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("users.jsonl");

        let store = JournalStore::open(&path).unwrap();
        let result = store
            .push_exercise(&UserId::from("ghost"), entry("run", "2024-01-01"))
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_corrupted_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("users.jsonl");
        std::fs::write(
            &path,
            concat!(
                "{\"op\":\"created\",\"_id\":\"u1\",\"username\":\"dave\"}\n",
                "{ not json\n",
                "\n",
                "{\"op\":\"exercise_pushed\",\"_id\":\"u1\",\"entry\":{\"description\":\"walk\",\"duration\":10,\"date\":\"2024-02-02\"}}\n",
                "{\"op\":\"exercise_pushed\",\"_id\":\"zz\",\"entry\":{\"duration\":1,\"date\":\"2024-02-02\"}}\n",
            ),
        )
        .unwrap();

        let users = replay(&read_records(&path).unwrap());
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].exercises.len(), 1);
        assert_eq!(users[0].exercises[0].duration, 10.0);
    }

    #[tokio::test]
    async fn test_compact_preserves_content() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("users.jsonl");

        let store = JournalStore::open(&path).unwrap();
        let user = User::new(store.next_id(), "erin");
        store.insert(&user).await.unwrap();
        for day in 1..=3 {
            store
                .push_exercise(&user.id, entry("bike", &format!("2024-03-0{}", day)))
                .await
                .unwrap();
        }
        let before = store.list().await.unwrap();
        drop(store);

        // Append junk that compaction should drop
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "garbage line").unwrap();
        drop(file);

        let kept = compact(&path).unwrap();
        assert_eq!(kept, 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 4);

        let after = JournalStore::open(&path).unwrap().list().await.unwrap();
        assert_eq!(before, after);

        // No stray temp files remain
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "users.jsonl" && e.file_name() != "users.jsonl.lock")
            .collect();
        assert!(extras.is_empty(), "found extras: {:?}", extras);
    }

    #[test]
    fn test_append_waits_for_journal_lock() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("users.jsonl");

        let held = lock_journal(&path).unwrap();

        let writer_path = path.clone();
        let writer = std::thread::spawn(move || {
            let record = JournalRecord::Created {
                id: UserId::from("late"),
                username: "late".into(),
            };
            append_record(&writer_path, &record).unwrap();
        });

        std::thread::sleep(std::time::Duration::from_millis(200));
        let contents = std::fs::read_to_string(&path).unwrap_or_default();
        assert!(!contents.contains("late"), "append ignored the held lock");

        drop(held);
        writer.join().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("late"));
    }

    #[test]
    fn test_compact_keeps_concurrent_appends() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("users.jsonl");

        let id = UserId::from("u1");
        let created = JournalRecord::Created {
            id: id.clone(),
            username: "frank".into(),
        };
        append_record(&path, &created).unwrap();

        let writers: Vec<_> = (0..4)
            .map(|n| {
                let path = path.clone();
                let id = id.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let record = JournalRecord::ExercisePushed {
                            id: id.clone(),
                            entry: entry(&format!("set {}-{}", n, i), "2024-04-01"),
                        };
                        append_record(&path, &record).unwrap();
                    }
                })
            })
            .collect();

        for _ in 0..20 {
            compact(&path).unwrap();
        }
        for writer in writers {
            writer.join().unwrap();
        }

        let users = replay(&read_journal(&path).unwrap());
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].exercises.len(), 100);
    }
}
