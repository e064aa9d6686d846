use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::auth::JwtKeys;

pub struct AppState {
    pub db: RwLock<Db>,
    pub keys: JwtKeys,
    pub pdf_dir: PathBuf,
}

impl AppState {
    pub fn new(keys: JwtKeys, pdf_dir: impl Into<PathBuf>) -> Self {
        Self {
            db: RwLock::new(Db::default()),
            keys,
            pdf_dir: pdf_dir.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: u64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: u64,
    pub email: String,
    pub name: String,
}

impl From<&UserRow> for PublicUser {
    fn from(row: &UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email.clone(),
            name: row.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordInput {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub doctor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: u64,
    pub date: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub doctor: String,
    pub patient: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChallengeId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeCompletion {
    pub id: u64,
    pub user: u64,
    pub challenge_id: ChallengeId,
    pub completed_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub username: String,
    pub count: u64,
}

/// In-memory tables. Ids count up from 1 per table and are never reused.
#[derive(Default)]
pub struct Db {
    users: Vec<UserRow>,
    records: Vec<Record>,
    completions: Vec<ChallengeCompletion>,
    last_user_id: u64,
    last_record_id: u64,
    last_completion_id: u64,
}

fn next(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

impl Db {
    pub fn email_taken(&self, email: &str) -> bool {
        self.users.iter().any(|u| u.email == email)
    }

    /// `None` when the email is already registered.
    pub fn insert_user(
        &mut self,
        email: String,
        password_hash: String,
        name: String,
    ) -> Option<PublicUser> {
        if self.email_taken(&email) {
            return None;
        }

        let row = UserRow {
            id: next(&mut self.last_user_id),
            email,
            password_hash,
            name,
        };
        let user = PublicUser::from(&row);
        self.users.push(row);
        Some(user)
    }

    pub fn user_by_email(&self, email: &str) -> Option<&UserRow> {
        self.users.iter().find(|u| u.email == email)
    }

    pub fn insert_record(&mut self, patient: u64, input: RecordInput) -> Record {
        let record = Record {
            id: next(&mut self.last_record_id),
            date: now(),
            kind: input.kind,
            description: input.description,
            doctor: input.doctor,
            patient,
        };
        self.records.push(record.clone());
        record
    }

    pub fn records_for(&self, patient: u64) -> Vec<Record> {
        self.records
            .iter()
            .filter(|r| r.patient == patient)
            .cloned()
            .collect()
    }

    pub fn record(&self, patient: u64, id: u64) -> Option<&Record> {
        self.records
            .iter()
            .find(|r| r.id == id && r.patient == patient)
    }

    pub fn update_record(&mut self, patient: u64, id: u64, input: RecordInput) -> Option<Record> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.id == id && r.patient == patient)?;

        record.kind = input.kind;
        record.description = input.description;
        record.doctor = input.doctor;
        Some(record.clone())
    }

    pub fn delete_record(&mut self, patient: u64, id: u64) -> bool {
        match self
            .records
            .iter()
            .position(|r| r.id == id && r.patient == patient)
        {
            Some(index) => {
                self.records.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn complete_challenge(&mut self, user: u64, challenge_id: ChallengeId) -> ChallengeCompletion {
        let completion = ChallengeCompletion {
            id: next(&mut self.last_completion_id),
            user,
            challenge_id,
            completed_at: now(),
        };
        self.completions.push(completion.clone());
        completion
    }

    pub fn completions_for(&self, user: u64) -> Vec<ChallengeCompletion> {
        self.completions
            .iter()
            .filter(|c| c.user == user)
            .cloned()
            .collect()
    }

    /// Completions counted per user name, most first. Ties keep the order in
    /// which names first completed something.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = Vec::new();

        for completion in &self.completions {
            let Some(user) = self.users.iter().find(|u| u.id == completion.user) else {
                continue;
            };

            match entries.iter_mut().find(|e| e.username == user.name) {
                Some(entry) => entry.count += 1,
                None => entries.push(LeaderboardEntry {
                    username: user.name.clone(),
                    count: 1,
                }),
            }
        }

        entries.sort_by(|a, b| b.count.cmp(&a.count));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(kind: &str) -> RecordInput {
        RecordInput {
            kind: kind.to_string(),
            description: "routine".to_string(),
            doctor: "Dr. Smith".to_string(),
        }
    }

    fn with_users(names: &[&str]) -> Db {
        let mut db = Db::default();
        for name in names {
            db.insert_user(format!("{}@example.com", name), "hash".into(), name.to_string())
                .unwrap();
        }
        db
    }

    #[test]
    fn test_duplicate_email() {
        let mut db = Db::default();
        let first = db
            .insert_user("a@b.c".into(), "h".into(), "A".into())
            .unwrap();
        assert_eq!(first.id, 1);
        assert!(db.insert_user("a@b.c".into(), "h".into(), "B".into()).is_none());
        assert_eq!(db.user_by_email("a@b.c").unwrap().name, "A");
    }

    #[test]
    fn test_records_are_scoped_to_patient() {
        let mut db = with_users(&["alice", "bob"]);
        let mine = db.insert_record(1, input("checkup"));
        let theirs = db.insert_record(2, input("lab"));

        assert_eq!(db.records_for(1), vec![mine.clone()]);
        assert!(db.record(1, theirs.id).is_none());
        assert!(db.update_record(1, theirs.id, input("x")).is_none());
        assert!(!db.delete_record(1, theirs.id));
        assert_eq!(db.records_for(2), vec![theirs]);

        let updated = db.update_record(1, mine.id, input("follow-up")).unwrap();
        assert_eq!(updated.kind, "follow-up");
        assert_eq!(updated.date, mine.date);
        assert!(db.delete_record(1, mine.id));
        assert!(db.records_for(1).is_empty());
    }

    #[test]
    fn test_record_ids_not_reused() {
        let mut db = with_users(&["alice"]);
        let a = db.insert_record(1, input("a"));
        db.delete_record(1, a.id);
        let b = db.insert_record(1, input("b"));
        assert!(b.id > a.id);
    }

    #[test]
    fn test_leaderboard() {
        let mut db = with_users(&["alice", "bob", "carol"]);
        db.complete_challenge(2, ChallengeId::Number(1));
        db.complete_challenge(1, ChallengeId::Number(1));
        db.complete_challenge(1, ChallengeId::Text("walk".into()));
        db.complete_challenge(3, ChallengeId::Number(2));
        db.complete_challenge(99, ChallengeId::Number(2));

        let board: Vec<(String, u64)> = db
            .leaderboard()
            .into_iter()
            .map(|e| (e.username, e.count))
            .collect();
        assert_eq!(
            board,
            vec![
                ("alice".to_string(), 2),
                ("bob".to_string(), 1),
                ("carol".to_string(), 1)
            ]
        );
        assert_eq!(db.completions_for(1).len(), 2);
    }
}
