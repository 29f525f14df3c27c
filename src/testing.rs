//! In-memory stores standing in for Postgres and Redis in unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::{cache::SessionCache, repo::UserStore, repo_types::PublicUser, repo_types::User};
use crate::goals::{
    repo::GoalStore,
    repo_types::{Goal, ProgressSample},
};
use crate::state::AppState;
use crate::validation::{GoalChanges, NewGoal};

/// An `AppState` plus typed handles on the stores behind it.
pub struct Harness {
    pub state: AppState,
    pub users: Arc<MemoryUserStore>,
    pub goals: Arc<MemoryGoalStore>,
    pub sessions: Arc<MemorySessionCache>,
}

impl Harness {
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserStore::default());
        let goals = Arc::new(MemoryGoalStore::default());
        let sessions = Arc::new(MemorySessionCache::default());
        let state = AppState::from_parts(
            AppState::fake().config,
            users.clone(),
            goals.clone(),
            sessions.clone(),
        );
        Self {
            state,
            users,
            goals,
            sessions,
        }
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn count_with_email(&self, email: &str) -> usize {
        self.users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.email == email)
            .count()
    }

    pub fn rename(&self, id: Uuid, name: &str) {
        if let Some(u) = self.users.lock().unwrap().iter_mut().find(|u| u.id == id) {
            u.name = name.to_string();
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(Some(user))
    }
}

#[derive(Default)]
pub struct MemoryGoalStore {
    goals: Mutex<Vec<Goal>>,
    broken: AtomicBool,
}

impl MemoryGoalStore {
    /// Makes every later call fail like a lost connection.
    pub fn break_connection(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            anyhow::bail!("connection refused (os error 111)");
        }
        Ok(())
    }

    fn with_goal<F>(&self, user_id: Uuid, goal_id: Uuid, f: F) -> anyhow::Result<Option<Goal>>
    where
        F: FnOnce(&mut Goal),
    {
        self.check()?;
        let mut goals = self.goals.lock().unwrap();
        Ok(goals
            .iter_mut()
            .find(|g| g.id == goal_id && g.user_id == user_id)
            .map(|g| {
                f(g);
                g.clone()
            }))
    }
}

#[async_trait]
impl GoalStore for MemoryGoalStore {
    async fn insert(
        &self,
        user_id: Uuid,
        goal: &NewGoal,
        now: OffsetDateTime,
    ) -> anyhow::Result<Goal> {
        self.check()?;
        let goal = Goal {
            id: Uuid::new_v4(),
            user_id,
            title: goal.title.clone(),
            description: goal.description.clone(),
            due_date: goal.due_date,
            progress: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.goals.lock().unwrap().push(goal.clone());
        Ok(goal)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Goal>> {
        self.check()?;
        let mut goals: Vec<Goal> = self
            .goals
            .lock()
            .unwrap()
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        goals.sort_by(|a, b| (a.due_date, a.created_at).cmp(&(b.due_date, b.created_at)));
        Ok(goals)
    }

    async fn find(&self, user_id: Uuid, goal_id: Uuid) -> anyhow::Result<Option<Goal>> {
        self.with_goal(user_id, goal_id, |_| {})
    }

    async fn update(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        changes: &GoalChanges,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<Goal>> {
        self.with_goal(user_id, goal_id, |g| {
            if let Some(t) = &changes.title {
                g.title = t.clone();
            }
            if let Some(d) = &changes.description {
                g.description = d.clone();
            }
            if let Some(d) = changes.due_date {
                g.due_date = d;
            }
            g.updated_at = now;
        })
    }

    async fn delete(&self, user_id: Uuid, goal_id: Uuid) -> anyhow::Result<bool> {
        self.check()?;
        let mut goals = self.goals.lock().unwrap();
        let before = goals.len();
        goals.retain(|g| !(g.id == goal_id && g.user_id == user_id));
        Ok(goals.len() != before)
    }

    async fn append_progress(
        &self,
        user_id: Uuid,
        goal_id: Uuid,
        sample: ProgressSample,
    ) -> anyhow::Result<Option<Goal>> {
        self.with_goal(user_id, goal_id, |g| {
            g.progress.push(sample);
            g.updated_at = sample.date;
        })
    }
}

#[derive(Default)]
pub struct MemorySessionCache {
    entries: Mutex<HashMap<Uuid, PublicUser>>,
    broken: AtomicBool,
}

impl MemorySessionCache {
    pub fn contains(&self, user_id: Uuid) -> bool {
        self.entries.lock().unwrap().contains_key(&user_id)
    }

    pub fn cached(&self, user_id: Uuid) -> Option<PublicUser> {
        self.entries.lock().unwrap().get(&user_id).cloned()
    }

    pub fn break_connection(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> anyhow::Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            anyhow::bail!("redis connection refused");
        }
        Ok(())
    }
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn get(&self, user_id: Uuid) -> anyhow::Result<Option<PublicUser>> {
        self.check()?;
        Ok(self.cached(user_id))
    }

    async fn put(&self, user: &PublicUser) -> anyhow::Result<()> {
        self.check()?;
        self.entries.lock().unwrap().insert(user.id, user.clone());
        Ok(())
    }

    async fn evict(&self, user_id: Uuid) -> anyhow::Result<()> {
        self.check()?;
        self.entries.lock().unwrap().remove(&user_id);
        Ok(())
    }
}
