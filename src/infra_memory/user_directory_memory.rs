use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Process-local [`UserDirectory`], keyed by id with a unique email index.
#[derive(Default)]
pub struct MemoryUserDirectory {
    users: DashMap<SubjectId, UserRecord>,
    by_email: DashMap<String, SubjectId>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active(&self, id: &SubjectId, active: bool) {
        if let Some(mut user) = self.users.get_mut(id) {
            user.is_active = active;
        }
    }
}

#[async_trait::async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let Some(id) = self.by_email.get(email).map(|id| id.clone()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    async fn find_by_id(&self, id: &SubjectId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(id).map(|user| user.clone()))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.by_email.contains_key(email))
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord, StoreError> {
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                let record = UserRecord {
                    id: SubjectId(uuid::Uuid::new_v4().to_string()),
                    email: user.email,
                    name: user.name,
                    password_hash: user.password_hash,
                    is_active: true,
                    created_at: Utc::now(),
                };
                self.users.insert(record.id.clone(), record.clone());
                slot.insert(record.id.clone());
                Ok(record)
            }
        }
    }
}
