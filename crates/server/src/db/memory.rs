//! In-process backend.
//!
//! All documents sit behind one tokio mutex. A unit of work owns the lock for
//! its whole lifetime and stages its writes; commit applies them, drop throws
//! them away. This serializes units of work, which is stricter than the row
//! locks `PostgreSQL` takes but gives the same guarantees.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use bazaar_core::{Email, Item, ItemFilter, ItemId, NewItem, NewUser, User, UserId};

use super::{RepositoryError, Store, UnitOfWork};

#[derive(Debug, Default)]
struct Documents {
    items: BTreeMap<ItemId, Item>,
    users: BTreeMap<UserId, User>,
    next_item: i32,
    next_user: i32,
}

impl Documents {
    fn email_taken(&self, email: &Email) -> bool {
        self.users.values().any(|u| u.email == *email)
    }
}

/// Store that keeps every document in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<Documents>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let guard = Arc::clone(&self.docs).lock_owned().await;
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            items: BTreeMap::new(),
            users: BTreeMap::new(),
        }))
    }

    async fn insert_item(&self, item: NewItem) -> Result<Item, RepositoryError> {
        let mut docs = self.docs.lock().await;
        let id = ItemId::new(docs.next_item + 1);
        let item = Item::create(id, item, Utc::now())
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        docs.next_item += 1;
        docs.items.insert(id, item.clone());
        Ok(item)
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        Ok(self.docs.lock().await.items.get(&id).cloned())
    }

    async fn search_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, RepositoryError> {
        // Ids are handed out in creation order, so id order is oldest first.
        Ok(self
            .docs
            .lock()
            .await
            .items
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect())
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, RepositoryError> {
        Ok(self.docs.lock().await.items.remove(&id).is_some())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut docs = self.docs.lock().await;
        if docs.email_taken(&user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        docs.next_user += 1;
        let id = UserId::new(docs.next_user);
        let user = User::create(id, user, Utc::now());
        docs.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.docs.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .docs
            .lock()
            .await
            .users
            .values()
            .find(|u| u.email == *email)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.docs.lock().await.users.values().cloned().collect())
    }
}

/// Staged writes over the locked documents. `None` marks a deleted user.
struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Documents>,
    items: BTreeMap<ItemId, Item>,
    users: BTreeMap<UserId, Option<User>>,
}

impl MemoryUnitOfWork {
    fn current_user(&self, id: UserId) -> Option<User> {
        match self.users.get(&id) {
            Some(staged) => staged.clone(),
            None => self.guard.users.get(&id).cloned(),
        }
    }

    fn current_users(&self) -> impl Iterator<Item = User> + '_ {
        let committed = self
            .guard
            .users
            .keys()
            .filter(|id| !self.users.contains_key(*id));
        committed
            .chain(self.users.keys())
            .filter_map(|id| self.current_user(*id))
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        Ok(self
            .items
            .get(&id)
            .or_else(|| self.guard.items.get(&id))
            .cloned())
    }

    async fn user_for_update(&mut self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.current_user(id))
    }

    async fn user_by_email_for_update(
        &mut self,
        email: &Email,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self.current_users().find(|u| u.email == *email))
    }

    async fn save_item(&mut self, item: &Item) -> Result<(), RepositoryError> {
        if !self.guard.items.contains_key(&item.id) {
            return Err(RepositoryError::NotFound);
        }
        self.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn save_user(&mut self, user: &User) -> Result<(), RepositoryError> {
        if self.current_user(user.id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        if self
            .current_users()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        self.users.insert(user.id, Some(user.clone()));
        Ok(())
    }

    async fn delete_user(&mut self, id: UserId) -> Result<bool, RepositoryError> {
        let existed = self.current_user(id).is_some();
        self.users.insert(id, None);
        Ok(existed)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let Self {
            mut guard,
            items,
            users,
        } = *self;
        guard.items.extend(items);
        for (id, user) in users {
            match user {
                Some(user) => guard.users.insert(id, user),
                None => guard.users.remove(&id),
            };
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::Stock;
    use rust_decimal::Decimal;

    use super::*;

    fn new_item(count: u32) -> NewItem {
        NewItem {
            title: "Lamp".to_owned(),
            image: "lamp.png".to_owned(),
            price: Decimal::new(25, 0),
            description: "A desk lamp".to_owned(),
            available_count: Stock::new(count).unwrap(),
            category: "Home".to_owned(),
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ada".to_owned(),
            email: Email::parse(email).unwrap(),
            password_hash: "hash".to_owned(),
            date_of_birth: None,
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MemoryStore::new();
        let first = store.insert_item(new_item(1)).await.unwrap();
        let second = store.insert_item(new_item(2)).await.unwrap();
        assert_eq!(first.id, ItemId::new(1));
        assert_eq!(second.id, ItemId::new(2));
        assert_eq!(store.search_items(&ItemFilter::default()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com")).await.unwrap();
        let err = store.insert_user(new_user("A@example.com")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_commit_applies_staged_writes() {
        let store = MemoryStore::new();
        let item = store.insert_item(new_item(10)).await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let mut locked = uow.item_for_update(item.id).await.unwrap().unwrap();
        locked.available_count = Stock::new(4).unwrap();
        uow.save_item(&locked).await.unwrap();
        assert_eq!(
            uow.item_for_update(item.id).await.unwrap().unwrap().available_count.get(),
            4
        );
        uow.commit().await.unwrap();

        let stored = store.get_item(item.id).await.unwrap().unwrap();
        assert_eq!(stored.available_count.get(), 4);
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_discards_writes() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("a@example.com")).await.unwrap();

        {
            let mut uow = store.begin().await.unwrap();
            let mut locked = uow.user_for_update(user.id).await.unwrap().unwrap();
            locked.name = "Changed".to_owned();
            uow.save_user(&locked).await.unwrap();
            assert!(uow.delete_user(user.id).await.unwrap());
        }

        let stored = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Ada");
    }

    #[tokio::test]
    async fn test_save_user_checks_email_against_staged_view() {
        let store = MemoryStore::new();
        let a = store.insert_user(new_user("a@example.com")).await.unwrap();
        let b = store.insert_user(new_user("b@example.com")).await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let mut b_locked = uow.user_for_update(b.id).await.unwrap().unwrap();
        b_locked.email = a.email.clone();
        assert!(matches!(
            uow.save_user(&b_locked).await.unwrap_err(),
            RepositoryError::Conflict(_)
        ));

        assert!(uow.delete_user(a.id).await.unwrap());
        uow.save_user(&b_locked).await.unwrap();
        uow.commit().await.unwrap();

        assert!(store.get_user(a.id).await.unwrap().is_none());
        let found = store.find_user_by_email(&a.email).await.unwrap().unwrap();
        assert_eq!(found.id, b.id);
    }
}
