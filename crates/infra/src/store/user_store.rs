use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use aurora_core::{DomainError, DomainResult, UserId};

/// User-scoped key/value store for per-user records (images, analyses,
/// appointments, profiles).
///
/// Lookups through `get`/`list` never cross users; `find`/`list_all` exist for
/// admin views and must only be reached after an authorization check.
pub trait UserStore<K, V>: Send + Sync {
    fn get(&self, user_id: UserId, key: &K) -> Option<V>;
    fn upsert(&self, user_id: UserId, key: K, value: V);
    fn remove(&self, user_id: UserId, key: &K) -> Option<V>;
    fn list(&self, user_id: UserId) -> Vec<V>;
    /// Locate a record by key regardless of owner.
    fn find(&self, key: &K) -> Option<(UserId, V)>;
    fn list_all(&self) -> Vec<(UserId, V)>;
    /// Locate a record by key and modify it under the store's write lock.
    ///
    /// `apply` receives the owner and a working copy; the copy is written back
    /// only if `apply` succeeds. Missing keys yield `DomainError::NotFound`.
    fn update(
        &self,
        key: &K,
        apply: &mut dyn FnMut(UserId, &mut V) -> DomainResult<()>,
    ) -> DomainResult<(UserId, V)>;
}

impl<K, V, S> UserStore<K, V> for Arc<S>
where
    S: UserStore<K, V> + ?Sized,
{
    fn get(&self, user_id: UserId, key: &K) -> Option<V> {
        (**self).get(user_id, key)
    }

    fn upsert(&self, user_id: UserId, key: K, value: V) {
        (**self).upsert(user_id, key, value)
    }

    fn remove(&self, user_id: UserId, key: &K) -> Option<V> {
        (**self).remove(user_id, key)
    }

    fn list(&self, user_id: UserId) -> Vec<V> {
        (**self).list(user_id)
    }

    fn find(&self, key: &K) -> Option<(UserId, V)> {
        (**self).find(key)
    }

    fn list_all(&self) -> Vec<(UserId, V)> {
        (**self).list_all()
    }

    fn update(
        &self,
        key: &K,
        apply: &mut dyn FnMut(UserId, &mut V) -> DomainResult<()>,
    ) -> DomainResult<(UserId, V)> {
        (**self).update(key, apply)
    }
}

/// In-memory user-scoped store.
#[derive(Debug)]
pub struct InMemoryUserStore<K, V> {
    inner: RwLock<HashMap<(UserId, K), V>>,
}

impl<K, V> InMemoryUserStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryUserStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> UserStore<K, V> for InMemoryUserStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, user_id: UserId, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(&(user_id, key.clone())).cloned()
    }

    fn upsert(&self, user_id: UserId, key: K, value: V) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((user_id, key), value);
        }
    }

    fn remove(&self, user_id: UserId, key: &K) -> Option<V> {
        let mut map = self.inner.write().ok()?;
        map.remove(&(user_id, key.clone()))
    }

    fn list(&self, user_id: UserId) -> Vec<V> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        map.iter()
            .filter_map(|((u, _k), v)| if *u == user_id { Some(v.clone()) } else { None })
            .collect()
    }

    fn find(&self, key: &K) -> Option<(UserId, V)> {
        let map = self.inner.read().ok()?;
        map.iter()
            .find(|((_u, k), _v)| k == key)
            .map(|((u, _k), v)| (*u, v.clone()))
    }

    fn list_all(&self) -> Vec<(UserId, V)> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        map.iter().map(|((u, _k), v)| (*u, v.clone())).collect()
    }

    fn update(
        &self,
        key: &K,
        apply: &mut dyn FnMut(UserId, &mut V) -> DomainResult<()>,
    ) -> DomainResult<(UserId, V)> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::conflict("user store lock poisoned"))?;
        let (owner, slot) = map
            .iter_mut()
            .find(|((_u, k), _v)| k == key)
            .map(|((u, _k), v)| (*u, v))
            .ok_or(DomainError::NotFound)?;

        let mut next = slot.clone();
        apply(owner, &mut next)?;
        *slot = next.clone();
        Ok((owner, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_isolated_per_user() {
        let store: InMemoryUserStore<u32, &'static str> = InMemoryUserStore::new();
        let alice = UserId::new();
        let bob = UserId::new();

        store.upsert(alice, 1, "alice-1");
        store.upsert(bob, 1, "bob-1");
        store.upsert(alice, 2, "alice-2");

        assert_eq!(store.get(alice, &1), Some("alice-1"));
        assert_eq!(store.get(bob, &1), Some("bob-1"));
        assert_eq!(store.get(bob, &2), None);

        let mut mine = store.list(alice);
        mine.sort();
        assert_eq!(mine, vec!["alice-1", "alice-2"]);
    }

    #[test]
    fn remove_only_touches_the_owner() {
        let store: InMemoryUserStore<u32, u32> = InMemoryUserStore::new();
        let alice = UserId::new();
        let bob = UserId::new();
        store.upsert(alice, 7, 70);

        assert_eq!(store.remove(bob, &7), None);
        assert_eq!(store.remove(alice, &7), Some(70));
        assert!(store.list(alice).is_empty());
    }

    #[test]
    fn find_reports_owner() {
        let store: Arc<InMemoryUserStore<u32, u32>> = Arc::new(InMemoryUserStore::new());
        let alice = UserId::new();
        store.upsert(alice, 3, 30);

        assert_eq!(store.find(&3), Some((alice, 30)));
        assert_eq!(store.find(&4), None);
        assert_eq!(store.list_all(), vec![(alice, 30)]);
    }

    #[test]
    fn update_writes_back_only_on_success() {
        let store: InMemoryUserStore<u32, u32> = InMemoryUserStore::new();
        let alice = UserId::new();
        store.upsert(alice, 1, 10);

        let updated = store.update(&1, &mut |owner, v| {
            assert_eq!(owner, alice);
            *v += 5;
            Ok(())
        });
        assert_eq!(updated, Ok((alice, 15)));

        let rejected = store.update(&1, &mut |_, v| {
            *v = 0;
            Err(DomainError::conflict("nope"))
        });
        assert_eq!(rejected, Err(DomainError::conflict("nope")));
        assert_eq!(store.get(alice, &1), Some(15));

        assert_eq!(store.update(&2, &mut |_, _| Ok(())), Err(DomainError::NotFound));
    }

    #[test]
    fn concurrent_terminal_updates_have_one_winner() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::thread;

        // 0 = open, anything else = terminal.
        let store: Arc<InMemoryUserStore<u32, u32>> = Arc::new(InMemoryUserStore::new());
        let alice = UserId::new();

        for round in 0..200u32 {
            store.upsert(alice, round, 0);
            let wins = Arc::new(AtomicUsize::new(0));

            let handles: Vec<_> = (1..=4u32)
                .map(|terminal| {
                    let store = Arc::clone(&store);
                    let wins = Arc::clone(&wins);
                    thread::spawn(move || {
                        let outcome = store.update(&round, &mut |_, v| {
                            if *v != 0 {
                                return Err(DomainError::conflict("already terminal"));
                            }
                            *v = terminal;
                            Ok(())
                        });
                        if outcome.is_ok() {
                            wins.fetch_add(1, Ordering::SeqCst);
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }

            assert_eq!(wins.load(Ordering::SeqCst), 1, "round {round}");
        }
    }
}
