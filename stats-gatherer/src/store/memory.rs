use crate::store::{
    parse_counter,
    ResqueStore,
    StoreError,
    StoreFuture,
};
use redis::{
    ErrorKind,
    RedisError,
};
use std::collections::{
    BTreeMap,
    BTreeSet,
};

#[derive(Debug, Clone)]
enum Entry {
    Set(BTreeSet<String>),
    List(usize),
    String(String),
}

impl Entry {
    fn kind(&self) -> &'static str {
        match self {
            Entry::Set(_) => "set",
            Entry::List(_) => "list",
            Entry::String(_) => "string",
        }
    }
}

/// In-memory stand-in for Redis with the same absent-key and wrong-type behavior as `RedisStore`.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryStore {
    entries: BTreeMap<String, Entry>,
    unreachable: bool,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub(crate) fn with_set<I, S>(mut self, key: &str, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(
            key.to_string(),
            Entry::Set(members.into_iter().map(Into::into).collect()),
        );
        self
    }

    pub(crate) fn with_list(mut self, key: &str, len: usize) -> Self {
        self.entries.insert(key.to_string(), Entry::List(len));
        self
    }

    pub(crate) fn with_string(mut self, key: &str, value: &str) -> Self {
        self.entries.insert(key.to_string(), Entry::String(value.to_string()));
        self
    }

    fn wrong_type(key: &str) -> StoreError {
        StoreError::command(
            key,
            RedisError::from((
                ErrorKind::TypeError,
                "WRONGTYPE Operation against a key holding the wrong kind of value",
            )),
        )
    }
}

impl ResqueStore for MemoryStore {
    fn ping(&mut self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            if self.unreachable {
                Err(StoreError::Connection(RedisError::from((
                    ErrorKind::IoError,
                    "Connection refused",
                ))))
            } else {
                Ok(())
            }
        })
    }

    fn set_members<'a>(&'a mut self, key: &'a str) -> StoreFuture<'a, Vec<String>> {
        Box::pin(async move {
            match self.entries.get(key) {
                Some(Entry::Set(members)) => Ok(members.iter().cloned().collect()),
                Some(other) => Err(StoreError::WrongType {
                    key: key.to_string(),
                    found: other.kind().to_string(),
                    expected: "set",
                }),
                None => Err(StoreError::MissingKey(key.to_string())),
            }
        })
    }

    fn list_len<'a>(&'a mut self, key: &'a str) -> StoreFuture<'a, u64> {
        Box::pin(async move {
            match self.entries.get(key) {
                Some(Entry::List(len)) => Ok(*len as u64),
                Some(_) => Err(Self::wrong_type(key)),
                None => Ok(0),
            }
        })
    }

    fn set_card<'a>(&'a mut self, key: &'a str) -> StoreFuture<'a, u64> {
        Box::pin(async move {
            match self.entries.get(key) {
                Some(Entry::Set(members)) => Ok(members.len() as u64),
                Some(_) => Err(Self::wrong_type(key)),
                None => Ok(0),
            }
        })
    }

    fn counter<'a>(&'a mut self, key: &'a str) -> StoreFuture<'a, f64> {
        Box::pin(async move {
            match self.entries.get(key) {
                Some(Entry::String(value)) => parse_counter(key, Some(value.clone())),
                Some(_) => Err(Self::wrong_type(key)),
                None => parse_counter(key, None),
            }
        })
    }
}
