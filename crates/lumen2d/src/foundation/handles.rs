//! Opaque resource handles and the kind-partitioned handle table
//!
//! Every resource the engine hands out (images, textures, waves, sounds,
//! music) is referenced through a [`Handle<T>`]. The partition is the type
//! parameter: a `HandleTable<Texture>` only ever issues `Handle<Texture>`,
//! so numeric ids may coincide across kinds without ambiguity.
//!
//! Ids are issued from a per-table counter starting at 1 and are never
//! reused, even after the resource is destroyed. Id 0 is the invalid
//! sentinel and negative ids are never issued.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// Handle table errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleError {
    /// The handle was never issued, was already destroyed, or is the sentinel
    #[error("{kind} handle {id} not found")]
    NotFound {
        /// Resource kind name
        kind: &'static str,
        /// Raw handle value
        id: i32,
    },

    /// The id counter ran out of values
    #[error("{kind} handle space exhausted")]
    Exhausted {
        /// Resource kind name
        kind: &'static str,
    },
}

/// Typed handle for type-safe resource references
pub struct Handle<T> {
    id: i32,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// The reserved sentinel value, never issued for a live resource
    pub const INVALID_ID: i32 = 0;

    const fn new(id: i32) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Create the invalid sentinel handle
    pub const fn invalid() -> Self {
        Self::new(Self::INVALID_ID)
    }

    /// Check whether this handle could refer to a live resource
    pub const fn is_valid(&self) -> bool {
        self.id > Self::INVALID_ID
    }

    /// Get the raw id
    pub const fn id(&self) -> i32 {
        self.id
    }
}

// Manual impls: derives would put bounds on `T`.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> std::hash::Hash for Handle<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle<{}>({})", short_type_name::<T>(), self.id)
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::invalid()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Mapping from handle to owned value for one resource kind
pub struct HandleTable<T> {
    kind: &'static str,
    entries: HashMap<i32, T>,
    next_id: i32,
}

impl<T> HandleTable<T> {
    /// Create an empty table; `kind` is used in logs and errors
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: HashMap::new(),
            next_id: 1,
        }
    }

    /// Resource kind name of this table
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Insert a value under a freshly minted handle
    pub fn create(&mut self, value: T) -> Result<Handle<T>, HandleError> {
        let id = self.next_id;
        if id == i32::MAX {
            return Err(HandleError::Exhausted { kind: self.kind });
        }
        self.next_id += 1;
        self.entries.insert(id, value);
        log::trace!("Created {} handle {}", self.kind, id);
        Ok(Handle::new(id))
    }

    /// Remove the association and hand the value back to the caller
    pub fn destroy(&mut self, handle: Handle<T>) -> Result<T, HandleError> {
        let value = self.entries.remove(&handle.id).ok_or(HandleError::NotFound {
            kind: self.kind,
            id: handle.id,
        })?;
        log::trace!("Destroyed {} handle {}", self.kind, handle.id);
        Ok(value)
    }

    /// Look up a live resource
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.entries.get(&handle.id)
    }

    /// Look up a live resource mutably
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.entries.get_mut(&handle.id)
    }

    /// Look up a live resource, converting absence into an error
    pub fn try_get(&self, handle: Handle<T>) -> Result<&T, HandleError> {
        self.get(handle).ok_or(HandleError::NotFound {
            kind: self.kind,
            id: handle.id,
        })
    }

    /// Look up a live resource mutably, converting absence into an error
    pub fn try_get_mut(&mut self, handle: Handle<T>) -> Result<&mut T, HandleError> {
        let kind = self.kind;
        self.entries
            .get_mut(&handle.id)
            .ok_or(HandleError::NotFound { kind, id: handle.id })
    }

    /// Check whether a handle refers to a live resource
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.entries.contains_key(&handle.id)
    }

    /// Number of live resources
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no live resources
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over live resources in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.entries.iter().map(|(id, value)| (Handle::new(*id), value))
    }

    /// Remove every live resource. The id counter keeps counting.
    pub fn drain(&mut self) -> impl Iterator<Item = (Handle<T>, T)> + '_ {
        self.entries.drain().map(|(id, value)| (Handle::new(id), value))
    }
}
