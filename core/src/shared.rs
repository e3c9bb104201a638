//! The process-wide shared instance.
//!
//! There is exactly one slot for the whole process, not one per type. Each
//! implementing type only supplies its initializer; whichever type reaches
//! the slot first gets its initializer run, and everyone after that receives
//! the already-created instance.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

use crate::container::AppDependencies;

/// A type that can serve as the process-wide shared dependencies.
///
/// Implementors are usually application-specific structs that embed an
/// [`AppDependencies`] and add their own state. The base container itself
/// implements this trait, so it can be the shared instance too.
pub trait Dependencies: Any + Send + Sync {
    /// No-argument initializer, run at most once per process by
    /// [`shared_dependencies`](Self::shared_dependencies).
    ///
    /// Must not call `shared_dependencies` itself: the slot is mid-initialization.
    fn create() -> Self
    where
        Self: Sized;

    /// The embedded service container.
    fn app_dependencies(&self) -> &AppDependencies;

    /// Returns the shared instance, creating it as a `Self` if no type has
    /// asked for it yet.
    ///
    /// If another type got there first, that type's instance is returned
    /// unchanged; use [`SharedDependencies::downcast`] or [`shared`](Self::shared)
    /// to find out whether it is a `Self`.
    fn shared_dependencies() -> SharedDependencies
    where
        Self: Sized,
    {
        GLOBAL.get_or_init::<Self>()
    }

    /// Typed view of the shared instance. `None` when the instance was
    /// created through a different type.
    fn shared() -> Option<Arc<Self>>
    where
        Self: Sized,
    {
        Self::shared_dependencies().downcast::<Self>()
    }
}

static GLOBAL: SharedSlot = SharedSlot::new();

/// The shared instance if one has been created, without creating it.
#[must_use]
pub fn current_shared_dependencies() -> Option<SharedDependencies> {
    GLOBAL.get()
}

/// Handle to the shared instance.
///
/// Cloning is cheap and every clone points at the same object. Identity is
/// checked with [`ptr_eq`](Self::ptr_eq).
#[derive(Clone)]
pub struct SharedDependencies {
    inner: Arc<dyn Dependencies>,
    type_id: TypeId,
    type_name: &'static str,
}

impl SharedDependencies {
    /// Name of the concrete type the instance was created as.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub fn is<T: Dependencies>(&self) -> bool {
        self.type_id() == TypeId::of::<T>()
    }

    /// The instance as its concrete type, if it is a `T`.
    #[must_use]
    pub fn downcast<T: Dependencies>(&self) -> Option<Arc<T>> {
        let any: Arc<dyn Any + Send + Sync> = self.inner.clone();
        any.downcast::<T>().ok()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    #[must_use]
    pub fn dependencies(&self) -> &dyn Dependencies {
        &*self.inner
    }

    #[must_use]
    pub fn app(&self) -> &AppDependencies {
        self.inner.app_dependencies()
    }
}

impl Deref for SharedDependencies {
    type Target = dyn Dependencies;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl fmt::Debug for SharedDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedDependencies")
            .field("type_name", &self.type_name)
            .field("ptr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

/// A write-once slot holding one shared instance of any [`Dependencies`] type.
///
/// The process-wide accessor is backed by a single static `SharedSlot`;
/// separate slots exist so the first-caller-wins behaviour can be used (and
/// tested) in isolation.
pub struct SharedSlot {
    cell: OnceLock<SharedDependencies>,
}

impl SharedSlot {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Returns the instance in this slot, creating a `T` if the slot is empty.
    ///
    /// Concurrent first calls race on the slot; exactly one initializer runs
    /// and every caller gets the instance it produced.
    pub fn get_or_init<T: Dependencies>(&self) -> SharedDependencies {
        self.cell
            .get_or_init(|| {
                let instance = T::create();
                tracing::info!(
                    type_name = type_name::<T>(),
                    "Created shared dependencies"
                );
                SharedDependencies {
                    inner: Arc::new(instance),
                    type_id: TypeId::of::<T>(),
                    type_name: type_name::<T>(),
                }
            })
            .clone()
    }

    #[must_use]
    pub fn get(&self) -> Option<SharedDependencies> {
        self.cell.get().cloned()
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl Default for SharedSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SharedSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSlot")
            .field("instance", &self.cell.get())
            .finish()
    }
}
