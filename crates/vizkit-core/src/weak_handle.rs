//! Lifetime tracking for objects that other components observe without owning.
//!
//! An object that may be observed is wrapped in a [`Referrable`]. The wrapper
//! owns the object together with a private sentinel allocation and a
//! process-unique ID. Observers hold a [`WeakHandle`] (typed) or a
//! [`GenericWeakHandle`] (type-erased) which can report whether the object
//! still exists and, while it does, grant scoped access to it.
//!
//! Handles are never notified when their target goes away. Collections of
//! handles are pruned lazily with [`retain_valid`] by whoever iterates them,
//! which suits consumers that already poll once per frame.
//!
//! ```
//! use vizkit_core::weak_handle::Referrable;
//!
//! let object = Referrable::new(String::from("points"));
//! let handle = object.weak_handle();
//! assert!(handle.is_valid());
//! assert_eq!(handle.with(|s| s.len()).unwrap(), 6);
//!
//! let id = handle.unique_id();
//! drop(object);
//! assert!(!handle.is_valid());
//! assert_eq!(handle.unique_id(), id);
//! ```

use std::any::{type_name, Any};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::type_tag::TypeTag;

static NEXT_UNIQUE_ID: AtomicU64 = AtomicU64::new(1);

/// Hand out the next process-unique object ID. IDs increase monotonically and
/// are never reused within a process.
pub fn next_unique_id() -> u64 {
    NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Failures when resolving a weak handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeakHandleError {
    /// The target was destroyed. Treat as a logic error in the caller, which
    /// should have checked [`WeakHandle::is_valid`] or pruned its handles.
    #[error("bad weak access: {type_name} (id {id}) has been destroyed")]
    Expired { type_name: &'static str, id: u64 },

    /// A typed handle was requested for a type unrelated to the target.
    #[error("bad weak handle cast: requested {requested}, target is {actual}")]
    TypeMismatch {
        requested: &'static str,
        actual: &'static str,
    },

    /// The target is alive but currently mutably borrowed elsewhere.
    #[error("weak handle target {type_name} (id {id}) is already borrowed")]
    Borrowed { type_name: &'static str, id: u64 },
}

// ---------------------------------------------------------------------------
// Referrable
// ---------------------------------------------------------------------------

/// Owner of an object that can issue weak handles to it.
///
/// Dropping the `Referrable` destroys the object and invalidates every handle
/// issued against it.
pub struct Referrable<T: ?Sized + 'static> {
    target: Rc<RefCell<T>>,
    erased: Rc<dyn Any>,
    sentinel: Rc<()>,
    unique_id: u64,
    tag: TypeTag,
}

impl<T: 'static> Referrable<T> {
    pub fn new(value: T) -> Self {
        let target = Rc::new(RefCell::new(value));
        let erased: Rc<dyn Any> = target.clone();
        Self {
            target,
            erased,
            sentinel: Rc::new(()),
            unique_id: next_unique_id(),
            tag: TypeTag::of::<T>(),
        }
    }
}

impl<T: ?Sized + 'static> Referrable<T> {
    pub fn unique_id(&self) -> u64 {
        self.unique_id
    }

    /// Tag of the concrete type the object was created with, kept across
    /// [`into_dyn`](Self::into_dyn).
    pub fn type_tag(&self) -> TypeTag {
        self.tag
    }

    pub fn borrow(&self) -> Ref<'_, T> {
        self.target.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.target.borrow_mut()
    }

    /// Typed handle to the object.
    pub fn weak_handle(&self) -> WeakHandle<T> {
        WeakHandle {
            generic: self.generic_weak_handle(),
            target: Rc::downgrade(&self.target),
        }
    }

    /// Typed handle viewing the object through another (usually trait object)
    /// type. `cast` is normally an unsizing coercion such as
    /// `|rc| rc as Rc<RefCell<dyn Artist>>`; it must return the same
    /// allocation and must not retain the `Rc`.
    pub fn weak_handle_as<U: ?Sized + 'static>(
        &self,
        cast: impl FnOnce(Rc<RefCell<T>>) -> Rc<RefCell<U>>,
    ) -> WeakHandle<U> {
        let viewed = cast(Rc::clone(&self.target));
        debug_assert!(
            std::ptr::addr_eq(Rc::as_ptr(&viewed), Rc::as_ptr(&self.target)),
            "weak_handle_as: cast must return the owned allocation"
        );
        WeakHandle {
            generic: self.generic_weak_handle(),
            target: Rc::downgrade(&viewed),
        }
    }

    /// Type-erased handle. Use [`GenericWeakHandle::typed`] to recover a
    /// typed handle later.
    pub fn generic_weak_handle(&self) -> GenericWeakHandle {
        GenericWeakHandle {
            sentinel: Rc::downgrade(&self.sentinel),
            erased: Some(Rc::downgrade(&self.erased)),
            unique_id: self.unique_id,
            tag: self.tag,
        }
    }

    /// Re-type the owner, e.g. to store differently typed objects behind one
    /// trait object. ID, sentinel and concrete type tag are preserved, so
    /// previously issued handles stay valid.
    pub fn into_dyn<U: ?Sized + 'static>(
        self,
        cast: impl FnOnce(Rc<RefCell<T>>) -> Rc<RefCell<U>>,
    ) -> Referrable<U> {
        let Referrable {
            target,
            erased,
            sentinel,
            unique_id,
            tag,
        } = self;
        let owned = Rc::as_ptr(&target);
        let target = cast(target);
        debug_assert!(
            std::ptr::addr_eq(Rc::as_ptr(&target), owned),
            "into_dyn: cast must return the owned allocation"
        );
        Referrable {
            target,
            erased,
            sentinel,
            unique_id,
            tag,
        }
    }
}

impl<T: ?Sized + 'static> fmt::Debug for Referrable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Referrable")
            .field("type", &self.tag)
            .field("unique_id", &self.unique_id)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Type-erased weak handle. Reports liveness and identity only.
#[derive(Clone)]
pub struct GenericWeakHandle {
    sentinel: Weak<()>,
    erased: Option<Weak<dyn Any>>,
    unique_id: u64,
    tag: TypeTag,
}

impl Default for GenericWeakHandle {
    fn default() -> Self {
        Self {
            sentinel: Weak::new(),
            erased: None,
            unique_id: 0,
            tag: TypeTag::of::<()>(),
        }
    }
}

impl GenericWeakHandle {
    /// True while the target has not been destroyed.
    pub fn is_valid(&self) -> bool {
        self.sentinel.strong_count() > 0
    }

    /// Detach from the target. The handle becomes invalid but keeps its ID.
    pub fn reset(&mut self) {
        self.sentinel = Weak::new();
        self.erased = None;
    }

    /// ID of the target, stable after the target is destroyed.
    pub fn unique_id(&self) -> u64 {
        self.unique_id
    }

    pub fn type_tag(&self) -> TypeTag {
        self.tag
    }

    /// Recover a typed handle. Fails fast if `U` is not the concrete type the
    /// target was created with, whether or not the target is still alive.
    pub fn typed<U: 'static>(&self) -> Result<WeakHandle<U>, WeakHandleError> {
        let mismatch = || WeakHandleError::TypeMismatch {
            requested: type_name::<U>(),
            actual: self.tag.name(),
        };
        if self.tag != TypeTag::of::<U>() {
            return Err(mismatch());
        }

        let target = match self.erased.as_ref().and_then(Weak::upgrade) {
            Some(erased) if self.is_valid() => {
                let concrete = erased.downcast::<RefCell<U>>().map_err(|_| mismatch())?;
                Rc::downgrade(&concrete)
            }
            _ => Weak::new(),
        };

        Ok(WeakHandle {
            generic: self.clone(),
            target,
        })
    }

    fn expired(&self) -> WeakHandleError {
        WeakHandleError::Expired {
            type_name: self.tag.name(),
            id: self.unique_id,
        }
    }
}

impl fmt::Debug for GenericWeakHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericWeakHandle")
            .field("type", &self.tag)
            .field("unique_id", &self.unique_id)
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// Typed weak handle. Access the target through [`with`](Self::with) and
/// [`with_mut`](Self::with_mut), which fail with
/// [`WeakHandleError::Expired`] once the target is gone.
pub struct WeakHandle<T: ?Sized> {
    generic: GenericWeakHandle,
    target: Weak<RefCell<T>>,
}

impl<T: ?Sized> WeakHandle<T> {
    pub fn is_valid(&self) -> bool {
        self.generic.is_valid()
    }

    pub fn reset(&mut self) {
        self.generic.reset();
    }

    pub fn unique_id(&self) -> u64 {
        self.generic.unique_id()
    }

    pub fn generic(&self) -> &GenericWeakHandle {
        &self.generic
    }

    /// Run `f` with shared access to the target.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R, WeakHandleError> {
        let target = self.upgrade()?;
        let guard = target.try_borrow().map_err(|_| self.borrowed())?;
        let result = f(&*guard);
        Ok(result)
    }

    /// Run `f` with exclusive access to the target.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<R, WeakHandleError> {
        let target = self.upgrade()?;
        let mut guard = target.try_borrow_mut().map_err(|_| self.borrowed())?;
        let result = f(&mut *guard);
        Ok(result)
    }

    fn upgrade(&self) -> Result<Rc<RefCell<T>>, WeakHandleError> {
        if !self.is_valid() {
            return Err(self.generic.expired());
        }
        self.target.upgrade().ok_or_else(|| self.generic.expired())
    }

    fn borrowed(&self) -> WeakHandleError {
        WeakHandleError::Borrowed {
            type_name: self.generic.tag.name(),
            id: self.generic.unique_id,
        }
    }
}

impl<T: ?Sized> Clone for WeakHandle<T> {
    fn clone(&self) -> Self {
        Self {
            generic: self.generic.clone(),
            target: Weak::clone(&self.target),
        }
    }
}

impl<T: ?Sized> fmt::Debug for WeakHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakHandle")
            .field("type", &self.generic.tag)
            .field("unique_id", &self.generic.unique_id)
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// Drop every handle whose target has been destroyed.
pub fn retain_valid<T: ?Sized>(handles: &mut Vec<WeakHandle<T>>) {
    handles.retain(WeakHandle::is_valid);
}
