use crate::error::ContainerErrors;
use derivative::Derivative;
use std::any::{Any, TypeId};

/// An owned, type erased value
///
/// # Access
/// The concrete type is never assumed. Every access goes through a checked downcast, a mismatch
/// returns [`None`] (or [`ContainerErrors::TypeMismatch`]) instead of reinterpreting the bytes.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ErasedBox {
    type_id: TypeId,
    type_name: &'static str,
    #[derivative(Debug = "ignore")]
    inner: Box<dyn Any + Send + Sync>,
}

impl ErasedBox {
    pub fn new<T: Any + Send + Sync>(element: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            inner: Box::new(element),
        }
    }

    /// Check if the erased value is of type `T`
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Name of the concrete type, only meant for diagnostics
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.inner.downcast_mut::<T>()
    }

    /// Same as [`Self::downcast_ref`], but reports which types disagreed
    pub fn try_downcast_ref<T: 'static>(&self) -> Result<&T, ContainerErrors> {
        let found = self.type_name;
        self.inner
            .downcast_ref::<T>()
            .ok_or(ContainerErrors::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found,
            })
    }

    /// Take the value back out, on a mismatch the box is handed back untouched
    pub fn downcast<T: 'static>(self) -> Result<Box<T>, Self> {
        if !self.is::<T>() {
            return Err(self);
        }
        let Self {
            type_id,
            type_name,
            inner,
        } = self;
        inner.downcast::<T>().map_err(|inner| Self {
            type_id,
            type_name,
            inner,
        })
    }

    pub fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self.inner.as_ref()
    }
}
