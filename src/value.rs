//! Capturable values: identity, origin tagging, and document rendering
//!
//! The host language exposes no frame or module reflection, so every type
//! that can appear in a snapshot carries its own metadata through the
//! [`Capturable`] trait: an origin-module label (derived from the type path
//! or tagged explicitly), an abstract size, a value kind, and a
//! structure-preserving document form. Built-in text, numeric, and
//! collection types are implemented here; library and application types opt
//! in with [`crate::capture_type!`].
//!
//! Sizes are shallow estimates: container header plus element footprint,
//! in bytes.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Document form of a captured value: an arbitrarily nested value tree
pub type Document = serde_json::Value;

/// Failure to render a value into its document form
pub type DocumentError = serde_json::Error;

/// Render any serializable value into its document form
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, DocumentError> {
    serde_json::to_value(value)
}

/// Identity of a value, independent of its contents
///
/// Two bindings are the same value exactly when they refer to the same
/// address. Identities are captured at binding/track time and are only
/// meaningful while the referent stays in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueId(usize);

impl ValueId {
    /// Identity of the value behind `reference`
    pub fn of<T: ?Sized>(reference: &T) -> Self {
        Self((reference as *const T).cast::<()>() as usize)
    }

    /// Raw address bits, for identity-set storage
    pub(crate) fn bits(self) -> usize {
        self.0
    }
}

/// Coarse classification of a value's shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Text,
    Integer,
    Float,
    Sequence,
    Mapping,
    Set,
    Other,
}

impl ValueKind {
    /// Kinds admitted by the built-in-module carve-out of the capture policy
    pub fn is_recognized(self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// A value the engine knows how to inspect and persist
pub trait Capturable {
    /// Full type path, for downstream interpretation of the snapshot
    fn type_label(&self) -> &'static str;

    /// Module that declares this value's type, or `None` when the origin
    /// cannot be resolved (such values are never captured by policy)
    fn origin_module(&self) -> Option<&'static str>;

    /// Abstract size in bytes; total, never panics
    fn approx_size(&self) -> usize;

    fn kind(&self) -> ValueKind;

    /// Render the value into its document form
    fn capture(&self) -> Result<Document, DocumentError>;
}

/// Module path of a full type path, with generic arguments ignored
///
/// `alloc::vec::Vec<other::Thing>` resolves to `alloc::vec`; a bare path
/// like `i64` has no declaring module and resolves to `None`.
pub fn origin_of(type_path: &'static str) -> Option<&'static str> {
    let base = type_path.split('<').next().unwrap_or(type_path);
    let idx = base.rfind("::")?;
    Some(&type_path[..idx])
}

/// True if `origin` belongs to the language's own core library
pub fn is_builtin_origin(origin: &str) -> bool {
    matches!(origin.split("::").next(), Some("core" | "alloc" | "std"))
}

/// The persisted form of one captured value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapturedValue {
    /// Full type path at capture time
    pub type_name: String,
    /// Origin-module label, when resolvable
    pub origin: Option<String>,
    /// Reported abstract size in bytes
    pub size_bytes: u64,
    /// Structure-preserving document form
    pub data: Document,
}

/// Render `value` into its persisted form
///
/// The only failure mode is document rendering; metadata accessors are
/// total.
pub fn capture_value(name: &str, value: &dyn Capturable) -> crate::error::Result<CapturedValue> {
    let data = value.capture().map_err(|source| crate::error::Error::ValueEncode {
        name: name.to_string(),
        source,
    })?;
    Ok(CapturedValue {
        type_name: value.type_label().to_string(),
        origin: value.origin_module().map(str::to_string),
        size_bytes: value.approx_size() as u64,
        data,
    })
}

/// Implement [`Capturable`] for a serializable type
///
/// The origin-module label defaults to the type's own module path; pass
/// `origin = "..."` to tag re-exported or wrapper types with the library
/// prefix they should match under. `size = |v| ...` overrides the shallow
/// `size_of_val` default for types whose footprint lives behind a pointer.
///
/// ```
/// use recuerdo::capture_type;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Histogram {
///     buckets: Vec<u64>,
/// }
///
/// capture_type!(Histogram, kind = Sequence, size = |h: &Histogram| {
///     std::mem::size_of::<Histogram>() + h.buckets.capacity() * 8
/// });
/// ```
#[macro_export]
macro_rules! capture_type {
    ($ty:ty, kind = $kind:ident) => {
        $crate::capture_type!(@impl $ty,
            $crate::value::origin_of(::core::any::type_name::<$ty>()),
            $kind,
            |v: &$ty| ::core::mem::size_of_val(v));
    };
    ($ty:ty, kind = $kind:ident, size = $size:expr) => {
        $crate::capture_type!(@impl $ty,
            $crate::value::origin_of(::core::any::type_name::<$ty>()),
            $kind,
            $size);
    };
    ($ty:ty, origin = $origin:literal, kind = $kind:ident) => {
        $crate::capture_type!(@impl $ty,
            ::core::option::Option::Some($origin),
            $kind,
            |v: &$ty| ::core::mem::size_of_val(v));
    };
    ($ty:ty, origin = $origin:literal, kind = $kind:ident, size = $size:expr) => {
        $crate::capture_type!(@impl $ty, ::core::option::Option::Some($origin), $kind, $size);
    };
    (@impl $ty:ty, $origin:expr, $kind:ident, $size:expr) => {
        impl $crate::value::Capturable for $ty {
            fn type_label(&self) -> &'static str {
                ::core::any::type_name::<$ty>()
            }

            fn origin_module(&self) -> ::core::option::Option<&'static str> {
                $origin
            }

            fn approx_size(&self) -> usize {
                ($size)(self)
            }

            fn kind(&self) -> $crate::value::ValueKind {
                $crate::value::ValueKind::$kind
            }

            fn capture(
                &self,
            ) -> ::core::result::Result<$crate::value::Document, $crate::value::DocumentError>
            {
                $crate::value::to_document(self)
            }
        }
    };
}

macro_rules! impl_primitive {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Capturable for $ty {
                fn type_label(&self) -> &'static str {
                    ::core::any::type_name::<$ty>()
                }

                fn origin_module(&self) -> Option<&'static str> {
                    Some("core::primitive")
                }

                fn approx_size(&self) -> usize {
                    ::core::mem::size_of::<$ty>()
                }

                fn kind(&self) -> ValueKind {
                    ValueKind::$kind
                }

                fn capture(&self) -> Result<Document, DocumentError> {
                    to_document(self)
                }
            }
        )*
    };
}

impl_primitive!(
    i8 => Integer, i16 => Integer, i32 => Integer, i64 => Integer, isize => Integer,
    u8 => Integer, u16 => Integer, u32 => Integer, u64 => Integer, usize => Integer,
    f32 => Float, f64 => Float,
    bool => Other,
);

impl Capturable for String {
    fn type_label(&self) -> &'static str {
        "alloc::string::String"
    }

    fn origin_module(&self) -> Option<&'static str> {
        Some("alloc::string")
    }

    fn approx_size(&self) -> usize {
        std::mem::size_of::<String>() + self.capacity()
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn capture(&self) -> Result<Document, DocumentError> {
        to_document(self)
    }
}

impl Capturable for &str {
    fn type_label(&self) -> &'static str {
        "core::str"
    }

    fn origin_module(&self) -> Option<&'static str> {
        Some("core::str")
    }

    fn approx_size(&self) -> usize {
        std::mem::size_of::<&str>() + self.len()
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Text
    }

    fn capture(&self) -> Result<Document, DocumentError> {
        to_document(self)
    }
}

impl<T: Serialize> Capturable for Vec<T> {
    fn type_label(&self) -> &'static str {
        std::any::type_name::<Vec<T>>()
    }

    fn origin_module(&self) -> Option<&'static str> {
        Some("alloc::vec")
    }

    fn approx_size(&self) -> usize {
        std::mem::size_of::<Vec<T>>() + self.capacity() * std::mem::size_of::<T>()
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Sequence
    }

    fn capture(&self) -> Result<Document, DocumentError> {
        to_document(self)
    }
}

impl<V: Serialize> Capturable for HashMap<String, V> {
    fn type_label(&self) -> &'static str {
        std::any::type_name::<HashMap<String, V>>()
    }

    fn origin_module(&self) -> Option<&'static str> {
        Some("std::collections")
    }

    fn approx_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.len() * std::mem::size_of::<(String, V)>()
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Mapping
    }

    fn capture(&self) -> Result<Document, DocumentError> {
        to_document(self)
    }
}

impl<V: Serialize> Capturable for BTreeMap<String, V> {
    fn type_label(&self) -> &'static str {
        std::any::type_name::<BTreeMap<String, V>>()
    }

    fn origin_module(&self) -> Option<&'static str> {
        Some("alloc::collections")
    }

    fn approx_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.len() * std::mem::size_of::<(String, V)>()
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Mapping
    }

    fn capture(&self) -> Result<Document, DocumentError> {
        to_document(self)
    }
}

impl<T: Serialize + Eq + std::hash::Hash> Capturable for HashSet<T> {
    fn type_label(&self) -> &'static str {
        std::any::type_name::<HashSet<T>>()
    }

    fn origin_module(&self) -> Option<&'static str> {
        Some("std::collections")
    }

    fn approx_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.len() * std::mem::size_of::<T>()
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Set
    }

    fn capture(&self) -> Result<Document, DocumentError> {
        to_document(self)
    }
}

impl<T: Serialize + Ord> Capturable for BTreeSet<T> {
    fn type_label(&self) -> &'static str {
        std::any::type_name::<BTreeSet<T>>()
    }

    fn origin_module(&self) -> Option<&'static str> {
        Some("alloc::collections")
    }

    fn approx_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.len() * std::mem::size_of::<T>()
    }

    fn kind(&self) -> ValueKind {
        ValueKind::Set
    }

    fn capture(&self) -> Result<Document, DocumentError> {
        to_document(self)
    }
}
