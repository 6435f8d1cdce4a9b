//! Error taxonomy: programmer misuse vs. propagated descriptor failures.
//!
//! Debug builds return these from the reconciler instead of panicking so the
//! failure kind can be asserted on in tests; release builds skip the checks
//! that produce them (see the module docs on [`crate::reconciler`]).

use std::fmt;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The same `VNode` was passed to `create`/`sync`/`mount` more than once.
    #[error("vnode reused across renders")]
    VNodeReused,

    /// Some siblings declared a key and others did not.
    #[error("sibling list mixes keyed and unkeyed children")]
    MixedKeyedSiblings,

    /// `trackByKey` was set but a child had no key.
    #[error("child diffed under trackByKey has no key")]
    MissingKey,

    /// Static-shape attribute/property/style sync saw a key present on one
    /// side only.
    #[error("static shape sync saw mismatched key sets (old only: {old_only:?}, new only: {new_only:?})")]
    StaticShapeMismatch {
        old_only: Vec<String>,
        new_only: Vec<String>,
    },

    /// An attribute name carried the namespace sentinel (`$`) but did not
    /// match any entry in the fixed XLINK/XML table.
    #[error("unknown namespaced attribute `{0}`")]
    UnknownNamespacedAttribute(String),

    /// `mount` was called against DOM that did not have the shape the
    /// virtual tree expected.
    #[error("mount target does not match expected vnode shape: {0}")]
    MountShapeMismatch(String),

    /// A component was disposed twice.
    #[error("component disposed twice")]
    DoubleDispose,

    /// A subscription was canceled twice.
    #[error("subscription canceled twice")]
    DoubleCancel,

    /// A component was rendered/synced after it was disposed.
    #[error("operation attempted on a disposed component")]
    ComponentDisposed,

    /// A descriptor callback (`update`, `init`, ...) returned an error.
    #[error("component descriptor callback failed: {0}")]
    Descriptor(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    pub fn descriptor<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Descriptor(Box::new(err))
    }

    pub fn descriptor_msg(msg: impl fmt::Display) -> Self {
        #[derive(Debug)]
        struct Msg(String);
        impl fmt::Display for Msg {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
        impl std::error::Error for Msg {}
        Error::Descriptor(Box::new(Msg(msg.to_string())))
    }
}

/// Panics in debug builds, is a no-op in release builds. For invariants
/// that would otherwise corrupt arena state if execution continued, but
/// that the surrounding function has no cheap way to turn into a `Result`.
#[macro_export]
macro_rules! debug_invariant {
    ($cond:expr, $($arg:tt)*) => {
        debug_assert!($cond, $($arg)*);
    };
}
