use std::io;

/// Errors surfaced by this crate.
///
/// Most operations on [`crate::ZFastTrie`] cannot fail: `add` returns
/// `bool`, queries return `Option`. This enum exists for the handful of
/// operations that genuinely can fail: serialization I/O, malformed
/// serialized input, and operations this data structure deliberately
/// doesn't implement (deletion, iteration).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The key handed to `add`/`contains`/... was not prefix-free with
    /// respect to the already-inserted set.
    #[error("inserted key is not prefix-free with respect to the existing set")]
    KeyNotPrefixFree,

    /// `remove`, iteration, and sorted-set views are not implemented.
    #[error("operation not supported by this data structure: {0}")]
    UnsupportedOperation(&'static str),

    /// Propagated I/O failure while reading or writing a serialized trie.
    #[error("I/O error during (de)serialization: {0}")]
    Io(#[from] io::Error),

    /// The serialized stream ended before the framed node count was reached.
    #[error("serialized trie is truncated")]
    Truncated,

    /// The serialized stream's framing (size, flag bytes) is inconsistent.
    #[error("serialized trie has corrupt framing")]
    CorruptFraming,

    /// A GF(2) linear system has no solution. The solvers in [`crate::gf2`]
    /// themselves return `bool`; this variant exists for callers that want
    /// a `Result`-shaped API instead, such as [`crate::gf2::solve`].
    #[error("GF(2) linear system is infeasible")]
    Infeasible,
}

/// Convenience alias used throughout the crate's fallible APIs.
pub type Result<T> = std::result::Result<T, Error>;
