//! Argument vector construction
//!
//! The transport takes a command as two parallel slices: the argument bytes
//! and their lengths. Up to [`FAST_PATH_ARGS`] arguments are laid out in
//! fixed inline storage; longer commands get heap storage sized exactly to
//! the argument count. Either way the storage lives only as long as the
//! `ArgVector`, and is released when it goes out of scope on every path.

use super::args::CommandArgs;

/// Largest argument count that avoids a heap allocation
pub const FAST_PATH_ARGS: usize = 8;

/// Parallel pointer/length arrays for one command
#[derive(Debug)]
pub enum ArgVector<'a> {
    /// Fixed-capacity storage for short commands
    Inline {
        /// Argument bytes; only the first `len` entries are meaningful
        argv: [&'a [u8]; FAST_PATH_ARGS],
        /// Argument lengths; only the first `len` entries are meaningful
        argl: [usize; FAST_PATH_ARGS],
        /// Number of arguments
        len: usize,
    },
    /// Heap storage for long commands
    Heap {
        /// Argument bytes
        argv: Vec<&'a [u8]>,
        /// Argument lengths
        argl: Vec<usize>,
    },
}

impl<'a> ArgVector<'a> {
    /// Lay out the arguments of `args`
    pub fn new(args: &'a CommandArgs) -> Self {
        Self::from_slices(args.iter().map(|a| &a[..]), args.len())
    }

    /// Lay out `count` arguments from an iterator of byte slices
    pub fn from_slices<I>(iter: I, count: usize) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        if count <= FAST_PATH_ARGS {
            let empty: &'a [u8] = &[];
            let mut argv = [empty; FAST_PATH_ARGS];
            let mut argl = [0usize; FAST_PATH_ARGS];
            let mut len = 0;
            for arg in iter.into_iter().take(FAST_PATH_ARGS) {
                argv[len] = arg;
                argl[len] = arg.len();
                len += 1;
            }
            ArgVector::Inline { argv, argl, len }
        } else {
            let mut argv = Vec::with_capacity(count);
            let mut argl = Vec::with_capacity(count);
            for arg in iter {
                argv.push(arg);
                argl.push(arg.len());
            }
            ArgVector::Heap { argv, argl }
        }
    }

    /// The argument and length slices, one entry per argument
    pub fn as_parts(&self) -> (&[&'a [u8]], &[usize]) {
        match self {
            ArgVector::Inline { argv, argl, len } => (&argv[..*len], &argl[..*len]),
            ArgVector::Heap { argv, argl } => (argv.as_slice(), argl.as_slice()),
        }
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        match self {
            ArgVector::Inline { len, .. } => *len,
            ArgVector::Heap { argv, .. } => argv.len(),
        }
    }

    /// Check if there are no arguments
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check if the fixed inline storage is in use
    pub fn is_inline(&self) -> bool {
        matches!(self, ArgVector::Inline { .. })
    }
}
