use std::fmt;
use xxhash_rust::const_xxh3::xxh3_64 as const_xxh3_64;

/// Tag shared by every pending call whose response uses the same body
/// contract.
///
/// The `id` is a compile-time xxh3 hash of the name, so kinds can be declared
/// as constants next to the method they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobKind {
    id: u64,
    name: &'static str,
}

impl JobKind {
    pub const fn new(name: &'static str) -> Self {
        Self {
            id: const_xxh3_64(name.as_bytes()),
            name,
        }
    }

    #[inline]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
