//! Named hash functions.
//!
//! The names are the ones twemproxy-style configurations use, so a ring
//! description written for an existing deployment selects the same function.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::partitioner::{crc, digest, fnv, hsieh, jenkins, murmur, one_at_a_time};

/// A key hash: pure, deterministic, 32 bits wide.
pub type HashFn = fn(&[u8]) -> u32;

/// Identifier of a registered hash function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashKind {
    OneAtATime,
    Md5,
    Crc16,
    Crc32,
    Crc32a,
    Fnv1_64,
    Fnv1a64,
    Fnv1_32,
    Fnv1a32,
    Hsieh,
    Murmur,
    Jenkins,
    Murmur3,
    Xxh3,
    SipHash,
}

const ALL: [HashKind; 15] = [
    HashKind::OneAtATime,
    HashKind::Md5,
    HashKind::Crc16,
    HashKind::Crc32,
    HashKind::Crc32a,
    HashKind::Fnv1_64,
    HashKind::Fnv1a64,
    HashKind::Fnv1_32,
    HashKind::Fnv1a32,
    HashKind::Hsieh,
    HashKind::Murmur,
    HashKind::Jenkins,
    HashKind::Murmur3,
    HashKind::Xxh3,
    HashKind::SipHash,
];

/// How the hash of a client was chosen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HashResolution {
    /// The requested name was found.
    Requested,
    /// No name was requested; the default was used.
    Defaulted,
    /// The requested name is unknown; the default was substituted.
    Fallback { requested: String },
}

impl HashKind {
    /// Hash used when none (or an unknown one) is requested.
    pub const DEFAULT: HashKind = HashKind::Murmur;

    /// Every registered hash, in registry order.
    pub fn all() -> impl Iterator<Item = HashKind> {
        ALL.into_iter()
    }

    /// Configuration name of this hash.
    pub fn name(self) -> &'static str {
        match self {
            HashKind::OneAtATime => "one_at_a_time",
            HashKind::Md5 => "md5",
            HashKind::Crc16 => "crc16",
            HashKind::Crc32 => "crc32",
            HashKind::Crc32a => "crc32a",
            HashKind::Fnv1_64 => "fnv1_64",
            HashKind::Fnv1a64 => "fnv1a_64",
            HashKind::Fnv1_32 => "fnv1_32",
            HashKind::Fnv1a32 => "fnv1a_32",
            HashKind::Hsieh => "hsieh",
            HashKind::Murmur => "murmur",
            HashKind::Jenkins => "jenkins",
            HashKind::Murmur3 => "murmur3",
            HashKind::Xxh3 => "xxh3",
            HashKind::SipHash => "siphash",
        }
    }

    /// The hash function itself.
    pub fn function(self) -> HashFn {
        match self {
            HashKind::OneAtATime => one_at_a_time::hash_one_at_a_time,
            HashKind::Md5 => digest::hash_md5,
            HashKind::Crc16 => crc::hash_crc16,
            HashKind::Crc32 => crc::hash_crc32,
            HashKind::Crc32a => crc::hash_crc32a,
            HashKind::Fnv1_64 => fnv::hash_fnv1_64,
            HashKind::Fnv1a64 => fnv::hash_fnv1a_64,
            HashKind::Fnv1_32 => fnv::hash_fnv1_32,
            HashKind::Fnv1a32 => fnv::hash_fnv1a_32,
            HashKind::Hsieh => hsieh::hash_hsieh,
            HashKind::Murmur => murmur::hash_murmur,
            HashKind::Jenkins => jenkins::hash_jenkins,
            HashKind::Murmur3 => murmur::hash_murmur3,
            HashKind::Xxh3 => digest::hash_xxh3,
            HashKind::SipHash => digest::hash_siphash,
        }
    }

    /// Hashes `key`.
    pub fn hash(self, key: &[u8]) -> u32 {
        (self.function())(key)
    }

    /// Looks a hash up by name.
    pub fn resolve(name: &str) -> Result<HashKind> {
        Self::all()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| Error::UnknownHash(name.to_owned()))
    }

    /// Looks a hash up by name, substituting [`HashKind::DEFAULT`] when the
    /// name is missing or unknown. The substitution is reported, never silent.
    pub fn resolve_or_default(name: Option<&str>) -> (HashKind, HashResolution) {
        match name {
            None => (Self::DEFAULT, HashResolution::Defaulted),
            Some(name) => match Self::resolve(name) {
                Ok(kind) => (kind, HashResolution::Requested),
                Err(_) => (
                    Self::DEFAULT,
                    HashResolution::Fallback {
                        requested: name.to_owned(),
                    },
                ),
            },
        }
    }
}

impl FromStr for HashKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        HashKind::resolve(s)
    }
}

impl fmt::Display for HashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
