//! Key hashing for shard assignment.
//!
//! Every key type carries its own 32-bit hash through [`ShardHash`]. The
//! implementation is chosen at compile time, so a key always lands in the same
//! shard for the lifetime of a map. Hashes are not meant to resist adversarial
//! input.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

/// Hash returned for every NaN, whatever its payload.
pub const NAN_HASH: u32 = 0x7FFF_FFFF;

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

/// A key that can be routed to a shard.
///
/// Equal keys must produce equal hashes.
pub trait ShardHash {
    /// Compute the 32-bit shard hash of this key.
    fn shard_hash(&self) -> u32;
}

/// Avalanche mixer for values up to 32 bits wide.
#[inline]
pub fn mix32(mut x: u32) -> u32 {
    x = ((x >> 16) ^ x).wrapping_mul(0x045d_9f3b);
    x = ((x >> 16) ^ x).wrapping_mul(0x045d_9f3b);
    (x >> 16) ^ x
}

/// SplitMix64 finalizer truncated to 32 bits.
#[inline]
pub fn mix64(mut x: u64) -> u32 {
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    (x ^ (x >> 31)) as u32
}

/// 32-bit FNV-1 over raw bytes.
#[inline]
pub fn fnv1_32(bytes: &[u8]) -> u32 {
    let mut hasher = Fnv1::new();
    hasher.write(bytes);
    hasher.0
}

/// Hash the canonical text form of any `Display` value.
///
/// This is the fallback for key types without a dedicated implementation. It
/// streams the formatted text into the hasher and never fails.
pub fn display_hash<T: fmt::Display + ?Sized>(value: &T) -> u32 {
    let mut hasher = Fnv1::new();
    // Fnv1::write_str never errors; a misbehaving Display impl just ends the stream early.
    let _ = fmt::write(&mut hasher, format_args!("{}", value));
    hasher.0
}

struct Fnv1(u32);

impl Fnv1 {
    #[inline]
    fn new() -> Self {
        Fnv1(FNV32_OFFSET_BASIS)
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.0 = self.0.wrapping_mul(FNV32_PRIME) ^ u32::from(byte);
        }
    }
}

impl fmt::Write for Fnv1 {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s.as_bytes());
        Ok(())
    }
}

/// Implement [`ShardHash`] for `Display` types by hashing their text form.
///
/// ```rust
/// use shardstore::hash::{display_hash, ShardHash};
/// use std::fmt;
///
/// #[derive(PartialEq, Eq, Hash)]
/// struct UserId(u32, u32);
///
/// impl fmt::Display for UserId {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "{}-{}", self.0, self.1)
///     }
/// }
///
/// shardstore::impl_shard_hash_via_display!(UserId);
///
/// assert_eq!(UserId(1, 2).shard_hash(), display_hash("1-2"));
/// ```
#[macro_export]
macro_rules! impl_shard_hash_via_display {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::hash::ShardHash for $ty {
                #[inline]
                fn shard_hash(&self) -> u32 {
                    $crate::hash::display_hash(self)
                }
            }
        )+
    };
}

macro_rules! impl_narrow_int {
    ($($ty:ty),+) => {
        $(
            impl ShardHash for $ty {
                #[inline]
                fn shard_hash(&self) -> u32 {
                    mix32(*self as u32)
                }
            }
        )+
    };
}

macro_rules! impl_wide_int {
    ($($ty:ty),+) => {
        $(
            impl ShardHash for $ty {
                #[inline]
                fn shard_hash(&self) -> u32 {
                    mix64(*self as u64)
                }
            }
        )+
    };
}

impl_narrow_int!(i8, i16, i32, u8, u16, u32);
impl_wide_int!(i64, u64, isize, usize);

impl ShardHash for u128 {
    #[inline]
    fn shard_hash(&self) -> u32 {
        mix64((*self as u64) ^ ((*self >> 64) as u64))
    }
}

impl ShardHash for i128 {
    #[inline]
    fn shard_hash(&self) -> u32 {
        (*self as u128).shard_hash()
    }
}

impl ShardHash for f32 {
    fn shard_hash(&self) -> u32 {
        if self.is_nan() {
            NAN_HASH
        } else if *self == 0.0 {
            // 0.0 and -0.0 compare equal
            0
        } else {
            mix32(self.to_bits())
        }
    }
}

impl ShardHash for f64 {
    fn shard_hash(&self) -> u32 {
        if self.is_nan() {
            NAN_HASH
        } else if *self == 0.0 {
            0
        } else {
            mix64(self.to_bits())
        }
    }
}

impl ShardHash for str {
    #[inline]
    fn shard_hash(&self) -> u32 {
        fnv1_32(self.as_bytes())
    }
}

impl ShardHash for String {
    #[inline]
    fn shard_hash(&self) -> u32 {
        fnv1_32(self.as_bytes())
    }
}

impl ShardHash for Cow<'_, str> {
    #[inline]
    fn shard_hash(&self) -> u32 {
        fnv1_32(self.as_bytes())
    }
}

impl ShardHash for [u8] {
    #[inline]
    fn shard_hash(&self) -> u32 {
        fnv1_32(self)
    }
}

impl ShardHash for Vec<u8> {
    #[inline]
    fn shard_hash(&self) -> u32 {
        fnv1_32(self)
    }
}

impl<T: ShardHash + ?Sized> ShardHash for &T {
    #[inline]
    fn shard_hash(&self) -> u32 {
        (**self).shard_hash()
    }
}

impl<T: ShardHash + ?Sized> ShardHash for Box<T> {
    #[inline]
    fn shard_hash(&self) -> u32 {
        (**self).shard_hash()
    }
}

impl<T: ShardHash + ?Sized> ShardHash for Arc<T> {
    #[inline]
    fn shard_hash(&self) -> u32 {
        (**self).shard_hash()
    }
}

impl<T: ShardHash + ?Sized> ShardHash for Rc<T> {
    #[inline]
    fn shard_hash(&self) -> u32 {
        (**self).shard_hash()
    }
}

impl_shard_hash_via_display!(bool, char);
