//! Type-safe bit flags
//!
//! [`FlagSet`] stores flags in a plain integer, but carries a zero-sized
//! marker type so that flag sets meant for different purposes cannot be
//! mixed. Pin capabilities and pin configurations both use 32-bit flag
//! sets; because they have different tags, this does not compile:
//!
//! ```compile_fail
//! use pinforge_core::pin::{PinCapFlags, PinCfgFlags};
//!
//! let _ = PinCapFlags::INPUT | PinCfgFlags::DIR_INPUT;
//! ```
//!
//! Flag constants are built with the `const fn` constructors:
//!
//! ```
//! use pinforge_core::flags::FlagSet;
//!
//! enum Lamp {}
//! type LampFlags = FlagSet<Lamp, u8>;
//!
//! const RED: LampFlags = LampFlags::bit(0);
//! const GREEN: LampFlags = LampFlags::bit(1);
//! const BOTH: LampFlags = RED.union(GREEN);
//!
//! let mut lamps = LampFlags::zero();
//! lamps.set(RED);
//! assert!(lamps.test(RED));
//! assert!(!lamps.test(BOTH));
//! assert_eq!(BOTH.bits(), 0b11);
//! ```

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Not};

mod sealed {
    pub trait Sealed {}
}

/// Integer types usable as storage for a [`FlagSet`]
pub trait FlagWord:
    Copy
    + Eq
    + Hash
    + fmt::Binary
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + sealed::Sealed
{
    /// All bits clear
    const ZERO: Self;
    /// Width of the integer in bits
    const BITS: u32;
}

/// A set of bit flags tagged with a marker type
///
/// `T` is never instantiated; it only keeps flag sets with different
/// meanings apart at compile time. `W` is the storage integer.
pub struct FlagSet<T, W = u32> {
    bits: W,
    _tag: PhantomData<fn() -> T>,
}

macro_rules! impl_flag_word {
    ($($w:ty),*) => {
        $(
            impl sealed::Sealed for $w {}

            impl FlagWord for $w {
                const ZERO: Self = 0;
                const BITS: u32 = <$w>::BITS;
            }

            impl<T> FlagSet<T, $w> {
                /// Wrap a raw integer
                pub const fn from_bits(bits: $w) -> Self {
                    Self {
                        bits,
                        _tag: PhantomData,
                    }
                }

                /// The raw integer value
                pub const fn bits(self) -> $w {
                    self.bits
                }

                /// A set with only bit `n` set; zero if `n` is out of range
                pub const fn bit(n: u32) -> Self {
                    if n < <$w>::BITS {
                        Self::from_bits(1 << n)
                    } else {
                        Self::from_bits(0)
                    }
                }

                /// Union usable in constant expressions
                pub const fn union(self, other: Self) -> Self {
                    Self::from_bits(self.bits | other.bits)
                }
            }
        )*
    };
}

impl_flag_word!(u8, u16, u32, u64);

impl<T, W: FlagWord> FlagSet<T, W> {
    /// The empty set
    pub const ZERO: Self = Self {
        bits: W::ZERO,
        _tag: PhantomData,
    };

    const fn wrap(bits: W) -> Self {
        Self {
            bits,
            _tag: PhantomData,
        }
    }

    /// The empty set
    pub fn zero() -> Self {
        Self::ZERO
    }

    /// True if no bit is set
    pub fn is_zero(self) -> bool {
        self.bits == W::ZERO
    }

    /// Keep only the bits in `mask`
    #[must_use]
    pub fn mask(self, mask: Self) -> Self {
        Self::wrap(self.bits & mask.bits)
    }

    /// Copy with `flags` set
    #[must_use]
    pub fn with(self, flags: Self) -> Self {
        Self::wrap(self.bits | flags.bits)
    }

    /// Copy with `flags` cleared
    #[must_use]
    pub fn without(self, flags: Self) -> Self {
        Self::wrap(self.bits & !flags.bits)
    }

    /// Clear every bit
    pub fn clear(&mut self) {
        self.bits = W::ZERO;
    }

    /// Clear the bits in `flags`
    pub fn clear_flags(&mut self, flags: Self) {
        self.bits = self.bits & !flags.bits;
    }

    /// Set the bits in `flags`
    pub fn set(&mut self, flags: Self) {
        self.bits = self.bits | flags.bits;
    }

    /// Set or clear the bits in `flags`
    pub fn set_to(&mut self, flags: Self, on: bool) {
        if on {
            self.set(flags);
        } else {
            self.clear_flags(flags);
        }
    }

    /// Replace the bits selected by `mask` with those of `value`
    pub fn set_masked(&mut self, value: Self, mask: Self) {
        self.bits = (self.bits & !mask.bits) | (value.bits & mask.bits);
    }

    /// Invert the bits in `flags`
    pub fn toggle(&mut self, flags: Self) {
        self.bits = self.bits ^ flags.bits;
    }

    /// True if the bits selected by `mask` equal those of `value`
    pub fn test_masked(self, value: Self, mask: Self) -> bool {
        self.bits & mask.bits == value.bits & mask.bits
    }

    /// True if every bit of `flags` is set
    pub fn test(self, flags: Self) -> bool {
        self.bits & flags.bits == flags.bits
    }

    /// True if at least one bit of `flags` is set
    pub fn any(self, flags: Self) -> bool {
        self.bits & flags.bits != W::ZERO
    }
}

impl<T, W: Copy> Clone for FlagSet<T, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, W: Copy> Copy for FlagSet<T, W> {}

impl<T, W: PartialEq> PartialEq for FlagSet<T, W> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<T, W: Eq> Eq for FlagSet<T, W> {}

impl<T, W: Hash> Hash for FlagSet<T, W> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl<T, W: FlagWord> Default for FlagSet<T, W> {
    fn default() -> Self {
        Self::ZERO
    }
}

impl<T, W: FlagWord> fmt::Debug for FlagSet<T, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlagSet({:#b})", self.bits)
    }
}

impl<T, W: FlagWord> From<FlagSet<T, W>> for bool {
    fn from(flags: FlagSet<T, W>) -> bool {
        !flags.is_zero()
    }
}

impl<T, W: FlagWord> BitOr for FlagSet<T, W> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self::wrap(self.bits | rhs.bits)
    }
}

impl<T, W: FlagWord> BitAnd for FlagSet<T, W> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self::wrap(self.bits & rhs.bits)
    }
}

impl<T, W: FlagWord> BitXor for FlagSet<T, W> {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        Self::wrap(self.bits ^ rhs.bits)
    }
}

impl<T, W: FlagWord> Not for FlagSet<T, W> {
    type Output = Self;

    fn not(self) -> Self {
        Self::wrap(!self.bits)
    }
}

impl<T, W: FlagWord> BitOrAssign for FlagSet<T, W> {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits = self.bits | rhs.bits;
    }
}

impl<T, W: FlagWord> BitAndAssign for FlagSet<T, W> {
    fn bitand_assign(&mut self, rhs: Self) {
        self.bits = self.bits & rhs.bits;
    }
}

impl<T, W: FlagWord> BitXorAssign for FlagSet<T, W> {
    fn bitxor_assign(&mut self, rhs: Self) {
        self.bits = self.bits ^ rhs.bits;
    }
}
