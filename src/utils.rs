use num_bigint::BigUint;
use num_traits::One;

/// All-ones mask of the given width: `2^width - 1`.
pub fn mask(width: u32) -> BigUint {
    (BigUint::one() << width) - BigUint::one()
}

/// `2^width`.
pub fn modulus(width: u32) -> BigUint {
    BigUint::one() << width
}

/// Largest unsigned value representable in `bits <= 64` bits.
pub fn max_u64(bits: u32) -> u64 {
    assert!(bits > 0 && bits <= 64, "Bits should be in the range 1..=64");
    if bits == 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Greatest common divisor, with `gcd(0, b) = b`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}
