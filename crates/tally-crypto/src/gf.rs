//! GF(2^8) arithmetic over the AES polynomial x^8 + x^4 + x^3 + x + 1.

/// Reduction constant applied when the high bit shifts out (0x11B without x^8).
const REDUCTION: u8 = 0x1b;

/// Multiply two field elements.
///
/// Shift-and-add over eight iterations; `a` is doubled each step and reduced
/// whenever its top bit overflows.
#[must_use]
pub fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    for _ in 0..8 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80;
        a <<= 1;
        if carry != 0 {
            a ^= REDUCTION;
        }
        b >>= 1;
    }
    product
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gmul_identity_and_zero() {
        for x in 0..=255u8 {
            assert_eq!(gmul(x, 1), x);
            assert_eq!(gmul(1, x), x);
            assert_eq!(gmul(x, 0), 0);
        }
    }

    #[test]
    fn test_gmul_fips197_examples() {
        // FIPS-197 section 4.2: {57} . {83} = {c1}
        assert_eq!(gmul(0x57, 0x83), 0xc1);
        // Section 4.2.1: {57} . {13} = {fe}
        assert_eq!(gmul(0x57, 0x13), 0xfe);
        assert_eq!(gmul(0x57, 0x02), 0xae);
        assert_eq!(gmul(0x57, 0x04), 0x47);
    }

    #[test]
    fn test_gmul_commutative() {
        for a in (0..=255u8).step_by(7) {
            for b in (0..=255u8).step_by(11) {
                assert_eq!(gmul(a, b), gmul(b, a));
            }
        }
    }

    #[test]
    fn test_inverse_mix_constants_undo_forward() {
        // Row 0 of InvMixColumns times column 0 of MixColumns = 1
        let v = gmul(0x0e, 0x02) ^ gmul(0x0b, 0x01) ^ gmul(0x0d, 0x01) ^ gmul(0x09, 0x03);
        assert_eq!(v, 0x01);
    }
}
