//! Arithmetic unit.
//!
//! Pure functions returning `(result, carry_out)`. Flag bookkeeping is
//! left to the caller, which feeds the result through
//! [`Registers::write_accu`](crate::cpu::Registers::write_accu).

/// Full-adder carry out of bit 15, recovered from the operands and the sum.
#[inline]
pub fn carry(a: u16, b: u16, sum: u16) -> bool {
    ((a & b) | ((a | b) & !sum)) & 0x8000 != 0
}

/// Add two words, returning (sum, carry_out).
#[inline]
pub fn add(a: u16, b: u16) -> (u16, bool) {
    let sum = a.wrapping_add(b);
    (sum, carry(a, b, sum))
}

/// Subtract `b` from `a` as `a + !b + 1`, returning (difference, carry).
///
/// The carry is the inverted adder carry: `true` here means the adder did
/// not carry out, the opposite sense of [`add`]. Programs rely on this.
#[inline]
pub fn subtract(a: u16, b: u16) -> (u16, bool) {
    let nb = !b;
    let sum = a.wrapping_add(nb).wrapping_add(1);
    (sum, !carry(a, nb, sum))
}

/// Logical shift right by one. `carry_in` fills bit 15, bit 0 falls out.
#[inline]
pub fn shift_right(a: u16, carry_in: bool) -> (u16, bool) {
    ((a >> 1) | ((carry_in as u16) << 15), a & 1 != 0)
}
