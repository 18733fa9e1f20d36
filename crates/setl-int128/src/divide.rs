//! Division engine: magnitudes as 32-bit word arrays, most-significant
//! word first.
//!
//! Two paths: a single-limb sweep when the divisor fits in 32 bits, and a
//! normalised schoolbook division otherwise. Both run on unsigned
//! magnitudes; signs are fixed up afterwards (quotient negative iff operand
//! signs differ, remainder takes the dividend's sign). `MIN` negates onto
//! itself and its magnitude is still read correctly through the unsigned
//! limbs, so the unsigned paths cover it.

use crate::{Int128, Int128Error};

const WORD_MASK: u64 = 0xffff_ffff;

/// Signed division truncating toward zero. Returns `(quotient, remainder)`.
pub(crate) fn divrem(
    dividend: Int128,
    divisor: Int128,
) -> Result<(Int128, Int128), Int128Error> {
    let (v_words, v_len, divisor_negative) = fill_in_array(divisor);
    if v_len == 0 {
        return Err(Int128Error::DivisionByZero);
    }
    let (u_words, u_len, dividend_negative) = fill_in_array(dividend);

    if u_len < v_len {
        // |dividend| < |divisor|: quotient 0, remainder is the dividend.
        return Ok((Int128::ZERO, dividend));
    }

    if v_len == 1 {
        let (quotient, carry) = single_divide(&u_words[..u_len], v_words[0]);
        // The carry fits one word.
        let remainder = Int128::from_i64(carry as i64);
        return Ok(fix_division_signs(
            quotient,
            remainder,
            dividend_negative,
            divisor_negative,
        ));
    }

    let (quotient, remainder) = schoolbook_divide(&u_words[..u_len], &v_words[..v_len]);
    Ok(fix_division_signs(
        quotient,
        remainder,
        dividend_negative,
        divisor_negative,
    ))
}

/// Division by a small positive divisor, returning a signed remainder.
/// Infallible companion used by decimal printing and power-of-ten scaling.
pub(crate) fn divrem_small(dividend: Int128, divisor: u32) -> (Int128, i64) {
    let (u_words, u_len, negative) = fill_in_array(dividend);
    let (quotient, remainder) = single_divide(&u_words[..u_len], divisor);
    let quotient = if negative { quotient.negate() } else { quotient };
    let remainder = if negative {
        -(remainder as i64)
    } else {
        remainder as i64
    };
    (quotient, remainder)
}

/// Decompose a value into its unsigned magnitude as up to four 32-bit
/// words, most significant first, trimmed of leading zeros. Returns the
/// word array, the significant length, and whether the value was negative.
fn fill_in_array(value: Int128) -> ([u32; 4], usize, bool) {
    let negative = value.is_negative();
    let magnitude = if negative { value.negate() } else { value };
    // For MIN the negation wraps, but reading the high limb as unsigned
    // still yields the magnitude 2^127.
    let hi = magnitude.hi() as u64;
    let lo = magnitude.lo();
    let full = [
        (hi >> 32) as u32,
        hi as u32,
        (lo >> 32) as u32,
        lo as u32,
    ];
    let mut words = [0u32; 4];
    let mut len = 0;
    for &word in &full {
        if len == 0 && word == 0 {
            continue;
        }
        words[len] = word;
        len += 1;
    }
    (words, len, negative)
}

/// Reassemble a magnitude from up to four words, most significant first.
fn build_from_words(words: &[u32]) -> Int128 {
    let mut hi: u64 = 0;
    let mut lo: u64 = 0;
    for &word in words {
        hi = (hi << 32) | (lo >> 32);
        lo = (lo << 32) | word as u64;
    }
    Int128::from_pair(hi as i64, lo)
}

/// Long division by a 32-bit divisor: sweep from the most-significant word
/// down, forming a 64-bit partial (`carry << 32 | word`), emitting one
/// quotient word and carrying the partial's residue. The final carry is
/// the remainder.
fn single_divide(words: &[u32], divisor: u32) -> (Int128, u64) {
    let divisor = divisor as u64;
    let mut quotient = [0u32; 4];
    let mut carry: u64 = 0;
    for (i, &word) in words.iter().enumerate() {
        let partial = (carry << 32) | word as u64;
        quotient[i] = (partial / divisor) as u32;
        carry = partial % divisor;
    }
    (build_from_words(&quotient[..words.len()]), carry)
}

/// Index of the most-significant set bit of a word, 1-based; 0 for zero.
fn fls(word: u32) -> u32 {
    32 - word.leading_zeros()
}

/// The high word of `(hi:lo) << bits` for `bits < 32`.
#[inline]
fn shifted_word(hi: u32, lo: u32, bits: u32) -> u32 {
    let pair = ((hi as u64) << 32) | lo as u64;
    (pair.wrapping_shl(bits) >> 32) as u32
}

/// Logical right shift of a word array by `bits < 32`.
fn shift_words_right(words: &mut [u32], bits: u32) {
    if bits == 0 {
        return;
    }
    for i in (1..words.len()).rev() {
        words[i] = (words[i] >> bits) | (words[i - 1] << (32 - bits));
    }
    words[0] >>= bits;
}

/// Schoolbook division for divisors wider than one word.
///
/// Both operands are shifted left so the divisor's top set bit lands in
/// bit 31 of its leading word; quotient words are estimated from the top
/// two dividend words and corrected by trial subtraction until the partial
/// is non-negative and below the shifted divisor. The remainder is shifted
/// back right by the normalisation count.
fn schoolbook_divide(u: &[u32], v: &[u32]) -> (Int128, Int128) {
    let n = v.len();
    let m = u.len();
    let shift = 32 - fls(v[0]);

    // Normalised divisor.
    let mut vn = [0u32; 4];
    for i in 0..n {
        let next = if i + 1 < n { v[i + 1] } else { 0 };
        vn[i] = shifted_word(v[i], next, shift);
    }

    // Normalised dividend with one leading slack word for the shift
    // overflow: un[0] holds the bits shifted out of u[0].
    let mut un = [0u32; 5];
    un[0] = (((u[0] as u64) << shift) >> 32) as u32;
    for i in 0..m {
        let next = if i + 1 < m { u[i + 1] } else { 0 };
        un[i + 1] = shifted_word(u[i], next, shift);
    }

    let quotient_len = m - n + 1;
    let mut q_words = [0u32; 4];
    for j in 0..quotient_len {
        // Estimate the quotient word from the top two dividend words; the
        // two-word check below leaves the estimate at most one too large.
        let top2 = ((un[j] as u64) << 32) | un[j + 1] as u64;
        let mut qhat = top2 / vn[0] as u64;
        let mut rhat = top2 % vn[0] as u64;
        while qhat > WORD_MASK
            || qhat * vn[1] as u64 > ((rhat << 32) | un[j + 2] as u64)
        {
            qhat -= 1;
            rhat += vn[0] as u64;
            if rhat > WORD_MASK {
                break;
            }
        }

        // Multiply-and-subtract qhat * vn from the dividend window.
        let mut carry: u64 = 0;
        let mut borrow: i64 = 0;
        for k in (0..n).rev() {
            let product = qhat * vn[k] as u64 + carry;
            carry = product >> 32;
            let t = un[j + 1 + k] as i64 - (product & WORD_MASK) as i64 + borrow;
            un[j + 1 + k] = t as u32;
            borrow = t >> 32;
        }
        let t = un[j] as i64 - carry as i64 + borrow;
        un[j] = t as u32;

        if t < 0 {
            // Trial subtraction went negative: the estimate was one too
            // large, add the divisor back.
            qhat -= 1;
            let mut add_carry: u64 = 0;
            for k in (0..n).rev() {
                let sum = un[j + 1 + k] as u64 + vn[k] as u64 + add_carry;
                un[j + 1 + k] = sum as u32;
                add_carry = sum >> 32;
            }
            un[j] = (un[j] as u64 + add_carry) as u32;
        }

        q_words[j] = qhat as u32;
    }

    let remainder_words = &mut un[quotient_len..m + 1];
    shift_words_right(remainder_words, shift);
    (
        build_from_words(&q_words[..quotient_len]),
        build_from_words(remainder_words),
    )
}

/// Quotient is negated iff the operand signs differed; the remainder
/// takes the dividend's sign.
fn fix_division_signs(
    quotient: Int128,
    remainder: Int128,
    dividend_negative: bool,
    divisor_negative: bool,
) -> (Int128, Int128) {
    let quotient = if dividend_negative != divisor_negative {
        quotient.negate()
    } else {
        quotient
    };
    let remainder = if dividend_negative {
        remainder.negate()
    } else {
        remainder
    };
    (quotient, remainder)
}
