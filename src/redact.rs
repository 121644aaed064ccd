/// PII redaction utilities for logging
///
/// Masks phone numbers and Twilio identifiers so logs stay useful for
/// correlating calls without leaking who was called or which account did it.

/// Redact a phone number, keeping only the last 4 digits visible.
/// Example: "+15551234567" -> "*******4567"
pub fn phone_number(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.len() <= 4 {
        // Too short to meaningfully redact
        return "*".repeat(digits.len());
    }

    let visible = &digits[digits.len() - 4..];
    format!("{}{}", "*".repeat(digits.len() - 4), visible)
}

/// Redact a Twilio sid (call or account), keeping the two-letter type prefix
/// and the last 4 characters.
/// Example: "CA0123456789abcdef0123456789abcdef" -> "CA…cdef"
pub fn sid(sid: &str) -> String {
    let chars: Vec<char> = sid.chars().collect();
    if chars.len() <= 6 {
        return "*".repeat(chars.len());
    }

    let prefix: String = chars[..2].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", prefix, suffix)
}



/// Kani formal verification proofs
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    fn any_digit_string<const N: usize>() -> String {
        let mut s = String::new();
        for _ in 0..N {
            let digit: u8 = kani::any();
            kani::assume(digit < 10);
            s.push((b'0' + digit) as char);
        }
        s
    }

    /// Proves: redacted prefix of an 11-digit number contains only asterisks
    #[kani::proof]
    #[kani::unwind(13)]
    fn phone_prefix_only_asterisks() {
        let input = any_digit_string::<11>();
        let result = phone_number(&input);
        for c in result.chars().take(7) {
            kani::assert(c == '*', "prefix must be all asterisks");
        }
    }
}
