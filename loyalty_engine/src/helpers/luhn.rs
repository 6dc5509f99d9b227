/// Returns true if `number` is a non-empty string of ASCII digits that passes the Luhn checksum.
pub fn is_valid_luhn(number: &str) -> bool {
    if number.is_empty() {
        return false;
    }
    let mut sum = 0u32;
    for (i, ch) in number.bytes().rev().enumerate() {
        if !ch.is_ascii_digit() {
            return false;
        }
        let mut digit = u32::from(ch - b'0');
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum += digit;
    }
    sum % 10 == 0
}
