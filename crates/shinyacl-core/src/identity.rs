//! # User Identifiers
//!
//! An identifier granted access to an application is either an e-mail
//! address (typically a Google account) or an 8-digit Harvard University ID.
//!
//! ## Validation
//!
//! Validation is purely syntactic. No directory lookup is performed.
//!
//! - E-mail: `local@domain`, one `@`. The local part is one or more of
//!   `[A-Za-z0-9_.+-]`. The domain is at least two non-empty dot-separated
//!   labels of `[A-Za-z0-9-]`.
//! - HUID: exactly 8 ASCII digits.

/// Number of digits in a numeric university ID.
pub const HUID_LEN: usize = 8;

/// Whether `identifier` is an acceptable ACL member.
pub fn is_valid(identifier: &str) -> bool {
    is_huid(identifier) || is_email(identifier)
}

fn is_huid(s: &str) -> bool {
    s.len() == HUID_LEN && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || !local.bytes().all(is_local_byte) {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels
            .iter()
            .all(|l| !l.is_empty() && l.bytes().all(is_label_byte))
}

fn is_local_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'+' | b'-')
}

fn is_label_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-'
}
