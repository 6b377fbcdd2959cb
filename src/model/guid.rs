//! IFC GlobalId generation (22-character compressed GUIDs).

use uuid::Uuid;

const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_$";

/// A fresh random GlobalId.
#[must_use]
pub fn new_global_id() -> String {
    compress(Uuid::new_v4().as_u128())
}

/// Encodes 128 bits as 22 base-64 digits, most significant first.
#[must_use]
pub fn compress(value: u128) -> String {
    (0..22)
        .map(|i| {
            let shift = 6 * (21 - i);
            char::from(ALPHABET[((value >> shift) & 0x3F) as usize])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compresses_known_values() {
        assert_eq!(compress(0), "0000000000000000000000");
        assert_eq!(compress(u128::MAX), "3$$$$$$$$$$$$$$$$$$$$$");
        assert_eq!(compress(64), "0000000000000000000010");
    }

    #[test]
    fn generated_ids_are_unique_and_well_formed() {
        let a = new_global_id();
        let b = new_global_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 22);
        assert!(a.bytes().all(|c| ALPHABET.contains(&c)));
    }
}
