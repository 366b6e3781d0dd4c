//! EVM address and transaction hash helpers.
//!
//! Only the textual shape is checked (`0x` prefix, hex digits, length). EIP-55
//! checksums are not enforced because registry tables mix checksummed and
//! lowercase addresses.
use crate::error::ExchangeError;
use crate::result::Result;

/// Hex digits in a 20-byte address.
const ADDRESS_HEX_LEN: usize = 40;
/// Hex digits in a 32-byte transaction hash.
const TX_HASH_HEX_LEN: usize = 64;

fn is_prefixed_hex(value: &str, len: usize) -> bool {
    value
        .strip_prefix("0x")
        .map(|hex| hex.len() == len && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

/// Returns `true` if `value` looks like a 20-byte EVM address.
pub fn is_evm_address(value: &str) -> bool {
    is_prefixed_hex(value, ADDRESS_HEX_LEN)
}

/// Returns `true` if `value` looks like a 32-byte transaction hash.
pub fn is_tx_hash(value: &str) -> bool {
    is_prefixed_hex(value, TX_HASH_HEX_LEN)
}

/// Validate an address, returning `ExchangeError::InvalidAddress` when malformed.
pub fn ensure_evm_address(value: &str) -> Result<()> {
    if is_evm_address(value) {
        Ok(())
    } else {
        Err(ExchangeError::InvalidAddress(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_checksummed_and_lowercase_addresses() {
        assert!(is_evm_address("0xB537A89b71F34985433d3A3E17A0824F1e30FD17"));
        assert!(is_evm_address("0x4200000000000000000000000000000000000006"));
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(!is_evm_address("B537A89b71F34985433d3A3E17A0824F1e30FD17"));
        assert!(!is_evm_address("0xB537A89b71F34985433d3A3E17A0824F1e30FD1"));
        assert!(!is_evm_address("0xZZ37A89b71F34985433d3A3E17A0824F1e30FD17"));
        assert!(ensure_evm_address("").is_err());
    }

    #[test]
    fn prefix_must_be_lowercase() {
        assert!(!is_evm_address("0XB537A89b71F34985433d3A3E17A0824F1e30FD17"));
        assert!(!is_tx_hash(&format!("0X{}", "ab".repeat(32))));
        assert!(matches!(
            ensure_evm_address("0X4200000000000000000000000000000000000006"),
            Err(ExchangeError::InvalidAddress(_))
        ));
    }

    #[test]
    fn tx_hash_needs_64_hex_digits() {
        let hash = format!("0x{}", "ab".repeat(32));
        assert!(is_tx_hash(&hash));
        assert!(!is_tx_hash("0xabc"));
    }
}
