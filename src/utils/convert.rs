use crate::errors::error::AppError;
use ethers_core::types::{H160, U256};
use std::str::FromStr;

/// 区块号转节点期望的 hex 编码（0 → "0x0"）
pub fn block_number_to_hex(block_number: u64) -> String {
    format!("{:#x}", block_number)
}

/// 解析 JSON-RPC quantity：支持 "0x" 前缀的十六进制和十进制字符串
pub fn quantity_to_u256(raw: &str) -> Result<U256, AppError> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(digits) => {
            if digits.is_empty() {
                return Err(AppError::MalformedTrace(format!("空的十六进制数值: {:?}", raw)));
            }
            U256::from_str_radix(digits, 16)
                .map_err(|e| AppError::MalformedTrace(format!("无效的十六进制数值 {:?}: {:?}", raw, e)))
        }
        None => U256::from_dec_str(raw)
            .map_err(|e| AppError::MalformedTrace(format!("无效的十进制数值 {:?}: {:?}", raw, e))),
    }
}

/// quantity 转 u64，超出范围视为转换错误
pub fn quantity_to_u64(raw: &str) -> Result<u64, AppError> {
    let value = quantity_to_u256(raw)?;
    if value > U256::from(u64::MAX) {
        return Err(AppError::ConversionError(format!("U256({}) 超出u64范围", value)));
    }
    Ok(value.as_u64())
}

/// 地址统一为 0x 前缀的小写 hex
pub fn to_normalized_address(address: &str) -> Result<String, AppError> {
    let trimmed = address.trim();
    let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let parsed = H160::from_str(digits).map_err(|_| AppError::InvalidAddress(address.to_string()))?;
    Ok(format!("{:#x}", parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_number_is_hex_encoded() {
        assert_eq!(block_number_to_hex(0), "0x0");
        assert_eq!(block_number_to_hex(1_920_000), "0x1d4c00");
    }

    #[test]
    fn parses_hex_and_decimal_quantities() {
        assert_eq!(quantity_to_u256("0x5").unwrap(), U256::from(5));
        assert_eq!(quantity_to_u256("0x0").unwrap(), U256::zero());
        assert_eq!(quantity_to_u256("1000").unwrap(), U256::from(1000));
        assert_eq!(
            quantity_to_u256("0xde0b6b3a7640000").unwrap(),
            U256::from(1_000_000_000_000_000_000u64)
        );
    }

    #[test]
    fn rejects_malformed_quantities() {
        assert!(matches!(quantity_to_u256("0xzz"), Err(AppError::MalformedTrace(_))));
        assert!(matches!(quantity_to_u256("0x"), Err(AppError::MalformedTrace(_))));
        assert!(matches!(quantity_to_u256("-1"), Err(AppError::MalformedTrace(_))));
    }

    #[test]
    fn quantity_to_u64_checks_overflow() {
        assert_eq!(quantity_to_u64("0x1d4c00").unwrap(), 1_920_000);
        assert!(quantity_to_u64("0x10000000000000000").is_err());
    }

    #[test]
    fn normalizes_addresses_to_lowercase() {
        let addr = to_normalized_address("0xBB9bc244D798123fDe783fCc1C72d3Bb8C189413").unwrap();
        assert_eq!(addr, "0xbb9bc244d798123fde783fcc1c72d3bb8c189413");
        let no_prefix = to_normalized_address("bb9bc244d798123fde783fcc1c72d3bb8c189413").unwrap();
        assert_eq!(no_prefix, addr);
        assert!(to_normalized_address("0x1234").is_err());
    }
}
