use bigdecimal::BigDecimal;
use ethers_core::types::U256;
use num_format::{Locale, ToFormattedString};
use std::str::FromStr;

/// 将U256 转 BigDecimal（wei 数值可能超过 u128，走字符串最稳）
pub fn u256_to_bigdecimal(value: U256) -> BigDecimal {
    let s = value.to_string();
    BigDecimal::from_str(&s).unwrap_or_else(|_| BigDecimal::from(0))
}

/// 千分位格式化，用于进度日志
pub fn format_count(count: u64) -> String {
    count.to_formatted_string(&Locale::en)
}
