use crate::errors::error::AppError;

/// 校验闭区间 [start_block, end_block]，在任何工作开始前调用
pub fn validate_range(start_block: u64, end_block: u64) -> Result<(), AppError> {
    if start_block > end_block {
        return Err(AppError::InvalidBlockRange {
            start: start_block,
            end: end_block,
        });
    }
    Ok(())
}
