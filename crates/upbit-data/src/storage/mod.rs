//! 저장소 구현.

pub mod candles;
pub mod watermark;
