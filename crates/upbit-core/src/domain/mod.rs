//! 도메인 모델.

pub mod candle;
pub mod market;

pub use candle::*;
pub use market::*;
