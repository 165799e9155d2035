pub mod returns;
pub mod volatility;

pub use returns::summarize;
pub use volatility::latest_volatility;
