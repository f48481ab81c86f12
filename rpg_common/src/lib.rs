mod money;
pub mod helpers;
pub mod op;
pub mod phone;
mod secret;

pub use money::{Money, MoneyConversionError, CURRENCY_CODE};
pub use secret::Secret;
