//! Application services

pub mod wallet;

pub use wallet::WalletService;
