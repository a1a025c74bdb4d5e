pub mod memory;
pub mod pg_wallets;
pub mod wallet_repository;

pub use memory::{
    InMemoryAdditionalWalletRepository, InMemoryLegacyCredentialsRepository,
    InMemoryWalletRepository,
};
pub use pg_wallets::{
    PgAdditionalWalletRepository, PgLegacyCredentialsRepository, PgWalletRepository,
};
pub use wallet_repository::{
    AdditionalWalletRepository, LegacyCredentialsRepository, WalletRepository, MAX_PAGE_SIZE,
};
