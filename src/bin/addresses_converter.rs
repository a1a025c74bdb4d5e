//! 把某链某资产下的默认钱包全部转移到附加层
//!
//! 用法：addresses_converter <blockchain_type> <asset_id>
//! 需要 DATABASE_URL

use anyhow::Result;
use blockchain_wallets::{
    config::Config,
    infrastructure::{db, logging},
    repository::{
        AdditionalWalletRepository, PgAdditionalWalletRepository, PgWalletRepository,
        WalletRepository,
    },
};

const PAGE_SIZE: usize = 100;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let (blockchain_type, asset_id) = match args.as_slice() {
        [_, blockchain_type, asset_id] => (blockchain_type.clone(), asset_id.clone()),
        _ => {
            eprintln!("Usage: addresses_converter <blockchain_type> <asset_id>");
            std::process::exit(2);
        }
    };

    let config = Config::from_env()?;
    logging::init_logging(&config.logging)?;

    let pool = db::init_pool(&config.database).await?;
    let wallets = PgWalletRepository::new(pool.clone());
    let additional_wallets = PgAdditionalWalletRepository::new(pool);

    let mut converted = 0usize;

    // 已转移的钱包会从默认层删除，所以每次都从第一页读取
    loop {
        let page = wallets
            .get_by_asset(&blockchain_type, &asset_id, PAGE_SIZE, None)
            .await?;

        if page.items.is_empty() {
            break;
        }

        for wallet in page.items {
            additional_wallets
                .add(
                    &wallet.blockchain_type,
                    &wallet.asset_id,
                    wallet.client_id,
                    &wallet.address,
                )
                .await?;
            wallets
                .delete_if_exists(&wallet.blockchain_type, &wallet.asset_id, wallet.client_id)
                .await?;
            converted += 1;
        }

        tracing::info!(
            blockchain_type = %blockchain_type,
            asset_id = %asset_id,
            converted,
            "Wallets moved to additional tier"
        );
    }

    if converted == 0 {
        println!("Nothing to convert");
    } else {
        tracing::info!(
            blockchain_type = %blockchain_type,
            asset_id = %asset_id,
            converted,
            "Conversion completed"
        );
    }

    Ok(())
}
