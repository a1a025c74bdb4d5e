//! 地址扩展编解码性能基准测试
//!
//! 测试场景:
//! 1. 合并基础地址与扩展
//! 2. 解析合并后的地址
//! 3. 并发读取能力缓存

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use blockchain_wallets::{
    domain::{AddressExtensionDescriptor, DiscoveredCapabilities},
    infrastructure::backoff::BackoffConfig,
    service::{
        address_codec::AddressCodec,
        blockchain_extensions::BlockchainExtensionsService,
        blockchain_integration::{BlockchainApiClient, BlockchainAsset, BlockchainIntegrationService},
    },
};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use tokio::runtime::Runtime;

const CHAINS: &[&str] = &["Ripple", "Stellar", "EOS", "Plain"];

struct StaticApi {
    separator: Option<char>,
}

#[async_trait]
impl BlockchainApiClient for StaticApi {
    async fn get_capabilities(&self) -> Result<DiscoveredCapabilities> {
        Ok(DiscoveredCapabilities {
            address_extension_required: self.separator.is_some(),
            address_mapping_required: false,
        })
    }

    async fn get_constants(&self) -> Result<Option<AddressExtensionDescriptor>> {
        Ok(self.separator.map(|separator| AddressExtensionDescriptor {
            separator: Some(separator),
            display_name: Some("Tag".into()),
            base_display_name: None,
        }))
    }

    async fn get_underlying_address(&self, _address: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn get_virtual_address(&self, _address: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn get_asset(&self, _asset_id: &str) -> Result<Option<BlockchainAsset>> {
        Ok(None)
    }

    async fn start_balance_observation(&self, _address: &str) -> Result<()> {
        Ok(())
    }

    async fn stop_balance_observation(&self, _address: &str) -> Result<()> {
        Ok(())
    }
}

fn setup_codec(rt: &Runtime) -> (Arc<BlockchainExtensionsService>, AddressCodec) {
    let separators = [Some('?'), Some(':'), Some('$'), None];
    let integration = Arc::new(BlockchainIntegrationService::from_clients(
        CHAINS.iter().zip(separators).map(|(bt, separator)| {
            (
                bt.to_string(),
                Arc::new(StaticApi { separator }) as Arc<dyn BlockchainApiClient>,
            )
        }),
    ));
    let extensions = Arc::new(BlockchainExtensionsService::new(
        integration,
        BackoffConfig::new(Duration::from_millis(10), Duration::from_millis(100)),
    ));

    rt.block_on(async {
        for chain in CHAINS {
            extensions
                .try_discover(chain)
                .await
                .expect("discovery with static api");
        }
    });

    (extensions.clone(), AddressCodec::new(extensions))
}

fn bench_merge(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (_, codec) = setup_codec(&rt);

    let mut group = c.benchmark_group("address_merge");
    group.throughput(Throughput::Elements(1));

    group.bench_function("with_extension", |b| {
        b.iter(|| {
            codec
                .merge(
                    black_box("Ripple"),
                    black_box("rHb9CJAWyB4rj91VRWn96DkukG4bwdtyTh"),
                    black_box("123456"),
                )
                .unwrap()
        })
    });

    group.bench_function("empty_extension", |b| {
        b.iter(|| {
            codec
                .merge(black_box("Plain"), black_box("0x9fC3da866e7DF3a1c57adE1a97c9f00a70f010c8"), "")
                .unwrap()
        })
    });

    group.finish();
}

fn bench_parse(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (_, codec) = setup_codec(&rt);

    let mut group = c.benchmark_group("address_parse");
    group.throughput(Throughput::Elements(1));

    group.bench_function("with_separator", |b| {
        b.iter(|| codec.parse(black_box("Stellar"), black_box("GA5XIGA5C7QTPTWXQHY6MCJRMTRZDOSHR6EFIBNDQTCQHG262N4GGKTM:memo42")))
    });

    group.bench_function("without_extension_support", |b| {
        b.iter(|| codec.parse(black_box("Plain"), black_box("0x9fC3da866e7DF3a1c57adE1a97c9f00a70f010c8")))
    });

    group.finish();
}

fn bench_concurrent_capability_reads(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (extensions, _) = setup_codec(&rt);

    let mut group = c.benchmark_group("capability_reads");
    group.throughput(Throughput::Elements(100));

    group.bench_function("concurrent_100", |b| {
        b.to_async(&rt).iter(|| {
            let extensions = extensions.clone();
            async move {
                let handles: Vec<_> = (0..100)
                    .map(|i| {
                        let extensions = extensions.clone();
                        tokio::spawn(async move {
                            extensions.is_address_extension_required(CHAINS[i % CHAINS.len()])
                        })
                    })
                    .collect();
                futures::future::join_all(handles).await
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_merge,
    bench_parse,
    bench_concurrent_capability_reads
);
criterion_main!(benches);
