//! 短码生成性能基准测试

use std::collections::HashMap;
use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tinylink::services::CodeGenerator;
use tinylink::storage::{MemoryRepository, UrlPair, UrlRepository};

/// 纯哈希开销
fn bench_hash_url(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_url");
    for len in [32usize, 256, 2048] {
        let url = format!("https://example.com/{}", "a".repeat(len));
        group.throughput(Throughput::Bytes(url.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &url, |b, url| {
            b.iter(|| CodeGenerator::hash_url(black_box(url)));
        });
    }
    group.finish();
}

/// 对已填充的内存存储生成短码（命中已有 / 全新）
fn bench_generate(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let repo = Arc::new(MemoryRepository::new());

    rt.block_on(async {
        let pairs: Vec<UrlPair> = (0..10_000)
            .map(|i| {
                let url = format!("https://example.com/{}", i);
                UrlPair::new(CodeGenerator::hash_url(&url), url, "")
            })
            .collect();
        repo.save_many(pairs).await.unwrap();
    });

    let generator = CodeGenerator::new();
    let reserved = HashMap::new();

    c.bench_function("generate/existing", |b| {
        b.to_async(&rt).iter(|| async {
            generator
                .generate(repo.as_ref(), "https://example.com/5000", &reserved)
                .await
                .unwrap()
        });
    });

    let mut n = 0u64;
    c.bench_function("generate/fresh", |b| {
        b.to_async(&rt).iter(|| {
            n += 1;
            let url = format!("https://fresh.example.com/{}", n);
            let repo = Arc::clone(&repo);
            let reserved = &reserved;
            async move {
                generator
                    .generate(repo.as_ref(), &url, reserved)
                    .await
                    .unwrap()
            }
        });
    });
}

criterion_group!(benches, bench_hash_url, bench_generate);
criterion_main!(benches);
