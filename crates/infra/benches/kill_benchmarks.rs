use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::Arc;

use arena_combat::{gain_experience, Enemy, EnemyType, Hero, KillEnemy};
use arena_core::{EnemyId, HeroId};
use arena_infra::kill_coordinator::{KillCoordinator, KillError};
use arena_infra::store::{CombatStore, InMemoryCombatStore};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .build()
        .unwrap()
}

/// One hero plus `enemies` alive goblins of level 5.
async fn arena(enemies: usize) -> (KillCoordinator<Arc<InMemoryCombatStore>>, HeroId, Vec<EnemyId>) {
    let store = Arc::new(InMemoryCombatStore::new());
    let hero = Hero::new(HeroId::new(), "Bench Hero").unwrap();
    store.insert_hero(&hero).await.unwrap();

    let mut ids = Vec::with_capacity(enemies);
    for i in 0..enemies {
        let e = Enemy::restore(EnemyId::new(), format!("Goblin {i}"), EnemyType::Goblin, 5, 0, None)
            .unwrap();
        store.insert_enemy(&e).await.unwrap();
        ids.push(e.id_typed());
    }
    (KillCoordinator::new(store), hero.id_typed(), ids)
}

fn bench_leveling(c: &mut Criterion) {
    let mut group = c.benchmark_group("leveling");

    for amount in [50i64, 1_000, 100_000].iter() {
        group.bench_with_input(BenchmarkId::new("gain_experience", amount), amount, |b, &amount| {
            b.iter(|| gain_experience(black_box(1), black_box(0), black_box(amount)));
        });
    }

    group.finish();
}

fn bench_uncontested_kill(c: &mut Criterion) {
    let mut group = c.benchmark_group("uncontested_kill");
    group.throughput(Throughput::Elements(1));

    group.bench_function("attempt_kill_fresh_enemy", |b| {
        let rt = runtime();
        b.iter_batched(
            || rt.block_on(arena(1)),
            |(coordinator, hero_id, enemies)| {
                rt.block_on(coordinator.attempt_kill(KillEnemy {
                    hero_id,
                    enemy_id: enemies[0],
                    enemy_type: EnemyType::Goblin,
                }))
                .unwrap()
            },
            criterion::BatchSize::SmallInput,
        );
    });

    // Rejected before any write: the pre-check path.
    group.bench_function("attempt_kill_dead_enemy", |b| {
        let rt = runtime();
        let (coordinator, hero_id, enemies) = rt.block_on(arena(1));
        let cmd = KillEnemy {
            hero_id,
            enemy_id: enemies[0],
            enemy_type: EnemyType::Goblin,
        };
        rt.block_on(coordinator.attempt_kill(cmd.clone())).unwrap();

        b.iter(|| {
            let err = rt.block_on(coordinator.attempt_kill(black_box(cmd.clone()))).unwrap_err();
            assert!(matches!(err, KillError::EnemyAlreadyKilled { .. }));
        });
    });

    group.finish();
}

fn bench_contested_kill(c: &mut Criterion) {
    let mut group = c.benchmark_group("contested_kill");

    for racers in [2usize, 8, 32].iter() {
        group.throughput(Throughput::Elements(*racers as u64));
        group.bench_with_input(BenchmarkId::new("racers_per_enemy", racers), racers, |b, &racers| {
            let rt = runtime();
            b.iter_batched(
                || {
                    rt.block_on(async {
                        let store = Arc::new(InMemoryCombatStore::new());
                        let enemy = Enemy::restore(
                            EnemyId::new(),
                            "Contested Troll",
                            EnemyType::Troll,
                            3,
                            0,
                            None,
                        )
                        .unwrap();
                        store.insert_enemy(&enemy).await.unwrap();
                        let mut heroes = Vec::with_capacity(racers);
                        for i in 0..racers {
                            let h = Hero::new(HeroId::new(), format!("Racer {i}")).unwrap();
                            store.insert_hero(&h).await.unwrap();
                            heroes.push(h.id_typed());
                        }
                        (Arc::new(KillCoordinator::new(store)), enemy.id_typed(), heroes)
                    })
                },
                |(coordinator, enemy_id, heroes)| {
                    rt.block_on(async {
                        let handles: Vec<_> = heroes
                            .into_iter()
                            .map(|hero_id| {
                                let coordinator = coordinator.clone();
                                tokio::spawn(async move {
                                    coordinator
                                        .attempt_kill(KillEnemy {
                                            hero_id,
                                            enemy_id,
                                            enemy_type: EnemyType::Troll,
                                        })
                                        .await
                                        .is_ok()
                                })
                            })
                            .collect();

                        let mut winners = 0;
                        for h in handles {
                            if h.await.unwrap() {
                                winners += 1;
                            }
                        }
                        assert_eq!(winners, 1);
                    })
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_leveling, bench_uncontested_kill, bench_contested_kill);
criterion_main!(benches);
