use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use card_lobby::{
    LobbyConfig, LobbySession, NoopObserver, RosterBroadcaster, StaticAvatars,
    messages::ServerMessage,
};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

fn lobby(slot_count: usize) -> LobbySession {
    let config = LobbyConfig {
        slot_count,
        ..LobbyConfig::default()
    };
    LobbySession::host(&config, &StaticAvatars::default(), Arc::new(NoopObserver)).unwrap()
}

/// Benchmark a single connect/disconnect cycle on a two seat lobby
fn bench_connect_disconnect(c: &mut Criterion) {
    let rt = runtime();
    let lobby = lobby(2);

    c.bench_function("connect_disconnect", |b| {
        b.iter(|| {
            rt.block_on(async {
                let index = lobby.connect_player("Bob", 3).await.unwrap().unwrap();
                lobby.disconnect_player(index).await.unwrap();
            })
        });
    });
}

/// Benchmark filling a lobby seat by seat, then one rejected connect
fn bench_fill_lobby(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("fill_lobby");

    for slot_count in [2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::from_parameter(slot_count),
            &slot_count,
            |b, &slot_count| {
                b.iter_batched(
                    || lobby(slot_count),
                    |lobby| {
                        rt.block_on(async {
                            while lobby.connect_player("player", 1).await.unwrap().is_some() {}
                        });
                        lobby
                    },
                    criterion::BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark fan-out of roster updates to many subscribers
fn bench_broadcast(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("broadcast");

    for subscribers in [1, 16, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            &subscribers,
            |b, &subscribers| {
                let broadcaster = RosterBroadcaster::default();
                let mut receivers: Vec<_> =
                    (0..subscribers).map(|_| broadcaster.subscribe()).collect();
                let lobby = LobbySession::host(
                    &LobbyConfig::default(),
                    &StaticAvatars::default(),
                    Arc::new(broadcaster),
                )
                .unwrap();

                b.iter(|| {
                    rt.block_on(async {
                        lobby.disconnect_player(1).await.unwrap();
                        for receiver in &mut receivers {
                            receiver.recv().await.unwrap();
                        }
                    })
                });
            },
        );
    }

    group.finish();
}

/// Benchmark encoding the roster message sent after every change
fn bench_roster_encoding(c: &mut Criterion) {
    let rt = runtime();
    let lobby = lobby(8);
    let roster = rt.block_on(async {
        while lobby.connect_player("player", 1).await.unwrap().is_some() {}
        lobby.snapshot().await
    });
    let message = ServerMessage::Roster { roster };

    c.bench_function("roster_to_json", |b| {
        b.iter(|| message.to_json().unwrap());
    });
}

criterion_group!(
    seat_claims,
    bench_connect_disconnect,
    bench_fill_lobby,
);

criterion_group!(notification, bench_broadcast, bench_roster_encoding);

criterion_main!(seat_claims, notification);
