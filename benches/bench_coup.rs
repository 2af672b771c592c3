use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use coup_engine::{Game, GameConfig};

fn complete_game(num_players: u8, seed: u64) {
    let mut rng = Pcg64::seed_from_u64(seed);
    let mut game: Game<u8> = black_box(Game::new(GameConfig::seeded(seed)));
    for id in 0..num_players {
        game.join(id).unwrap();
    }
    game.start(&[] as &[&str]).unwrap();

    for _ in 0..1000 {
        let mut commands = game.legal_commands();

        let random_index = rng.gen_range(0..commands.len());
        let random_command = commands.remove(random_index);

        game.apply(random_command).unwrap();

        if game.winner().is_some() {
            break;
        }
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("complete_game");
    for num_players in 3..=6u8 {
        group.bench_with_input(BenchmarkId::from_parameter(num_players), &num_players, |b, &num_players| {
            let mut seed = 0;
            b.iter(|| {
                seed += 1;
                complete_game(num_players, seed)
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
