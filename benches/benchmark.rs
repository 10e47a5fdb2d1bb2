//! Benchmarks for the screenplay document engine.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kyakuhon::{
    render_text, serialize, Anchor, ContentBlock, EditingSession, Scene, ScriptManager,
};

fn bench_new(c: &mut Criterion) {
    c.bench_function("new", |b| b.iter(|| black_box(ScriptManager::new())));
}

fn bench_add_scene(c: &mut Criterion) {
    c.bench_function("add_scene", |b| {
        let mut manager = ScriptManager::new();
        b.iter(|| {
            manager
                .add_scene(Scene::new().with_location("Office"))
                .unwrap();
        })
    });
}

fn bench_insert_block(c: &mut Criterion) {
    c.bench_function("insert_block", |b| {
        let mut session = EditingSession::new();
        let mut i = 0u64;
        b.iter(|| {
            session
                .insert_block(
                    &Anchor::None,
                    ContentBlock::serifu("Mika", format!("line {}", i)),
                )
                .unwrap();
            i += 1;
        })
    });
}

fn bench_serialize(c: &mut Criterion) {
    c.bench_function("serialize_50_scenes", |b| {
        let state = seeded_state(50, 10);
        b.iter(|| black_box(serialize(&state)))
    });
}

fn bench_render_text(c: &mut Criterion) {
    c.bench_function("render_text_50_scenes", |b| {
        let state = seeded_state(50, 10);
        b.iter(|| black_box(render_text(&state)))
    });
}

fn bench_renumber(c: &mut Criterion) {
    c.bench_function("renumber_200_scenes", |b| {
        let mut state = seeded_state(200, 0);
        b.iter(|| {
            state.scene_order.reverse();
            state.renumber();
        })
    });
}

fn seeded_state(scenes: usize, blocks_per_scene: usize) -> kyakuhon::ScriptRoot {
    let mut manager = ScriptManager::new();
    for i in 1..scenes {
        let mut scene = Scene::new().with_location(format!("Location {}", i));
        for j in 0..blocks_per_scene {
            scene = scene
                .with_block(ContentBlock::togaki(format!("Action {}", j)))
                .with_block(ContentBlock::serifu("Mika", format!("Line {}", j)));
        }
        manager.add_scene(scene).unwrap();
    }
    manager.get_state().unwrap()
}

criterion_group!(
    benches,
    bench_new,
    bench_add_scene,
    bench_insert_block,
    bench_serialize,
    bench_render_text,
    bench_renumber
);
criterion_main!(benches);
