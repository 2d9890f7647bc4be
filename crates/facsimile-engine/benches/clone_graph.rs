use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use facsimile_core::{Heap, ObjectId, Property, Value};
use facsimile_engine::{deep_clone, deep_clone_with, CloneOptions};

/// Object with `width` numeric properties and one nested array
fn wide_object(heap: &mut Heap, width: usize) -> ObjectId {
    let obj = heap.new_object();
    for i in 0..width {
        heap.set_property(obj, format!("field{}", i), i as f64).unwrap();
    }
    let list = heap.new_array((0..width).map(|i| Value::from(i as f64)));
    heap.set_property(obj, "list", list).unwrap();
    obj
}

/// Linked list of `depth` nodes
fn deep_chain(heap: &mut Heap, depth: usize) -> ObjectId {
    let head = heap.new_object();
    let mut tail = head;
    for i in 0..depth {
        let next = heap.new_object();
        heap.set_property(next, "value", i as f64).unwrap();
        heap.set_property(tail, "next", next).unwrap();
        tail = next;
    }
    head
}

/// Ring of `size` nodes with back links, shared maps and frozen members
fn cyclic_graph(heap: &mut Heap, size: usize) -> ObjectId {
    let nodes: Vec<ObjectId> = (0..size).map(|_| heap.new_object()).collect();
    let index = heap.new_map();
    for (i, &node) in nodes.iter().enumerate() {
        heap.set_property(node, "next", nodes[(i + 1) % size]).unwrap();
        heap.set_property(node, "index", index).unwrap();
        heap.define_own_property(node, "id".into(), Property::data_with(i as f64, false, true, false))
            .unwrap();
        heap.map_set(index, i as f64, node).unwrap();
        if i % 4 == 0 {
            heap.freeze(node).unwrap();
        }
    }
    nodes[0]
}

fn bench_wide(c: &mut Criterion) {
    let mut group = c.benchmark_group("wide");
    for width in [16usize, 256, 4096] {
        let mut heap = Heap::new();
        let root = Value::Object(wide_object(&mut heap, width));
        group.throughput(Throughput::Elements(width as u64));
        group.bench_with_input(BenchmarkId::new("properties", width), &root, |b, root| {
            b.iter(|| {
                let checkpoint = heap.checkpoint();
                let copy = deep_clone(&mut heap, black_box(root)).unwrap();
                heap.rollback(checkpoint);
                copy
            });
        });
    }
    group.finish();
}

fn bench_deep(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep");
    for depth in [100usize, 10_000] {
        let mut heap = Heap::new();
        let root = Value::Object(deep_chain(&mut heap, depth));
        group.throughput(Throughput::Elements(depth as u64));
        group.bench_with_input(BenchmarkId::new("chain", depth), &root, |b, root| {
            b.iter(|| {
                let checkpoint = heap.checkpoint();
                let copy = deep_clone(&mut heap, black_box(root)).unwrap();
                heap.rollback(checkpoint);
                copy
            });
        });
    }
    group.finish();
}

fn bench_cyclic(c: &mut Criterion) {
    let mut heap = Heap::new();
    let root = Value::Object(cyclic_graph(&mut heap, 1000));
    let shared_protos = CloneOptions::new().clone_prototype(false);

    c.bench_function("cyclic_ring_1000", |b| {
        b.iter(|| {
            let checkpoint = heap.checkpoint();
            let copy = deep_clone_with(&mut heap, black_box(&root), &shared_protos).unwrap();
            heap.rollback(checkpoint);
            copy
        });
    });
}

criterion_group!(benches, bench_wide, bench_deep, bench_cyclic);
criterion_main!(benches);
