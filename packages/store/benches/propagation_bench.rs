use branchdoc_store::default_resources::{initialize_collection_tree, view_defaults};
use branchdoc_store::policy::{derive_policies, policies_from_page};
use branchdoc_store::{
    Capability, Collection, CollectionPatch, CollectionState, Policy, PolicySet, Variable,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn collection() -> Collection {
    let mut draft = CollectionState::named("utils");
    draft.page_id = Some("page-1".to_string());
    draft.body = Some("export default { run() { return 1 } }".to_string());
    draft.variables = (0..16)
        .map(|i| Variable {
            name: format!("var{i}"),
            value: Some(i.to_string()),
        })
        .collect();

    let mut collection = Collection::new("app-1", draft.clone());
    collection.id = Some("c-1".to_string());
    collection.states.published = Some(draft);
    collection
}

fn policies(groups: usize) -> PolicySet {
    [
        Capability::Read,
        Capability::Edit,
        Capability::Delete,
        Capability::Execute,
    ]
    .into_iter()
    .map(|cap| Policy::new(cap, (0..groups).map(|g| format!("group-{g}"))))
    .collect()
}

fn initialize_fresh(c: &mut Criterion) {
    let source = collection();
    c.bench_function("initialize_fresh_collection", |b| {
        b.iter(|| {
            let mut collection = source.clone();
            initialize_collection_tree(black_box(&mut collection), Some("main"), false);
            collection
        })
    });
}

fn initialize_existing(c: &mut Criterion) {
    let mut source = collection();
    initialize_collection_tree(&mut source, Some("main"), false);
    c.bench_function("initialize_initialized_collection", |b| {
        b.iter(|| {
            let mut collection = source.clone();
            initialize_collection_tree(black_box(&mut collection), Some("main"), false);
            collection
        })
    });
}

fn view_record(c: &mut Criterion) {
    let mut source = collection();
    initialize_collection_tree(&mut source, Some("main"), false);
    let published = source.states.published.clone().unwrap_or_default();
    c.bench_function("view_defaults", |b| {
        b.iter(|| view_defaults(black_box(&source), black_box(&published)))
    });
}

fn merge_patch(c: &mut Criterion) {
    let base = collection().states.unpublished.unwrap_or_default();
    let patch = CollectionPatch {
        name: Some("renamed".to_string()),
        body: Some("export default {}".to_string()),
        ..CollectionPatch::default()
    };
    c.bench_function("merge_patch", |b| b.iter(|| patch.merge(black_box(&base))));
}

fn propagate_policies(c: &mut Criterion) {
    let parent = policies(32);
    c.bench_function("derive_policies", |b| b.iter(|| derive_policies(black_box(&parent))));
    c.bench_function("policies_from_page", |b| {
        b.iter(|| policies_from_page(black_box(&parent)))
    });
}

criterion_group!(
    benches,
    initialize_fresh,
    initialize_existing,
    view_record,
    merge_patch,
    propagate_policies
);
criterion_main!(benches);
