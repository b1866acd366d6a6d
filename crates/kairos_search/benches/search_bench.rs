use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kairos_core::{Body, BodyPosition, Deadline, PositionProvider, ProviderError, normalize_deg};
use kairos_search::{
    SearchWindow, Sign, TransitConfig, find_next_transit, find_sign_ingress, search,
};

/// Mars-like longitude with one retrograde loop per 780 days.
struct Looping;

impl PositionProvider for Looping {
    fn position(&self, _body: Body, jd: f64) -> Result<BodyPosition, ProviderError> {
        let w = std::f64::consts::TAU / 780.0;
        Ok(BodyPosition {
            longitude_deg: normalize_deg(0.46 * jd + 20.0 * (w * jd).sin()),
            latitude_deg: 0.0,
            distance: 1.5,
            angular_velocity: 0.46 + 20.0 * w * (w * jd).cos(),
        })
    }

    fn supports_vectorized(&self) -> bool {
        true
    }
}

fn search_core_bench(c: &mut Criterion) {
    let window = SearchWindow::new(0.0, 10.0).expect("valid window");

    let mut group = c.benchmark_group("search_core");
    group.bench_function("bisect_linear", |b| {
        b.iter(|| {
            search(
                black_box(window),
                |t| Ok(t - 3.3),
                black_box(1e-7),
                black_box(100),
            )
            .expect("search should succeed")
        })
    });
    group.finish();
}

fn transit_bench(c: &mut Criterion) {
    let exact = TransitConfig::exact_only();
    let with_orbs = TransitConfig::default();

    let mut group = c.benchmark_group("search_transit");
    group.sample_size(20);
    group.bench_function("next_transit_3_crossings", |b| {
        b.iter(|| {
            find_next_transit(
                black_box(&Looping),
                Body::Mars,
                black_box(180.0),
                black_box(0.0),
                3,
                &exact,
                &Deadline::none(),
            )
            .expect("search should succeed")
        })
    });
    group.bench_function("next_transit_with_orbs", |b| {
        b.iter(|| {
            find_next_transit(
                black_box(&Looping),
                Body::Mars,
                black_box(180.0),
                black_box(0.0),
                1,
                &with_orbs,
                &Deadline::none(),
            )
            .expect("search should succeed")
        })
    });
    group.bench_function("sign_ingress", |b| {
        b.iter(|| {
            find_sign_ingress(
                black_box(&Looping),
                Body::Mars,
                black_box(0.0),
                Some(Sign::Leo),
                &exact,
                &Deadline::none(),
            )
            .expect("search should succeed")
        })
    });
    group.finish();
}

criterion_group!(benches, search_core_bench, transit_bench);
criterion_main!(benches);
