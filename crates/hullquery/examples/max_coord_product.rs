//! Compare the exact and estimated coordinate-product maxima on a seeded
//! 3-D point cloud, across resolutions.
//!
//! Usage:
//!   cargo run -p hullquery --example max_coord_product -- [seed]

use hullquery::special::random_cloud;
use hullquery::{build_hull, OptionMap, Resolution};

fn main() {
    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(2025);
    let pts: Vec<_> = random_cloud(3, 16, 1.0, seed)
        .into_iter()
        .map(|p| p.add_scalar(1.5))
        .collect();
    let hull = match build_hull(&pts, &OptionMap::new()) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("hull construction failed: {e}");
            return;
        }
    };
    let exact = match hull.max_coord_product() {
        Ok(b) => b,
        Err(e) => {
            eprintln!("extremum search failed: {e}");
            return;
        }
    };
    println!(
        "V={} H={} exact={:.6} at {:?}",
        hull.vertices().len(),
        hull.facets().len(),
        exact.value,
        exact.point.as_slice()
    );
    for res in [10usize, 20, 40, 80, 160] {
        let Ok(r) = Resolution::new(res) else {
            continue;
        };
        if let Ok(est) = hull.estimate_max_coord_product(r) {
            println!(
                "res={res:4} estimate={:.6} gap={:.2e}",
                est.value,
                exact.value - est.value
            );
        }
    }
}
