// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use geo::{Distance, Geodesic, VincentyDistance};
use geo_types::Point;

/// Ellipsoidal (WGS-84) distance between two points, in metres.
///
/// Uses Vincenty's inverse formula. Vincenty can fail to converge for
/// nearly antipodal points; those fall back to Karney's geodesic solution,
/// which always converges.
pub fn distance_between(a: Point<f64>, b: Point<f64>) -> f64 {
    if a == b {
        return 0.0;
    }

    match a.vincenty_distance(&b) {
        Ok(metres) => metres,
        Err(_) => {
            tracing::debug!(
                "Vincenty did not converge between ({}, {}) and ({}, {}), using geodesic",
                a.y(),
                a.x(),
                b.y(),
                b.x()
            );
            Geodesic.distance(a, b)
        }
    }
}
