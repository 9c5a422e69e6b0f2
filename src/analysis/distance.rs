use crate::telemetry::TelemetryPoint;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Segments this long or longer are left out of the accumulated distance.
///
/// Meant as a GPS jump filter, but at racing sample rates legitimate segments
/// are usually longer than this. Kept at 1 m until the intended value is
/// confirmed; override it through `AnalysisConfig::max_segment_distance_m`.
pub const MAX_SEGMENT_DISTANCE_M: f64 = 1.0;

/// Great-circle distance in meters between two lat/lng pairs.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lng2 - lng1).to_radians();

    let a = (d_phi / 2.).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.).sin().powi(2);
    // rounding can push a a hair past 1 for antipodal points
    let a = a.clamp(0., 1.);

    2. * EARTH_RADIUS_M * a.sqrt().atan2((1. - a).sqrt())
}

pub fn point_distance(from: &TelemetryPoint, to: &TelemetryPoint) -> f64 {
    haversine_distance(from.lat, from.lng, to.lat, to.lng)
}

/// Sums consecutive segment distances shorter than `max_segment_m`, in meters.
pub fn accumulate_distance(points: &[TelemetryPoint], max_segment_m: f64) -> f64 {
    points
        .windows(2)
        .map(|pair| point_distance(&pair[0], &pair[1]))
        .filter(|d| *d < max_segment_m)
        .sum()
}

/// Cumulative distance along the points without any jump filtering.
///
/// The returned vector has one entry per point, starting at 0.
pub fn cumulative_distance<'a>(points: impl IntoIterator<Item = &'a TelemetryPoint>) -> Vec<f64> {
    let mut total = 0.;
    let mut previous: Option<&TelemetryPoint> = None;
    points
        .into_iter()
        .map(|point| {
            if let Some(previous) = previous {
                total += point_distance(previous, point);
            }
            previous = Some(point);
            total
        })
        .collect()
}
