use core::fmt;

use clap::ValueEnum;
use geo::{GeodesicDistance, Point};
use itertools::Itertools;

// km between two points on the WGS-84 ellipsoid
pub fn distance_km(a: Point, b: Point) -> f64 {
    a.geodesic_distance(&b) / 1000.0
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Start {
    First,
    Westernmost,
}

impl fmt::Display for Start {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::First => "first",
            Self::Westernmost => "westernmost",
        })
    }
}

impl Start {
    fn pick(self, points: &[Point]) -> usize {
        match self {
            Self::First => 0,
            Self::Westernmost => {
                let mut best = 0;
                for (i, point) in points.iter().enumerate() {
                    if point.x() < points[best].x() {
                        best = i;
                    }
                }
                best
            }
        }
    }
}

// greedy nearest-neighbour: repeatedly step to the closest unvisited point.
// strict < keeps the first minimum, so ties go to the earlier input row and
// a fixed input always gives the same order. O(n²), fine for a day's run.
pub fn visit_order(points: &[Point], start: Start) -> Vec<usize> {
    if points.is_empty() {
        return Vec::new();
    }

    let mut order = Vec::with_capacity(points.len());
    let mut visited = vec![false; points.len()];
    let mut current = start.pick(points);
    visited[current] = true;
    order.push(current);

    while order.len() < points.len() {
        let mut next = current;
        let mut best = f64::INFINITY;
        for (i, point) in points.iter().enumerate() {
            if visited[i] {
                continue;
            }

            let distance = distance_km(points[current], *point);
            if distance < best {
                best = distance;
                next = i;
            }
        }

        visited[next] = true;
        order.push(next);
        current = next;
    }

    order
}

pub fn length_km(points: &[Point]) -> f64 {
    points
        .iter()
        .tuple_windows()
        .map(|(a, b)| distance_km(*a, *b))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lng: f64) -> Point {
        Point::new(lng, lat)
    }

    #[test]
    fn zero_distance_to_itself() {
        let a = point(-27.4679, 153.0281);
        assert!(distance_km(a, a).abs() < 1e-12);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = point(-27.4679, 153.0281);
        let b = point(-33.8688, 151.2093);
        assert!((distance_km(a, b) - distance_km(b, a)).abs() < 1e-9);
    }

    #[test]
    fn one_degree_along_the_equator() {
        // ~111.3 km on the ellipsoid
        let d = distance_km(point(0.0, 0.0), point(0.0, 1.0));
        assert!(d > 110.0 && d < 112.0);
    }

    #[test]
    fn triangle_inequality_for_nearby_points() {
        let a = point(-27.47, 153.02);
        let b = point(-27.50, 153.00);
        let c = point(-27.46, 153.06);
        assert!(distance_km(a, c) <= distance_km(a, b) + distance_km(b, c) + 1e-9);
    }

    #[test]
    fn visits_nearest_first_from_the_first_row() {
        let points = vec![
            point(0.0, 0.0),
            point(0.0, 1.0),
            point(0.0, 5.0),
            point(0.0, 2.0),
        ];
        assert_eq!(visit_order(&points, Start::First), vec![0, 1, 3, 2]);
    }

    #[test]
    fn order_is_a_permutation() {
        let points = vec![
            point(-27.47, 153.02),
            point(-27.64, 153.11),
            point(-27.38, 152.71),
            point(-27.50, 153.25),
            point(-26.68, 153.10),
        ];
        let mut order = visit_order(&points, Start::First);
        order.sort();
        assert_eq!(order, (0..points.len()).collect::<Vec<_>>());
    }

    #[test]
    fn same_input_gives_the_same_order() {
        let points = vec![
            point(-27.47, 153.02),
            point(-27.64, 153.11),
            point(-27.38, 152.71),
            point(-27.50, 153.25),
        ];
        assert_eq!(
            visit_order(&points, Start::First),
            visit_order(&points, Start::First)
        );
    }

    #[test]
    fn reordering_an_ordered_route_keeps_it() {
        let points = vec![
            point(-27.47, 153.02),
            point(-26.68, 153.10),
            point(-27.64, 153.11),
            point(-27.38, 152.71),
        ];
        let ordered: Vec<Point> = visit_order(&points, Start::First)
            .into_iter()
            .map(|i| points[i])
            .collect();
        assert_eq!(
            visit_order(&ordered, Start::First),
            (0..points.len()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn equal_distances_go_to_the_earlier_row() {
        // two clients in the same building
        let points = vec![point(0.0, 0.0), point(0.0, 1.0), point(0.0, 1.0)];
        assert_eq!(visit_order(&points, Start::First), vec![0, 1, 2]);
    }

    #[test]
    fn westernmost_start() {
        let points = vec![point(0.0, 3.0), point(0.0, -1.0), point(0.0, 2.0)];
        assert_eq!(visit_order(&points, Start::Westernmost), vec![1, 2, 0]);
    }

    #[test]
    fn no_points_no_order() {
        assert!(visit_order(&[], Start::First).is_empty());
    }

    #[test]
    fn length_sums_the_legs() {
        let points = vec![point(0.0, 0.0), point(0.0, 1.0), point(0.5, 1.0)];
        let legs = distance_km(points[0], points[1]) + distance_km(points[1], points[2]);
        assert!((length_km(&points) - legs).abs() < 1e-9);
    }
}
