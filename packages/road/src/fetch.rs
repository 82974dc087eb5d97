//! Road geometry sources other than manually supplied coordinates.
//!
//! External map databases are reached only through the [`RoadFetcher`]
//! trait, so the core never depends on network availability. A small
//! registry of predefined roads covers the common offline case.

use collision_map_road_models::{InvalidGeometryError, RoadGeometry, RoadOrigin};
use geo::{Coord, LineString};

use crate::geodesy::haversine_m;

/// Errors that can occur while obtaining road geometry.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The source has no road with that name in the area.
    #[error("No road found named '{street}' in '{area}'")]
    NotFound {
        /// Area searched.
        area: String,
        /// Street requested.
        street: String,
    },

    /// The source returned features but none were line geometries.
    #[error("No line geometries found for '{street}'")]
    NoLineGeometry {
        /// Street requested.
        street: String,
    },

    /// No predefined road is registered under this name.
    #[error("No coordinates found for road: {name}")]
    UnknownPredefined {
        /// Name as requested.
        name: String,
    },

    /// The assembled geometry is unusable.
    #[error("Invalid road geometry: {0}")]
    Geometry(#[from] InvalidGeometryError),

    /// The backing source failed (network, parse, ...).
    #[error("Road source error: {message}")]
    Source {
        /// Description of what went wrong.
        message: String,
    },
}

/// Narrow interface to an external road network database.
///
/// Implementors return the raw line pieces making up a named street;
/// [`RoadFetcher::fetch_road`] stitches them into one polyline.
pub trait RoadFetcher: Send + Sync {
    /// Returns every line segment tagged with `street` inside `area`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the lookup fails or finds nothing.
    fn fetch_segments(&self, area: &str, street: &str) -> Result<Vec<LineString<f64>>, FetchError>;

    /// Fetches a street as a single road polyline.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] if the lookup fails, yields no line
    /// geometry, or the merged line is degenerate.
    fn fetch_road(&self, area: &str, street: &str) -> Result<RoadGeometry, FetchError> {
        resolve_fetched(self, area, street).map(|(road, _)| road)
    }
}

/// Fetches a street and records its provenance.
///
/// # Errors
///
/// See [`RoadFetcher::fetch_road`].
pub fn resolve_fetched<F: RoadFetcher + ?Sized>(
    fetcher: &F,
    area: &str,
    street: &str,
) -> Result<(RoadGeometry, RoadOrigin), FetchError> {
    log::info!("Fetching '{street}' in '{area}'...");

    let segments = fetcher.fetch_segments(area, street)?;
    if segments.is_empty() {
        return Err(FetchError::NotFound {
            area: area.to_string(),
            street: street.to_string(),
        });
    }
    log::info!("Found {} segments of {street}", segments.len());

    let count = segments.len();
    let line = merge_segments(segments).ok_or_else(|| FetchError::NoLineGeometry {
        street: street.to_string(),
    })?;

    let road = RoadGeometry::from_line_string(line)?;
    Ok((
        road,
        RoadOrigin::Fetched {
            area: area.to_string(),
            street: street.to_string(),
            segments: count,
        },
    ))
}

/// Joins line pieces that share endpoints and returns the longest chain.
///
/// Pieces are attached end-to-end (reversing where needed) until no more
/// share an endpoint. If several disconnected chains remain, the longest by
/// great-circle length wins. Returns `None` when no piece has two vertices.
#[must_use]
pub fn merge_segments(segments: Vec<LineString<f64>>) -> Option<LineString<f64>> {
    let mut remaining: Vec<Vec<Coord<f64>>> = segments
        .into_iter()
        .map(|l| l.0)
        .filter(|c| c.len() >= 2)
        .collect();

    let mut chains: Vec<Vec<Coord<f64>>> = Vec::new();

    while !remaining.is_empty() {
        let mut chain = remaining.remove(0);

        while let Some(pos) = remaining.iter().position(|piece| shares_endpoint(&chain, piece)) {
            let piece = remaining.remove(pos);
            attach(&mut chain, piece);
        }

        chains.push(chain);
    }

    if chains.len() > 1 {
        log::warn!(
            "Road consists of {} disconnected segments; working with longest segment",
            chains.len()
        );
    }

    let mut best: Option<(f64, Vec<Coord<f64>>)> = None;
    for chain in chains {
        let length: f64 = chain.windows(2).map(|w| haversine_m(w[0], w[1])).sum();
        match &best {
            Some((best_length, _)) if length <= *best_length => {}
            _ => best = Some((length, chain)),
        }
    }

    best.map(|(_, coords)| LineString::new(coords))
}

fn shares_endpoint(chain: &[Coord<f64>], piece: &[Coord<f64>]) -> bool {
    let (head, tail) = (chain[0], chain[chain.len() - 1]);
    let (start, end) = (piece[0], piece[piece.len() - 1]);
    tail == start || tail == end || head == end || head == start
}

fn attach(chain: &mut Vec<Coord<f64>>, mut piece: Vec<Coord<f64>>) {
    let tail = chain[chain.len() - 1];
    let head = chain[0];

    if tail == piece[0] {
        chain.extend_from_slice(&piece[1..]);
    } else if tail == piece[piece.len() - 1] {
        piece.reverse();
        chain.extend_from_slice(&piece[1..]);
    } else if head == piece[piece.len() - 1] {
        piece.truncate(piece.len() - 1);
        piece.extend_from_slice(chain);
        *chain = piece;
    } else {
        piece.reverse();
        piece.truncate(piece.len() - 1);
        piece.extend_from_slice(chain);
        *chain = piece;
    }
}

/// Predefined road coordinates as `(longitude, latitude)`.
const PREDEFINED_ROADS: &[(&str, &[(f64, f64)])] = &[(
    "askew_road",
    &[
        (-0.2328, 51.5180),
        (-0.2320, 51.5182),
        (-0.2310, 51.5184),
        (-0.2300, 51.5186),
        (-0.2290, 51.5188),
        (-0.2280, 51.5190),
        (-0.2270, 51.5192),
        (-0.2260, 51.5194),
        (-0.2250, 51.5196),
        (-0.2240, 51.5198),
        (-0.2230, 51.5200),
        (-0.2220, 51.5202),
        (-0.2210, 51.5204),
        (-0.2200, 51.5206),
        (-0.2190, 51.5208),
        (-0.2180, 51.5210),
    ],
)];

/// Normalizes a road name to its registry key (`"Askew Road"` -> `"askew_road"`).
#[must_use]
pub fn predefined_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Names of all predefined roads.
#[must_use]
pub fn predefined_names() -> Vec<&'static str> {
    PREDEFINED_ROADS.iter().map(|(name, _)| *name).collect()
}

/// Looks up a predefined road by name (case-insensitive, spaces allowed).
///
/// # Errors
///
/// Returns [`FetchError::UnknownPredefined`] if no road has that name.
pub fn predefined_road(name: &str) -> Result<RoadGeometry, FetchError> {
    let key = predefined_key(name);
    let (_, coords) = PREDEFINED_ROADS
        .iter()
        .find(|(k, _)| *k == key)
        .ok_or_else(|| FetchError::UnknownPredefined {
            name: name.to_string(),
        })?;

    Ok(RoadGeometry::from_lon_lat(coords)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(points: &[(f64, f64)]) -> LineString<f64> {
        LineString::from(points.to_vec())
    }

    struct StaticFetcher {
        segments: Vec<LineString<f64>>,
    }

    impl RoadFetcher for StaticFetcher {
        fn fetch_segments(
            &self,
            _area: &str,
            _street: &str,
        ) -> Result<Vec<LineString<f64>>, FetchError> {
            Ok(self.segments.clone())
        }
    }

    #[test]
    fn predefined_lookup_normalizes_name() {
        let road = predefined_road("Askew Road").unwrap();
        assert_eq!(road.num_vertices(), 16);
        assert_eq!(predefined_road("askew_road").unwrap(), road);
        assert_eq!(predefined_names(), vec!["askew_road"]);
    }

    #[test]
    fn unknown_predefined_road_names_the_road() {
        let err = predefined_road("Nowhere Lane").unwrap_err();
        assert_eq!(err.to_string(), "No coordinates found for road: Nowhere Lane");
    }

    #[test]
    fn merges_pieces_in_any_orientation() {
        let merged = merge_segments(vec![
            line(&[(2.0, 0.0), (3.0, 0.0)]),
            line(&[(0.0, 0.0), (1.0, 0.0)]),
            line(&[(2.0, 0.0), (1.0, 0.0)]),
        ])
        .unwrap();

        let xs: Vec<f64> = merged.0.iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn keeps_longest_disconnected_chain() {
        let merged = merge_segments(vec![
            line(&[(0.0, 0.0), (0.001, 0.0)]),
            line(&[(1.0, 0.0), (1.01, 0.0), (1.02, 0.0)]),
        ])
        .unwrap();
        assert_eq!(merged.0.len(), 3);
        assert!((merged.0[0].x - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn merge_ignores_degenerate_pieces() {
        assert!(merge_segments(vec![line(&[(0.0, 0.0)])]).is_none());
        assert!(merge_segments(vec![]).is_none());
    }

    #[test]
    fn fetcher_records_origin() {
        let fetcher = StaticFetcher {
            segments: vec![
                line(&[(-0.2328, 51.5180), (-0.2320, 51.5182)]),
                line(&[(-0.2320, 51.5182), (-0.2310, 51.5184)]),
            ],
        };

        let (road, origin) = resolve_fetched(&fetcher, "Hammersmith", "Askew Road").unwrap();
        assert_eq!(road.num_vertices(), 3);
        assert_eq!(
            origin,
            RoadOrigin::Fetched {
                area: "Hammersmith".to_string(),
                street: "Askew Road".to_string(),
                segments: 2,
            }
        );
        assert_eq!(fetcher.fetch_road("Hammersmith", "Askew Road").unwrap(), road);
    }

    #[test]
    fn empty_fetch_is_not_found() {
        let fetcher = StaticFetcher { segments: vec![] };
        let err = fetcher.fetch_road("Hammersmith", "Askew Road").unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));
    }
}
